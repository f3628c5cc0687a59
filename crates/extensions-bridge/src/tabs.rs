//! Open tabs and the active tab.

use std::collections::BTreeMap;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use taxy_core_types::TabId;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabInfo {
    pub id: TabId,
    pub url: String,
    #[serde(default)]
    pub title: String,
}

impl TabInfo {
    pub fn new(id: TabId, url: impl Into<String>) -> Self {
        Self {
            id,
            url: url.into(),
            title: String::new(),
        }
    }
}

#[derive(Debug, Default)]
pub struct TabRegistry {
    tabs: RwLock<BTreeMap<TabId, TabInfo>>,
    active: RwLock<Option<TabId>>,
}

impl TabRegistry {
    /// Adds a tab. The first tab opened becomes active.
    pub fn insert(&self, info: TabInfo) -> bool {
        let id = info.id;
        self.tabs.write().insert(id, info);
        let mut active = self.active.write();
        if active.is_none() {
            *active = Some(id);
            return true;
        }
        false
    }

    /// Removes a tab; clears the active tab if it was this one.
    pub fn remove(&self, id: TabId) -> Option<TabInfo> {
        let removed = self.tabs.write().remove(&id);
        let mut active = self.active.write();
        if *active == Some(id) {
            *active = None;
        }
        removed
    }

    pub fn activate(&self, id: TabId) -> bool {
        if !self.tabs.read().contains_key(&id) {
            return false;
        }
        *self.active.write() = Some(id);
        true
    }

    pub fn active(&self) -> Option<TabId> {
        *self.active.read()
    }

    pub fn get(&self, id: TabId) -> Option<TabInfo> {
        self.tabs.read().get(&id).cloned()
    }

    pub fn update_url(&self, id: TabId, url: impl Into<String>) {
        if let Some(tab) = self.tabs.write().get_mut(&id) {
            tab.url = url.into();
        }
    }

    pub fn list(&self) -> Vec<TabInfo> {
        self.tabs.read().values().cloned().collect()
    }
}
