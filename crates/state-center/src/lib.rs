//! Host-side durable state: the recent-action log, the stored chat
//! selectors, the last screenshot and the UI language.
//!
//! Every mutation is written through to the configured [`StateStore`]. The
//! in-memory state only changes once the store accepted the new snapshot.

pub mod errors;
pub mod store;

pub use errors::StateError;
pub use store::{HistoryEntry, JsonFileStore, MemoryStore, StateSnapshot, StateStore};

use std::collections::VecDeque;
use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use taxy_core_types::{Locale, SelectionType};
use tracing::{debug, info};

/// Entries kept in the action history.
pub const HISTORY_CAPACITY: usize = 50;

#[derive(Clone, Debug)]
struct BoundedRing<T> {
    capacity: usize,
    data: VecDeque<T>,
}

impl<T> BoundedRing<T> {
    fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            data: VecDeque::new(),
        }
    }

    /// Returns the evicted item, if any.
    fn push(&mut self, item: T) -> Option<T> {
        let evicted = if self.data.len() == self.capacity {
            self.data.pop_front()
        } else {
            None
        };
        self.data.push_back(item);
        evicted
    }

    fn clear(&mut self) {
        self.data.clear();
    }
}

impl<T: Clone> BoundedRing<T> {
    fn snapshot(&self) -> Vec<T> {
        self.data.iter().cloned().collect()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredSelectors {
    pub custom_input_selector: Option<String>,
    pub custom_output_selector: Option<String>,
}

impl StoredSelectors {
    pub fn get(&self, selection_type: SelectionType) -> Option<&str> {
        match selection_type {
            SelectionType::Input => self.custom_input_selector.as_deref(),
            SelectionType::Output => self.custom_output_selector.as_deref(),
        }
    }
}

#[derive(Clone, Debug)]
struct StateData {
    history: BoundedRing<HistoryEntry>,
    selectors: StoredSelectors,
    last_screenshot: Option<String>,
    language: Option<Locale>,
}

impl StateData {
    fn from_snapshot(snapshot: StateSnapshot) -> Self {
        let mut history = BoundedRing::new(HISTORY_CAPACITY);
        let skip = snapshot
            .action_history
            .len()
            .saturating_sub(HISTORY_CAPACITY);
        for entry in snapshot.action_history.into_iter().skip(skip) {
            history.push(entry);
        }
        Self {
            history,
            selectors: StoredSelectors {
                custom_input_selector: snapshot.custom_input_selector,
                custom_output_selector: snapshot.custom_output_selector,
            },
            last_screenshot: snapshot.last_screenshot,
            language: snapshot.language,
        }
    }

    fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            action_history: self.history.snapshot(),
            custom_input_selector: self.selectors.custom_input_selector.clone(),
            custom_output_selector: self.selectors.custom_output_selector.clone(),
            last_screenshot: self.last_screenshot.clone(),
            language: self.language,
        }
    }
}

pub struct StateCenter {
    data: Mutex<StateData>,
    /// Serializes writers; readers only take `data`.
    writer: Mutex<()>,
    store: Arc<dyn StateStore>,
}

impl StateCenter {
    /// Loads state from `store`, starting empty when it holds nothing.
    pub fn with_store(store: Arc<dyn StateStore>) -> Result<Self, StateError> {
        let snapshot = store.load()?.unwrap_or_default();
        debug!(
            history = snapshot.action_history.len(),
            "state loaded"
        );
        Ok(Self {
            data: Mutex::new(StateData::from_snapshot(snapshot)),
            writer: Mutex::new(()),
            store,
        })
    }

    /// Opens the JSON state file at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StateError> {
        let path = path.as_ref();
        info!(path = %path.display(), "opening state file");
        Self::with_store(Arc::new(JsonFileStore::new(path)))
    }

    pub fn in_memory() -> Self {
        Self {
            data: Mutex::new(StateData::from_snapshot(StateSnapshot::default())),
            writer: Mutex::new(()),
            store: Arc::new(MemoryStore::default()),
        }
    }

    /// Applies `apply` to a copy, saves it and only then publishes it. The
    /// store is written without holding the lock readers use.
    fn mutate<R>(&self, apply: impl FnOnce(&mut StateData) -> R) -> Result<R, StateError> {
        let _writer = self.writer.lock();
        let mut next = self.data.lock().clone();
        let out = apply(&mut next);
        self.store.save(&next.snapshot())?;
        *self.data.lock() = next;
        Ok(out)
    }

    /// Appends a history entry, evicting the oldest past the cap.
    pub fn append_history(&self, text: impl Into<String>) -> Result<HistoryEntry, StateError> {
        let entry = HistoryEntry::now(text);
        let evicted = self.mutate(|data| data.history.push(entry.clone()))?;
        if let Some(old) = evicted {
            debug!(evicted = %old.text, "history full, dropped oldest entry");
        }
        Ok(entry)
    }

    pub fn history(&self) -> Vec<HistoryEntry> {
        self.data.lock().history.snapshot()
    }

    /// Texts of the last `limit` entries, oldest first.
    pub fn recent_actions(&self, limit: usize) -> Vec<String> {
        let data = self.data.lock();
        let skip = data.history.data.len().saturating_sub(limit);
        data.history
            .data
            .iter()
            .skip(skip)
            .map(|entry| entry.text.clone())
            .collect()
    }

    pub fn clear_history(&self) -> Result<(), StateError> {
        self.mutate(|data| data.history.clear())
    }

    pub fn set_selector(
        &self,
        selection_type: SelectionType,
        selector: impl Into<String>,
    ) -> Result<(), StateError> {
        let selector = selector.into();
        info!(key = selection_type.storage_key(), %selector, "storing selector");
        self.mutate(|data| match selection_type {
            SelectionType::Input => data.selectors.custom_input_selector = Some(selector),
            SelectionType::Output => data.selectors.custom_output_selector = Some(selector),
        })
    }

    pub fn selector(&self, selection_type: SelectionType) -> Option<String> {
        self.data
            .lock()
            .selectors
            .get(selection_type)
            .map(str::to_string)
    }

    pub fn selectors(&self) -> StoredSelectors {
        self.data.lock().selectors.clone()
    }

    pub fn set_last_screenshot(&self, data_url: impl Into<String>) -> Result<(), StateError> {
        let data_url = data_url.into();
        self.mutate(|data| data.last_screenshot = Some(data_url))
    }

    pub fn last_screenshot(&self) -> Option<String> {
        self.data.lock().last_screenshot.clone()
    }

    pub fn set_language(&self, locale: Locale) -> Result<(), StateError> {
        self.mutate(|data| data.language = Some(locale))
    }

    pub fn language(&self) -> Option<Locale> {
        self.data.lock().language
    }

    pub fn snapshot(&self) -> StateSnapshot {
        self.data.lock().snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn history_is_capped_fifo() {
        let state = StateCenter::in_memory();
        for i in 0..HISTORY_CAPACITY {
            state.append_history(format!("wait({i})")).unwrap();
        }
        assert_eq!(state.history().len(), HISTORY_CAPACITY);

        state.append_history("click(\"#last\")").unwrap();
        let history = state.history();
        assert_eq!(history.len(), HISTORY_CAPACITY);
        assert_eq!(history.first().unwrap().text, "wait(1)");
        assert_eq!(history.last().unwrap().text, "click(\"#last\")");
        assert_eq!(
            state.recent_actions(2),
            vec!["wait(49)".to_string(), "click(\"#last\")".to_string()]
        );
    }

    #[test]
    fn mutations_are_written_through() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("state.json");

        let state = StateCenter::open(&path).unwrap();
        state.append_history("navigate(\"https://example.com\")").unwrap();
        state.set_selector(SelectionType::Input, "#prompt").unwrap();
        state.set_language(Locale::Pl).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["customInputSelector"], json!("#prompt"));
        assert_eq!(raw["language"], json!("pl"));
        assert_eq!(
            raw["actionHistory"][0]["text"],
            json!("navigate(\"https://example.com\")")
        );

        let reopened = StateCenter::open(&path).unwrap();
        assert_eq!(reopened.selector(SelectionType::Input).as_deref(), Some("#prompt"));
        assert_eq!(reopened.selector(SelectionType::Output), None);
        assert_eq!(reopened.history().len(), 1);
        assert_eq!(reopened.language(), Some(Locale::Pl));
    }

    #[test]
    fn plain_string_history_is_accepted() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(
            &path,
            r##"{"actionHistory": ["click(\"#a\")", {"text": "wait(5)", "timestamp": 1700000000000}],
                "customOutputSelector": ".answer"}"##,
        )
        .unwrap();

        let state = StateCenter::open(&path).unwrap();
        let texts: Vec<_> = state.history().into_iter().map(|e| e.text).collect();
        assert_eq!(texts, vec!["click(\"#a\")", "wait(5)"]);
        assert_eq!(
            state.selectors().get(SelectionType::Output),
            Some(".answer")
        );
    }

    #[test]
    fn oversized_history_is_trimmed_on_load() {
        let store = Arc::new(MemoryStore::default());
        let snapshot = StateSnapshot {
            action_history: (0..60).map(|i| HistoryEntry::now(format!("a{i}"))).collect(),
            ..StateSnapshot::default()
        };
        store.save(&snapshot).unwrap();

        let state = StateCenter::with_store(store).unwrap();
        let history = state.history();
        assert_eq!(history.len(), HISTORY_CAPACITY);
        assert_eq!(history[0].text, "a10");
    }

    struct ReadOnlyStore;

    impl StateStore for ReadOnlyStore {
        fn load(&self) -> Result<Option<StateSnapshot>, StateError> {
            Ok(None)
        }

        fn save(&self, _snapshot: &StateSnapshot) -> Result<(), StateError> {
            Err(StateError::io(
                Path::new("state.json"),
                std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
            ))
        }
    }

    #[test]
    fn failed_save_leaves_memory_untouched() {
        let state = StateCenter::with_store(Arc::new(ReadOnlyStore)).unwrap();

        assert!(matches!(
            state.append_history("click(\"#a\")"),
            Err(StateError::Io { .. })
        ));
        assert!(state.set_selector(SelectionType::Input, "#prompt").is_err());
        assert!(state.history().is_empty());
        assert_eq!(state.selector(SelectionType::Input), None);
        assert_eq!(state.snapshot(), StateSnapshot::default());
    }

    #[test]
    fn corrupt_file_is_a_format_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            StateCenter::open(&path),
            Err(StateError::Format { .. })
        ));
    }
}
