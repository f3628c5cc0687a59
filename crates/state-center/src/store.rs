//! Durable storage of the state snapshot.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::to_writer_pretty;
use taxy_core_types::Locale;
use tracing::debug;

use crate::errors::StateError;

/// One executed action, e.g. `click("#btn")`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub text: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn now(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Everything persisted, in the on-disk key layout.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateSnapshot {
    #[serde(default, deserialize_with = "history_entries")]
    pub action_history: Vec<HistoryEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_input_selector: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_output_selector: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_screenshot: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<Locale>,
}

/// History written by older builds is a plain list of strings.
fn history_entries<'de, D>(deserializer: D) -> Result<Vec<HistoryEntry>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Stored {
        Entry(HistoryEntry),
        Text(String),
    }

    let stored = Vec::<Stored>::deserialize(deserializer)?;
    Ok(stored
        .into_iter()
        .map(|item| match item {
            Stored::Entry(entry) => entry,
            Stored::Text(text) => HistoryEntry {
                text,
                timestamp: DateTime::<Utc>::default(),
            },
        })
        .collect())
}

pub trait StateStore: Send + Sync {
    fn load(&self) -> Result<Option<StateSnapshot>, StateError>;
    fn save(&self, snapshot: &StateSnapshot) -> Result<(), StateError>;
}

/// Pretty-printed JSON file, replaced atomically on every save.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StateStore for JsonFileStore {
    fn load(&self) -> Result<Option<StateSnapshot>, StateError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(StateError::io(&self.path, err)),
        };
        if raw.trim().is_empty() {
            return Ok(None);
        }
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|err| StateError::format(&self.path, err))
    }

    fn save(&self, snapshot: &StateSnapshot) -> Result<(), StateError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|err| StateError::io(parent, err))?;
        }
        let staging = self.path.with_extension("json.tmp");
        let file = File::create(&staging).map_err(|err| StateError::io(&staging, err))?;
        let mut writer = BufWriter::new(file);
        to_writer_pretty(&mut writer, snapshot).map_err(|err| StateError::format(&staging, err))?;
        writer.flush().map_err(|err| StateError::io(&staging, err))?;
        drop(writer);
        fs::rename(&staging, &self.path).map_err(|err| StateError::io(&self.path, err))?;
        debug!(path = %self.path.display(), "state saved");
        Ok(())
    }
}

/// Keeps the last saved snapshot in memory only.
#[derive(Debug, Default)]
pub struct MemoryStore {
    saved: Mutex<Option<StateSnapshot>>,
}

impl MemoryStore {
    pub fn saved(&self) -> Option<StateSnapshot> {
        self.saved.lock().clone()
    }
}

impl StateStore for MemoryStore {
    fn load(&self) -> Result<Option<StateSnapshot>, StateError> {
        Ok(self.saved.lock().clone())
    }

    fn save(&self, snapshot: &StateSnapshot) -> Result<(), StateError> {
        *self.saved.lock() = Some(snapshot.clone());
        Ok(())
    }
}
