use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use taxy_state_center::StateCenter;

use crate::config::Config;

pub struct CliContext {
    config: Arc<Config>,
    config_path: PathBuf,
}

impl CliContext {
    pub fn new(config: Config, config_path: PathBuf) -> Self {
        Self {
            config: Arc::new(config),
            config_path,
        }
    }

    pub fn config(&self) -> &Config {
        self.config.as_ref()
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// State file from the command line, else from the configuration.
    pub fn state_path(&self, explicit: Option<&PathBuf>) -> Option<PathBuf> {
        explicit.cloned().or_else(|| self.config.state_path.clone())
    }

    pub fn open_state(&self, explicit: Option<&PathBuf>) -> Result<StateCenter> {
        let path = self
            .state_path(explicit)
            .context("No state file configured (use --state or state_path)")?;
        StateCenter::open(&path)
            .with_context(|| format!("Failed to open state file {}", path.display()))
    }
}
