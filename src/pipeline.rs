//! Shared pipeline state, built once and handed to every component.

use std::sync::Arc;

use action_primitives::{Notifier, TracingNotifier};
use extensions_bridge::{BridgeConfig, ExtensionsBridge};
use taxy_state_center::StateCenter;
use tracing::info;

use crate::config::Config;
use crate::errors::PipelineError;

#[derive(Clone)]
pub struct PipelineContext {
    config: Arc<Config>,
    bridge: Arc<ExtensionsBridge>,
    state: Arc<StateCenter>,
    notifier: Arc<dyn Notifier>,
}

impl PipelineContext {
    pub fn new(config: Config, state: StateCenter) -> Self {
        let bridge = ExtensionsBridge::new(BridgeConfig {
            default_timeout_ms: config.dispatch_timeout_ms,
            ..BridgeConfig::default()
        });
        let notifier: Arc<dyn Notifier> = Arc::new(TracingNotifier::new(config.locale));
        Self {
            config: Arc::new(config),
            bridge,
            state: Arc::new(state),
            notifier,
        }
    }

    /// Opens the state file named by the configuration, or keeps state in
    /// memory when none is configured.
    pub fn open(config: Config) -> Result<Self, PipelineError> {
        let state = match &config.state_path {
            Some(path) => {
                info!(path = %path.display(), "opening state file");
                StateCenter::open(path)?
            }
            None => StateCenter::in_memory(),
        };
        Ok(Self::new(config, state))
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn bridge(&self) -> &Arc<ExtensionsBridge> {
        &self.bridge
    }

    pub fn state(&self) -> &Arc<StateCenter> {
        &self.state
    }

    pub fn notifier(&self) -> &Arc<dyn Notifier> {
        &self.notifier
    }
}
