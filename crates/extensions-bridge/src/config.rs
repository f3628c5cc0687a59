//! Bridge tuning.

use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Per-request timeout used when the caller gives none.
    pub default_timeout_ms: u64,
    /// Queued envelopes per endpoint before senders wait.
    pub inbox_capacity: usize,
    pub event_capacity: usize,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            default_timeout_ms: 10_000,
            inbox_capacity: 64,
            event_capacity: 256,
        }
    }
}

impl BridgeConfig {
    pub fn default_timeout(&self) -> Duration {
        Duration::from_millis(self.default_timeout_ms)
    }
}
