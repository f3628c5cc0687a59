//! Pipeline configuration
//!
//! Loaded from YAML by the CLI; every field has a default so partial files
//! are fine.

use std::path::PathBuf;
use std::time::Duration;

use action_flow::SequencerConfig;
use action_primitives::Action;
use command_parser::{ParserConfig, UnknownActionPolicy};
use serde::{Deserialize, Serialize};
use taxy_core_types::Locale;

/// Extra time a chat command waits beyond the dispatch it triggers.
const CHAT_GRACE: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub locale: Locale,
    /// Base timeout of one cross-context dispatch
    pub dispatch_timeout_ms: u64,
    /// Timeout of a whole automation run
    pub automation_timeout_ms: u64,
    /// How long test-selector keeps its matches highlighted
    pub highlight_ms: u64,
    pub unknown_action: UnknownActionPolicy,
    /// JSON state file; in-memory state when unset
    pub state_path: Option<PathBuf>,
    /// Lines of page outline handed to the planner
    pub outline_limit: usize,
    /// History entries handed to the planner
    pub planner_history: usize,
    pub sequencer: SequencerConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            locale: Locale::En,
            dispatch_timeout_ms: 10_000,
            automation_timeout_ms: 120_000,
            highlight_ms: 2_000,
            unknown_action: UnknownActionPolicy::Automate,
            state_path: None,
            outline_limit: 200,
            planner_history: 10,
            sequencer: SequencerConfig::default(),
        }
    }
}

impl Config {
    pub fn parser(&self) -> ParserConfig {
        ParserConfig {
            locale: self.locale,
            unknown_action: self.unknown_action,
        }
    }

    /// Timeout of one dispatch, extended by the action's own duration.
    pub fn dispatch_timeout(&self, action: &Action) -> Duration {
        Duration::from_millis(self.dispatch_timeout_ms) + action.intrinsic_duration()
    }

    /// Timeout the page side applies to a chat command sent to the
    /// background. It always outlasts the background's own timeout so the
    /// background's result is the one reported.
    pub fn chat_timeout(&self, action: &Action) -> Duration {
        match action {
            // Outline fetch, then the run itself.
            Action::Automate { .. } => {
                Duration::from_millis(self.dispatch_timeout_ms)
                    + self.automation_timeout()
                    + CHAT_GRACE
            }
            _ => self.dispatch_timeout(action) + CHAT_GRACE,
        }
    }

    pub fn automation_timeout(&self) -> Duration {
        Duration::from_millis(self.automation_timeout_ms)
    }

    pub fn highlight(&self) -> Duration {
        Duration::from_millis(self.highlight_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use action_flow::FailurePolicy;
    use pretty_assertions::assert_eq;

    #[test]
    fn partial_yaml_keeps_defaults() {
        let config: Config = serde_yaml::from_str(
            "locale: pl\ndispatch_timeout_ms: 500\nsequencer:\n  failure_policy: abort\n",
        )
        .unwrap();
        assert_eq!(config.locale, Locale::Pl);
        assert_eq!(config.dispatch_timeout_ms, 500);
        assert_eq!(config.sequencer.failure_policy, FailurePolicy::Abort);
        assert_eq!(config.sequencer.settle_ms, 500);
        assert_eq!(config.unknown_action, UnknownActionPolicy::Automate);
    }

    #[test]
    fn waits_extend_the_dispatch_timeout() {
        let config = Config::default();
        assert_eq!(
            config.dispatch_timeout(&Action::Wait { duration_ms: 3_000 }),
            Duration::from_millis(13_000)
        );
        assert_eq!(
            config.chat_timeout(&Action::Click {
                selector: "#a".into()
            }),
            Duration::from_millis(12_000)
        );
        assert_eq!(
            config.chat_timeout(&Action::Automate {
                instruction: "x".into()
            }),
            Duration::from_millis(132_000)
        );
    }

    #[test]
    fn chat_side_outlasts_the_automation_run() {
        let config = Config {
            dispatch_timeout_ms: 1_000,
            automation_timeout_ms: 5_000,
            ..Config::default()
        };
        let automate = Action::Automate {
            instruction: "log in".into(),
        };
        assert!(config.chat_timeout(&automate) > config.automation_timeout());
        assert_eq!(config.chat_timeout(&automate), Duration::from_millis(8_000));
    }
}
