use action_primitives::Action;
use serde::{Deserialize, Serialize};
use taxy_core_types::Locale;

/// Parsed chat command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Command {
    Action(Action),
    Help,
}

/// What to do with an action name the grammar does not know.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownActionPolicy {
    /// Treat the whole command text as an automation instruction.
    #[default]
    Automate,
    /// Report a parse error.
    Reject,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParserConfig {
    #[serde(default)]
    pub locale: Locale,
    #[serde(default)]
    pub unknown_action: UnknownActionPolicy,
}
