//! Planner port: turns an automation instruction into an action list.

use action_primitives::{Action, ScrollDirection, ScrollTarget};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use taxy_core_types::Locale;

use crate::errors::FlowError;

/// Everything a planner gets to see.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanRequest {
    pub instruction: String,
    /// Simplified outline of the current page.
    pub dom: String,
    /// Recent history, oldest first.
    pub previous_actions: Vec<String>,
    #[serde(default)]
    pub locale: Locale,
}

#[async_trait]
pub trait ActionPlanner: Send + Sync {
    async fn plan(&self, request: &PlanRequest) -> Result<Vec<Action>, FlowError>;
}

/// Action as emitted by a completion model:
/// `{"type": "setValue", "selector": "#q", "value": "rust"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PlannedAction {
    Click {
        selector: String,
    },
    SetValue {
        selector: String,
        value: String,
    },
    Navigate {
        url: String,
    },
    Wait {
        duration: u64,
    },
    Scroll {
        direction: String,
        #[serde(default)]
        amount: Option<f64>,
    },
}

impl TryFrom<PlannedAction> for Action {
    type Error = String;

    fn try_from(planned: PlannedAction) -> Result<Self, Self::Error> {
        let action = match planned {
            PlannedAction::Click { selector } => Action::Click { selector },
            PlannedAction::SetValue { selector, value } => Action::Type {
                selector,
                text: value,
            },
            PlannedAction::Navigate { url } => Action::Navigate { url },
            PlannedAction::Wait { duration } => Action::Wait {
                duration_ms: duration,
            },
            PlannedAction::Scroll { direction, amount } => {
                let direction = ScrollDirection::parse(&direction)
                    .ok_or_else(|| format!("unknown scroll direction '{direction}'"))?;
                Action::Scroll {
                    target: ScrollTarget::Relative {
                        direction,
                        amount: amount.unwrap_or(300.0),
                    },
                }
            }
        };
        action.validate().map_err(|err| err.to_string())?;
        Ok(action)
    }
}

/// Converts a model-produced list, failing on the first bad entry.
pub fn actions_from_plan(planned: Vec<PlannedAction>) -> Result<Vec<Action>, FlowError> {
    planned
        .into_iter()
        .enumerate()
        .map(|(index, step)| {
            Action::try_from(step).map_err(|reason| FlowError::InvalidStep { index, reason })
        })
        .collect()
}

/// Parses the JSON array a completion model answered with.
pub fn parse_planned_actions(raw: &str) -> Result<Vec<Action>, FlowError> {
    let planned: Vec<PlannedAction> = serde_json::from_str(raw)
        .map_err(|err| FlowError::PlanningFailed(format!("unreadable action list: {err}")))?;
    actions_from_plan(planned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn model_shape_maps_onto_actions() {
        let actions = parse_planned_actions(
            r##"[
                {"type": "navigate", "url": "example.com"},
                {"type": "setValue", "selector": "#q", "value": "rust"},
                {"type": "click", "selector": "#go"},
                {"type": "wait", "duration": 250},
                {"type": "scroll", "direction": "down"}
            ]"##,
        )
        .unwrap();
        assert_eq!(
            actions,
            vec![
                Action::Navigate {
                    url: "example.com".into()
                },
                Action::Type {
                    selector: "#q".into(),
                    text: "rust".into()
                },
                Action::Click {
                    selector: "#go".into()
                },
                Action::Wait { duration_ms: 250 },
                Action::Scroll {
                    target: ScrollTarget::Relative {
                        direction: ScrollDirection::Down,
                        amount: 300.0
                    }
                },
            ]
        );
    }

    #[test]
    fn bad_entries_are_reported_with_their_index() {
        let err = parse_planned_actions(
            r#"[{"type": "click", "selector": "a"}, {"type": "scroll", "direction": "sideways"}]"#,
        )
        .unwrap_err();
        assert!(matches!(err, FlowError::InvalidStep { index: 1, .. }));

        assert!(matches!(
            parse_planned_actions(r#"[{"type": "click", "selector": " "}]"#),
            Err(FlowError::InvalidStep { index: 0, .. })
        ));
        assert!(matches!(
            parse_planned_actions("not json"),
            Err(FlowError::PlanningFailed(_))
        ));
    }
}
