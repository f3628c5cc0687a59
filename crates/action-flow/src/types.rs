//! Core types for sequenced runs

use std::time::Duration;

use action_primitives::{Action, ActionResult, FailureKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// What the sequencer does after a failed step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Record the failure and run the remaining steps
    #[default]
    Continue,
    /// Stop at the first failure
    Abort,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequencerConfig {
    /// Pause after each step before the next one starts
    pub settle_ms: u64,
    /// Pause after a navigation
    pub navigate_settle_ms: u64,
    pub failure_policy: FailurePolicy,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            settle_ms: 500,
            navigate_settle_ms: 2_000,
            failure_policy: FailurePolicy::Continue,
        }
    }
}

impl SequencerConfig {
    /// Delay between `action` and the step after it. A wait already paused.
    pub fn settle_after(&self, action: &Action) -> Duration {
        match action {
            Action::Wait { .. } => Duration::ZERO,
            Action::Navigate { .. } => Duration::from_millis(self.navigate_settle_ms),
            _ => Duration::from_millis(self.settle_ms),
        }
    }
}

/// Result of one step.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepOutcome {
    pub index: usize,
    pub action: Action,
    pub result: ActionResult,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub started_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub finished_at: DateTime<Utc>,
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum SequenceStatus {
    /// Every step was attempted
    Completed,
    /// Stopped after the failed step at `index`
    Aborted { index: usize },
    /// Cancelled before or during step `index`
    Cancelled { index: usize },
}

/// Outcome of a whole run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SequenceReport {
    pub total: usize,
    pub steps: Vec<StepOutcome>,
    pub status: SequenceStatus,
}

impl SequenceReport {
    pub fn succeeded(&self) -> usize {
        self.steps.iter().filter(|step| step.result.success).count()
    }

    pub fn failed(&self) -> usize {
        self.steps.len() - self.succeeded()
    }

    /// All steps attempted and all succeeded.
    pub fn is_success(&self) -> bool {
        self.status == SequenceStatus::Completed && self.failed() == 0
    }

    pub fn message(&self) -> String {
        match self.status {
            SequenceStatus::Completed => format!(
                "Executed {} of {} steps successfully",
                self.succeeded(),
                self.total
            ),
            SequenceStatus::Aborted { index } => format!(
                "Stopped at step {} of {} after a failure",
                index + 1,
                self.total
            ),
            SequenceStatus::Cancelled { index } => {
                format!("Cancelled at step {} of {}", index + 1, self.total)
            }
        }
    }

    /// Wire-level summary: `data.message` plus per-step results.
    pub fn to_result(&self) -> ActionResult {
        let steps: Vec<_> = self
            .steps
            .iter()
            .map(|step| {
                json!({
                    "action": step.action.to_string(),
                    "success": step.result.success,
                    "error": step.result.error,
                })
            })
            .collect();
        let data = json!({ "message": self.message(), "steps": steps });
        if self.is_success() {
            ActionResult::ok(Some(data))
        } else {
            let error = self
                .steps
                .iter()
                .find_map(|step| step.result.error.clone())
                .unwrap_or_else(|| self.message());
            ActionResult {
                success: false,
                error: Some(error),
                error_kind: self
                    .steps
                    .iter()
                    .find_map(|step| step.result.error_kind)
                    .or(match self.status {
                        SequenceStatus::Cancelled { .. } => Some(FailureKind::Interrupted),
                        _ => None,
                    }),
                data: Some(data),
            }
        }
    }
}
