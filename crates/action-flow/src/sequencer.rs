//! Strictly ordered execution of an action list

use std::sync::Arc;

use action_primitives::{Action, ActionResult, FailureKind};
use async_trait::async_trait;
use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::types::{FailurePolicy, SequenceReport, SequenceStatus, SequencerConfig, StepOutcome};

/// Runs one step to completion, e.g. by dispatching it to the page.
#[async_trait]
pub trait StepRunner: Send + Sync {
    async fn run_step(&self, action: &Action) -> ActionResult;
}

/// Runs actions one at a time. A step starts only after the previous one
/// has resolved and the settle delay has passed.
pub struct Sequencer {
    runner: Arc<dyn StepRunner>,
    config: SequencerConfig,
}

impl Sequencer {
    pub fn new(runner: Arc<dyn StepRunner>) -> Self {
        Self::with_config(runner, SequencerConfig::default())
    }

    pub fn with_config(runner: Arc<dyn StepRunner>, config: SequencerConfig) -> Self {
        Self { runner, config }
    }

    pub fn config(&self) -> &SequencerConfig {
        &self.config
    }

    pub async fn run(&self, actions: &[Action], cancel: &CancellationToken) -> SequenceReport {
        let total = actions.len();
        info!(total, policy = ?self.config.failure_policy, "running action sequence");
        let mut steps = Vec::with_capacity(total);
        let mut status = SequenceStatus::Completed;

        for (index, action) in actions.iter().enumerate() {
            if cancel.is_cancelled() {
                status = SequenceStatus::Cancelled { index };
                break;
            }

            debug!(step = index + 1, total, %action, "sequence step");
            let started_at = Utc::now();
            let result = match self.check(action) {
                Err(rejected) => rejected,
                Ok(()) => {
                    tokio::select! {
                        result = self.runner.run_step(action) => result,
                        _ = cancel.cancelled() => {
                            status = SequenceStatus::Cancelled { index };
                            ActionResult::failed(FailureKind::Interrupted, "sequence cancelled")
                        }
                    }
                }
            };
            let failed = !result.success;
            if failed {
                warn!(step = index + 1, %action, error = ?result.error, "sequence step failed");
            }
            steps.push(StepOutcome {
                index,
                action: action.clone(),
                result,
                started_at,
                finished_at: Utc::now(),
            });

            if matches!(status, SequenceStatus::Cancelled { .. }) {
                break;
            }
            if failed && self.config.failure_policy == FailurePolicy::Abort {
                status = SequenceStatus::Aborted { index };
                break;
            }

            if index + 1 < total {
                let settle = self.config.settle_after(action);
                if !settle.is_zero() {
                    tokio::select! {
                        _ = tokio::time::sleep(settle) => {}
                        _ = cancel.cancelled() => {
                            status = SequenceStatus::Cancelled { index: index + 1 };
                            break;
                        }
                    }
                }
            }
        }

        let report = SequenceReport {
            total,
            steps,
            status,
        };
        info!(
            succeeded = report.succeeded(),
            failed = report.failed(),
            status = ?report.status,
            "action sequence finished"
        );
        report
    }

    fn check(&self, action: &Action) -> Result<(), ActionResult> {
        if let Action::Automate { .. } = action {
            return Err(ActionResult::failed(
                FailureKind::Invalid,
                "automation steps cannot be nested",
            ));
        }
        action.validate().map_err(|err| ActionResult::from(&err))
    }
}
