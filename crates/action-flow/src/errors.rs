//! Flow error types

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FlowError {
    /// No planner is wired into the pipeline
    #[error("no action planner configured")]
    PlannerUnavailable,

    /// The planner could not produce a plan
    #[error("planning failed: {0}")]
    PlanningFailed(String),

    /// The planner produced nothing to run
    #[error("the plan for '{0}' contains no actions")]
    EmptyPlan(String),

    /// A planned step could not be turned into an action
    #[error("planned step {index} is invalid: {reason}")]
    InvalidStep { index: usize, reason: String },
}
