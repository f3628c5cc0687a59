//! Multi-step action runs
//!
//! Runs an ordered list of actions one at a time through a [`StepRunner`],
//! with a settle delay between steps and an explicit [`FailurePolicy`], and
//! defines the planner port that turns an automation instruction into such
//! a list.

pub mod errors;
pub mod planner;
pub mod sequencer;
pub mod types;

pub use errors::FlowError;
pub use planner::{actions_from_plan, parse_planned_actions, ActionPlanner, PlanRequest, PlannedAction};
pub use sequencer::{Sequencer, StepRunner};
pub use types::{FailurePolicy, SequenceReport, SequenceStatus, SequencerConfig, StepOutcome};
