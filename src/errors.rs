//! Pipeline errors and their wire-level form

use action_flow::FlowError;
use action_primitives::{ActionError, ActionResult, FailureKind};
use command_parser::ParseError;
use extensions_bridge::BridgeError;
use taxy_state_center::StateError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Action(#[from] ActionError),

    #[error(transparent)]
    Bridge(#[from] BridgeError),

    #[error(transparent)]
    State(#[from] StateError),

    #[error(transparent)]
    Flow(#[from] FlowError),

    #[error("Capture failed: {0}")]
    Capture(String),

    #[error("unexpected reply: {0}")]
    Protocol(String),
}

impl PipelineError {
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            PipelineError::Parse(_) => FailureKind::Parse,
            PipelineError::Action(err) => err.failure_kind(),
            PipelineError::Bridge(BridgeError::Timeout { .. }) => FailureKind::Timeout,
            PipelineError::Bridge(_) => FailureKind::Dispatch,
            PipelineError::State(_) => FailureKind::Internal,
            PipelineError::Flow(FlowError::InvalidStep { .. }) => FailureKind::Invalid,
            PipelineError::Flow(_) => FailureKind::Internal,
            PipelineError::Capture(_) => FailureKind::Capture,
            PipelineError::Protocol(_) => FailureKind::Dispatch,
        }
    }
}

impl From<&PipelineError> for ActionResult {
    fn from(error: &PipelineError) -> Self {
        ActionResult::failed(error.failure_kind(), error.to_string())
    }
}

impl From<PipelineError> for ActionResult {
    fn from(error: PipelineError) -> Self {
        ActionResult::from(&error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bridge_timeouts_keep_their_own_kind() {
        let timeout = ActionResult::from(PipelineError::from(BridgeError::Timeout { ms: 10 }));
        assert_eq!(timeout.error_kind, Some(FailureKind::Timeout));
        assert_eq!(timeout.error.as_deref(), Some("no reply within 10 ms"));

        let closed = ActionResult::from(PipelineError::from(BridgeError::ChannelClosed));
        assert_eq!(closed.error_kind, Some(FailureKind::Dispatch));
    }

    #[test]
    fn missing_planner_is_reported_verbatim() {
        let result = ActionResult::from(PipelineError::from(FlowError::PlannerUnavailable));
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("no action planner configured"));
    }
}
