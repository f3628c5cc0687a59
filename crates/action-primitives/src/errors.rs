//! Error types for action primitives

use action_locator::LocatorError;
use page_dom::DomError;
use thiserror::Error;

use crate::types::FailureKind;

/// Error types for action primitive operations
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ActionError {
    /// Action is missing required fields or carries unusable values
    #[error("Invalid action: {0}")]
    InvalidAction(String),

    /// Element could not be resolved from the hint
    #[error("Element not found: {0}")]
    AnchorNotFound(String),

    /// Element exists but cannot take this action
    #[error("Unsupported element: {0}")]
    UnsupportedElement(String),

    /// Scroll target is invalid or unreachable
    #[error("Scroll target invalid: {0}")]
    ScrollTargetInvalid(String),

    /// Operation was cancelled or interrupted
    #[error("Operation interrupted: {0}")]
    Interrupted(String),

    /// Screen capture failed or is unavailable
    #[error("Capture failed: {0}")]
    Capture(String),

    /// Action cannot run in the page context
    #[error("Unsupported action: {0}")]
    Unsupported(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ActionError {
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            ActionError::InvalidAction(_) | ActionError::Unsupported(_) => FailureKind::Invalid,
            ActionError::AnchorNotFound(_) | ActionError::ScrollTargetInvalid(_) => {
                FailureKind::Resolution
            }
            ActionError::UnsupportedElement(_) => FailureKind::UnsupportedElement,
            ActionError::Interrupted(_) => FailureKind::Interrupted,
            ActionError::Capture(_) => FailureKind::Capture,
            ActionError::Internal(_) => FailureKind::Internal,
        }
    }

    /// Get error severity level (0=low, 1=medium, 2=high, 3=critical)
    pub fn severity(&self) -> u8 {
        match self {
            ActionError::Internal(_) => 3,
            ActionError::Capture(_) => 2,
            ActionError::AnchorNotFound(_)
            | ActionError::ScrollTargetInvalid(_)
            | ActionError::UnsupportedElement(_) => 1,
            _ => 0,
        }
    }
}

impl From<DomError> for ActionError {
    fn from(err: DomError) -> Self {
        match err {
            DomError::NodeNotFound(node) => {
                ActionError::AnchorNotFound(format!("{node} was removed from the document"))
            }
            DomError::NotTextControl(tag) => {
                ActionError::UnsupportedElement(format!("<{tag}> does not accept text"))
            }
            DomError::InvalidSelector { .. } => ActionError::AnchorNotFound(err.to_string()),
            DomError::Fixture(message) => ActionError::Internal(message),
        }
    }
}

impl From<LocatorError> for ActionError {
    fn from(err: LocatorError) -> Self {
        match err {
            LocatorError::ElementNotFound(hint) => ActionError::AnchorNotFound(hint),
            LocatorError::InvalidHint(reason) => ActionError::InvalidAction(reason),
            LocatorError::Detached(detail) => ActionError::AnchorNotFound(detail),
            LocatorError::StrategyFailed { .. } => ActionError::Internal(err.to_string()),
        }
    }
}
