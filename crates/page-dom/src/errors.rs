use thiserror::Error;

use crate::types::NodeId;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomError {
    #[error("invalid selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("{0} is not attached to the document")]
    NodeNotFound(NodeId),

    #[error("element <{0}> does not accept text")]
    NotTextControl(String),

    #[error("page fixture error: {0}")]
    Fixture(String),
}

impl DomError {
    pub fn invalid_selector(selector: &str, reason: impl Into<String>) -> Self {
        DomError::InvalidSelector {
            selector: selector.to_string(),
            reason: reason.into(),
        }
    }
}
