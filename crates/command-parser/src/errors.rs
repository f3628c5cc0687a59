use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("missing action after the command prefix")]
    MissingAction,

    #[error("unknown action '{0}'")]
    UnknownAction(String),

    #[error("{action}: {reason}")]
    InvalidArguments { action: String, reason: String },

    #[error("malformed JSON arguments: {0}")]
    MalformedJson(String),
}

impl ParseError {
    pub(crate) fn invalid(action: &str, reason: impl Into<String>) -> Self {
        ParseError::InvalidArguments {
            action: action.to_string(),
            reason: reason.into(),
        }
    }
}
