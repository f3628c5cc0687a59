//! Error types for locator system

use thiserror::Error;

/// Locator error enumeration
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LocatorError {
    /// Element not found with any strategy
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    /// Hint is empty or whitespace
    #[error("Invalid hint: {0}")]
    InvalidHint(String),

    /// Strategy execution failed
    #[error("Strategy '{strategy}' failed: {reason}")]
    StrategyFailed { strategy: String, reason: String },

    /// Element went away between lookup and use
    #[error("Element detached: {0}")]
    Detached(String),
}

impl LocatorError {
    /// Get error severity (0=low, 1=medium, 2=high, 3=critical)
    pub fn severity(&self) -> u8 {
        match self {
            LocatorError::Detached(_) => 2,
            LocatorError::ElementNotFound(_) | LocatorError::StrategyFailed { .. } => 1,
            LocatorError::InvalidHint(_) => 0,
        }
    }
}
