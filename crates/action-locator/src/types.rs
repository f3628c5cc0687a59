//! Core types for locator system

use page_dom::NodeId;
use serde::{Deserialize, Serialize};

/// Locator strategy enumeration
///
/// - CSS: the hint is used verbatim as a selector
/// - Text: the hint is matched against the text of clickable elements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LocatorStrategy {
    /// CSS selector strategy
    Css,

    /// Text content strategy
    Text,
}

impl LocatorStrategy {
    /// Get strategy name as string
    pub fn name(&self) -> &'static str {
        match self {
            LocatorStrategy::Css => "css",
            LocatorStrategy::Text => "text",
        }
    }

    /// Get all strategies in fallback order
    pub fn fallback_chain() -> Vec<LocatorStrategy> {
        vec![LocatorStrategy::Css, LocatorStrategy::Text]
    }
}

/// Element matched by one strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub node: NodeId,
    pub strategy: LocatorStrategy,
}

/// Final outcome of resolving a hint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    pub node: NodeId,
    pub strategy: LocatorStrategy,
    pub hint: String,
}
