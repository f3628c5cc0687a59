//! Element resolution strategies
//!
//! Two strategies in fallback order:
//! 1. CSS - the hint as a literal selector
//! 2. Text - substring match over clickable elements

use crate::{errors::LocatorError, types::*};
use page_dom::{Dom, DomError};
use tracing::debug;

/// Elements the text fallback searches, in document order.
pub const TEXT_SEARCH_SELECTOR: &str = r#"a, button, input, [role="button"]"#;

/// Strategy trait for element resolution
pub trait Strategy: Send + Sync {
    /// Attempt to resolve element using this strategy
    fn resolve(&self, dom: &dyn Dom, hint: &str) -> Result<Vec<Candidate>, LocatorError>;

    /// Get strategy type
    fn strategy_type(&self) -> LocatorStrategy;

    /// Get strategy name
    fn name(&self) -> &'static str {
        self.strategy_type().name()
    }
}

/// CSS selector resolution strategy
#[derive(Debug, Default)]
pub struct CssStrategy;

impl Strategy for CssStrategy {
    fn resolve(&self, dom: &dyn Dom, hint: &str) -> Result<Vec<Candidate>, LocatorError> {
        match dom.query_selector_all(hint) {
            Ok(nodes) => Ok(nodes
                .into_iter()
                .map(|node| Candidate {
                    node,
                    strategy: LocatorStrategy::Css,
                })
                .collect()),
            // Free text such as "Log in!" is not a selector; let the next strategy try.
            Err(DomError::InvalidSelector { reason, .. }) => {
                debug!(hint, reason = %reason, "hint is not a valid selector");
                Ok(Vec::new())
            }
            Err(err) => Err(LocatorError::StrategyFailed {
                strategy: self.name().to_string(),
                reason: err.to_string(),
            }),
        }
    }

    fn strategy_type(&self) -> LocatorStrategy {
        LocatorStrategy::Css
    }
}

/// Text content strategy
#[derive(Debug, Default)]
pub struct TextStrategy;

impl Strategy for TextStrategy {
    fn resolve(&self, dom: &dyn Dom, hint: &str) -> Result<Vec<Candidate>, LocatorError> {
        let needle = hint.trim();
        if needle.is_empty() {
            return Ok(Vec::new());
        }
        let nodes = dom
            .query_selector_all(TEXT_SEARCH_SELECTOR)
            .map_err(|err| LocatorError::StrategyFailed {
                strategy: self.name().to_string(),
                reason: err.to_string(),
            })?;
        Ok(nodes
            .into_iter()
            .filter(|node| {
                dom.element(*node)
                    .map_or(false, |info| info.text.trim().contains(needle))
            })
            .map(|node| Candidate {
                node,
                strategy: LocatorStrategy::Text,
            })
            .collect())
    }

    fn strategy_type(&self) -> LocatorStrategy {
        LocatorStrategy::Text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use page_dom::{ElementSpec, MemoryDom};

    #[test]
    fn invalid_selector_yields_no_css_candidates() {
        let dom = MemoryDom::new();
        assert!(CssStrategy.resolve(&dom, "Log in!").unwrap().is_empty());
    }

    #[test]
    fn text_strategy_only_searches_clickables() {
        let dom = MemoryDom::new();
        dom.append(dom.body(), ElementSpec::new("p").text("Send it"));
        let link = dom.append(dom.body(), ElementSpec::new("a").text("  Send it now "));
        let role = dom.append(
            dom.body(),
            ElementSpec::new("div").attr("role", "button").text("Send it later"),
        );
        let found: Vec<_> = TextStrategy
            .resolve(&dom, "Send it")
            .unwrap()
            .into_iter()
            .map(|c| c.node)
            .collect();
        assert_eq!(found, vec![link, role]);
    }
}
