//! Element resolver with fallback chain orchestration

use crate::{errors::LocatorError, strategies::*, types::*};
use page_dom::{Dom, NodeId};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Element resolver trait
pub trait ElementResolver: Send + Sync {
    /// Resolve a hint with the fallback chain. First match of the first
    /// strategy that matches anything wins.
    fn resolve(&self, hint: &str) -> Result<Resolution, LocatorError>;

    /// Try to resolve with specific strategy
    fn resolve_with_strategy(
        &self,
        hint: &str,
        strategy: LocatorStrategy,
    ) -> Result<Vec<Candidate>, LocatorError>;

    /// `find(hint)`: the resolved element, if any.
    fn find(&self, hint: &str) -> Option<NodeId> {
        self.resolve(hint).ok().map(|resolution| resolution.node)
    }
}

/// Default element resolver implementation
pub struct DefaultElementResolver {
    dom: Arc<dyn Dom>,
    css_strategy: Arc<CssStrategy>,
    text_strategy: Arc<TextStrategy>,
}

impl DefaultElementResolver {
    /// Create a new resolver with all strategies
    pub fn new(dom: Arc<dyn Dom>) -> Self {
        Self {
            dom,
            css_strategy: Arc::new(CssStrategy),
            text_strategy: Arc::new(TextStrategy),
        }
    }

    pub fn dom(&self) -> &Arc<dyn Dom> {
        &self.dom
    }

    /// Get strategy by type
    fn get_strategy(&self, strategy_type: LocatorStrategy) -> Arc<dyn Strategy> {
        match strategy_type {
            LocatorStrategy::Css => self.css_strategy.clone(),
            LocatorStrategy::Text => self.text_strategy.clone(),
        }
    }
}

impl ElementResolver for DefaultElementResolver {
    fn resolve(&self, hint: &str) -> Result<Resolution, LocatorError> {
        if hint.trim().is_empty() {
            return Err(LocatorError::InvalidHint("empty hint".to_string()));
        }
        debug!(hint, "Resolving element");

        for strategy_type in LocatorStrategy::fallback_chain() {
            let strategy = self.get_strategy(strategy_type);
            match strategy.resolve(self.dom.as_ref(), hint) {
                Ok(candidates) => {
                    if let Some(first) = candidates.first() {
                        info!(
                            hint,
                            strategy = strategy_type.name(),
                            node = %first.node,
                            matches = candidates.len(),
                            "Resolved element"
                        );
                        return Ok(Resolution {
                            node: first.node,
                            strategy: strategy_type,
                            hint: hint.to_string(),
                        });
                    }
                    debug!("Strategy {} returned no candidates", strategy_type.name());
                }
                Err(e) => {
                    warn!("Strategy {} failed: {}", strategy_type.name(), e);
                }
            }
        }

        Err(LocatorError::ElementNotFound(hint.to_string()))
    }

    fn resolve_with_strategy(
        &self,
        hint: &str,
        strategy: LocatorStrategy,
    ) -> Result<Vec<Candidate>, LocatorError> {
        self.get_strategy(strategy).resolve(self.dom.as_ref(), hint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use page_dom::{ElementSpec, MemoryDom};

    fn page() -> (Arc<MemoryDom>, NodeId, NodeId) {
        let dom = Arc::new(MemoryDom::new());
        let first = dom.append(dom.body(), ElementSpec::new("button").text("Submit"));
        let second = dom.append(
            dom.body(),
            ElementSpec::new("button").id("submit").text("Submit button"),
        );
        (dom, first, second)
    }

    #[test]
    fn literal_selector_wins_over_text() {
        let (dom, _, second) = page();
        let resolver = DefaultElementResolver::new(dom);
        let resolution = resolver.resolve("#submit").unwrap();
        assert_eq!(resolution.node, second);
        assert_eq!(resolution.strategy, LocatorStrategy::Css);
    }

    #[test]
    fn text_fallback_returns_first_in_document_order() {
        let (dom, first, _) = page();
        let resolver = DefaultElementResolver::new(dom);
        let resolution = resolver.resolve("Submit").unwrap();
        assert_eq!(resolution.node, first);
        assert_eq!(resolution.strategy, LocatorStrategy::Text);
    }

    #[test]
    fn free_text_that_is_not_a_selector_still_resolves() {
        let (dom, _, second) = page();
        dom.append(dom.body(), ElementSpec::new("a").text("Log in!"));
        let resolver = DefaultElementResolver::new(dom.clone());
        assert!(resolver.find("Log in!").is_some());
        assert_eq!(resolver.find("Submit button"), Some(second));
    }

    #[test]
    fn missing_and_empty_hints() {
        let (dom, ..) = page();
        let resolver = DefaultElementResolver::new(dom);
        assert_eq!(
            resolver.resolve("#nope"),
            Err(LocatorError::ElementNotFound("#nope".to_string()))
        );
        assert!(matches!(
            resolver.resolve("   "),
            Err(LocatorError::InvalidHint(_))
        ));
    }
}
