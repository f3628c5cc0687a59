use action_locator::{LocatorStrategy, Resolution};
use page_dom::{NodeId, Rect};
use serde_json::{json, Value};

use crate::errors::ActionError;
use crate::primitives::DefaultActionPrimitives;

/// Element resolved for a primitive, with its geometry at resolution time.
#[derive(Clone, Debug)]
pub struct ResolvedTarget {
    pub node: NodeId,
    pub rect: Rect,
    pub strategy: LocatorStrategy,
}

impl ResolvedTarget {
    pub fn center(&self) -> (f64, f64) {
        self.rect.center()
    }

    pub fn metadata(&self, hint: &str) -> Value {
        json!({
            "selector": hint,
            "strategy": self.strategy.name(),
        })
    }
}

impl DefaultActionPrimitives {
    /// Resolves `hint` and snapshots its bounding box.
    pub fn resolve_target(&self, hint: &str) -> Result<ResolvedTarget, ActionError> {
        let Resolution { node, strategy, .. } = self.resolver().resolve(hint)?;
        let rect = self
            .dom()
            .bounding_rect(node)
            .ok_or_else(|| ActionError::AnchorNotFound(format!("{hint} detached during lookup")))?;
        Ok(ResolvedTarget {
            node,
            rect,
            strategy,
        })
    }
}
