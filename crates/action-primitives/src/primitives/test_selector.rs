//! Test-selector primitive - count and highlight matches

use crate::{
    errors::ActionError,
    primitives::{ensure_active, finish, DefaultActionPrimitives},
    types::{ActionReport, ExecCtx},
};
use action_locator::LocatorStrategy;
use chrono::Utc;
use page_dom::NodeId;
use serde_json::json;
use std::time::Instant;
use tracing::info;

/// Execute test-selector primitive
///
/// Counts literal selector matches (no text fallback) and highlights them.
/// Zero matches is a failure.
pub async fn execute_test_selector(
    primitives: &DefaultActionPrimitives,
    ctx: &ExecCtx,
    selector: &str,
) -> Result<ActionReport, ActionError> {
    let started_at = Utc::now();
    let start_instant = Instant::now();

    ensure_active(ctx)?;

    let nodes: Vec<NodeId> = primitives
        .resolver()
        .resolve_with_strategy(selector, LocatorStrategy::Css)?
        .into_iter()
        .map(|candidate| candidate.node)
        .collect();

    info!(action_id = %ctx.action_id, selector, count = nodes.len(), "Tested selector");

    if nodes.is_empty() {
        return Err(ActionError::AnchorNotFound(format!(
            "no elements match '{selector}'"
        )));
    }

    primitives
        .dom()
        .highlight(&nodes, primitives.highlight_duration());

    Ok(finish(started_at, start_instant).with_data(json!({
        "selector": selector,
        "count": nodes.len(),
    })))
}
