//! Scroll primitive - viewport and element scrolling

use crate::{
    errors::ActionError,
    primitives::{ensure_active, finish, DefaultActionPrimitives},
    types::{ActionReport, ExecCtx, ScrollTarget},
};
use chrono::Utc;
use page_dom::ScrollBehavior;
use serde_json::json;
use std::time::Instant;
use tracing::info;

/// Execute scroll primitive
///
/// All variants scroll smoothly. Only the element variant can fail.
pub async fn execute_scroll(
    primitives: &DefaultActionPrimitives,
    ctx: &ExecCtx,
    target: &ScrollTarget,
) -> Result<ActionReport, ActionError> {
    let started_at = Utc::now();
    let start_instant = Instant::now();

    info!(action_id = %ctx.action_id, target = ?target, "Executing scroll primitive");

    ensure_active(ctx)?;

    let dom = primitives.dom();
    let behavior = ScrollBehavior::Smooth;
    match target {
        ScrollTarget::Top => dom.scroll_to(0.0, 0.0, behavior),
        ScrollTarget::Bottom => {
            let (_, height) = dom.document_size();
            dom.scroll_to(0.0, height, behavior);
        }
        ScrollTarget::Position { x, y } => dom.scroll_to(*x, *y, behavior),
        ScrollTarget::Relative { direction, amount } => {
            let (dx, dy) = direction.offset(*amount);
            dom.scroll_by(dx, dy, behavior);
        }
        ScrollTarget::Element { selector } => {
            let resolved = primitives.resolve_target(selector).map_err(|err| match err {
                ActionError::AnchorNotFound(detail) => ActionError::ScrollTargetInvalid(detail),
                other => other,
            })?;
            dom.scroll_into_view(resolved.node, behavior)?;
        }
    }

    let (x, y) = dom.scroll_position();
    Ok(finish(started_at, start_instant).with_data(json!({ "x": x, "y": y })))
}
