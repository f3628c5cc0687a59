//! Click primitive - synthesized pointer sequence at the element centre

use crate::{
    errors::ActionError,
    primitives::{ensure_active, finish, DefaultActionPrimitives},
    types::{ActionReport, ExecCtx},
};
use chrono::Utc;
use page_dom::{DomEvent, EventKind};
use std::time::Instant;
use tracing::{debug, info};

/// Execute click primitive
///
/// Steps:
/// 1. Check context
/// 2. Resolve element via locator (with text fallback)
/// 3. Dispatch mousedown, mouseup, click at the element centre
/// 4. Generate action report
pub async fn execute_click(
    primitives: &DefaultActionPrimitives,
    ctx: &ExecCtx,
    selector: &str,
) -> Result<ActionReport, ActionError> {
    let started_at = Utc::now();
    let start_instant = Instant::now();

    info!(
        action_id = %ctx.action_id,
        selector,
        "Executing click primitive"
    );

    // 1. Check context
    ensure_active(ctx)?;

    // 2. Resolve element
    let target = primitives.resolve_target(selector)?;
    let (x, y) = target.center();

    // 3. Pointer sequence
    for kind in [EventKind::MouseDown, EventKind::MouseUp, EventKind::Click] {
        debug!(node = %target.node, event = %kind, x, y, "dispatching");
        primitives
            .dom()
            .dispatch_event(target.node, DomEvent::new(kind).at(x, y))?;
    }

    Ok(finish(started_at, start_instant).with_data(target.metadata(selector)))
}
