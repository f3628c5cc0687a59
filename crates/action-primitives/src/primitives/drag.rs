//! Drag primitive - pointer press, move and release between two elements

use crate::{
    errors::ActionError,
    primitives::{ensure_active, finish, DefaultActionPrimitives},
    types::{ActionReport, ExecCtx},
};
use chrono::Utc;
use page_dom::{DomEvent, EventKind};
use serde_json::json;
use std::time::Instant;
use tracing::info;

/// Execute drag primitive
///
/// Both ends are resolved before any event is dispatched, so a missing
/// target leaves the page untouched.
pub async fn execute_drag(
    primitives: &DefaultActionPrimitives,
    ctx: &ExecCtx,
    source: &str,
    target: &str,
) -> Result<ActionReport, ActionError> {
    let started_at = Utc::now();
    let start_instant = Instant::now();

    info!(action_id = %ctx.action_id, source, target, "Executing drag primitive");

    ensure_active(ctx)?;

    let from = primitives.resolve_target(source)?;
    let to = primitives.resolve_target(target)?;
    let (sx, sy) = from.center();
    let (tx, ty) = to.center();

    let dom = primitives.dom();
    dom.dispatch_event(from.node, DomEvent::new(EventKind::MouseDown).at(sx, sy))?;
    dom.dispatch_event(to.node, DomEvent::new(EventKind::MouseMove).at(tx, ty))?;
    dom.dispatch_event(to.node, DomEvent::new(EventKind::MouseUp).at(tx, ty))?;

    Ok(finish(started_at, start_instant).with_data(json!({
        "sourceSelector": source,
        "targetSelector": target,
        "from": [sx, sy],
        "to": [tx, ty],
    })))
}
