//! Type primitive - replace the value of a text control

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

/// Execute type primitive
///
/// Focuses the control, clears it, sets the new value and fires `input`
/// then `change`. Elements that do not accept text are rejected before
/// anything is touched.
pub async fn execute_type_text(
    primitives: &DefaultActionPrimitives,
    ctx: &ExecCtx,
    selector: &str,
    text: &str,
) -> Result<ActionReport, ActionError> {
    let started_at = Utc::now();
    let start_instant = Instant::now();

    info!(
        action_id = %ctx.action_id,
        selector,
        text_len = text.chars().count(),
        "Executing type primitive"
    );

    ensure_active(ctx)?;

    let target = primitives.resolve_target(selector)?;
    let dom = primitives.dom();
    if !dom.is_text_control(target.node) {
        let tag = dom
            .element(target.node)
            .map(|info| info.tag)
            .unwrap_or_else(|| "unknown".to_string());
        return Err(ActionError::UnsupportedElement(format!(
            "<{tag}> matched by '{selector}' does not accept text"
        )));
    }

    dom.focus(target.node)?;
    dom.set_value(target.node, "")?;
    dom.set_value(target.node, text)?;
    dom.dispatch_event(target.node, DomEvent::new(EventKind::Input).non_cancelable())?;
    dom.dispatch_event(target.node, DomEvent::new(EventKind::Change).non_cancelable())?;

    let mut data = target.metadata(selector);
    data["length"] = json!(text.chars().count());
    Ok(finish(started_at, start_instant).with_data(data))
}
