//! Screenshot primitive - resolve the region, delegate the capture

use crate::{
    errors::ActionError,
    primitives::{ensure_active, finish, DefaultActionPrimitives},
    types::{ActionReport, ExecCtx},
};
use chrono::Utc;
use serde_json::json;
use std::time::Instant;
use tracing::info;

/// Execute screenshot primitive
///
/// The page cannot capture itself; the capture port asks the host. Without
/// a selector the whole visible page is captured.
pub async fn execute_screenshot(
    primitives: &DefaultActionPrimitives,
    ctx: &ExecCtx,
    selector: Option<&str>,
) -> Result<ActionReport, ActionError> {
    let started_at = Utc::now();
    let start_instant = Instant::now();

    info!(action_id = %ctx.action_id, selector = ?selector, "Executing screenshot primitive");

    ensure_active(ctx)?;

    let region = match selector {
        Some(selector) => Some(primitives.resolve_target(selector)?.rect),
        None => None,
    };
    let data_url = primitives.capture_port().capture(region).await?;

    Ok(finish(started_at, start_instant).with_data(json!({
        "selector": selector,
        "region": region,
        "dataUrl": data_url,
    })))
}
