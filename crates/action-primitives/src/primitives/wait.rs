//! Wait primitive - fixed delay

use crate::{
    errors::ActionError,
    primitives::{ensure_active, finish, DefaultActionPrimitives},
    types::{ActionReport, ExecCtx},
};
use chrono::Utc;
use serde_json::json;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, info};

/// Execute wait primitive
///
/// Sleeps for `duration`; cancelling the context ends the wait early with
/// an interrupted error.
pub async fn execute_wait(
    _primitives: &DefaultActionPrimitives,
    ctx: &ExecCtx,
    duration: Duration,
) -> Result<ActionReport, ActionError> {
    let started_at = Utc::now();
    let start_instant = Instant::now();

    info!(
        action_id = %ctx.action_id,
        duration_ms = duration.as_millis() as u64,
        "Executing wait primitive"
    );

    ensure_active(ctx)?;

    tokio::select! {
        _ = sleep(duration) => {
            debug!(action_id = %ctx.action_id, "Wait elapsed");
        }
        _ = ctx.cancel_token.cancelled() => {
            return Err(ActionError::Interrupted("Wait cancelled".to_string()));
        }
    }

    Ok(finish(started_at, start_instant)
        .with_data(json!({ "durationMs": duration.as_millis() as u64 })))
}
