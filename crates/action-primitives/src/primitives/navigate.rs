//! Navigate primitive - set the document location

use crate::{
    errors::ActionError,
    primitives::{ensure_active, finish, DefaultActionPrimitives},
    types::{ActionReport, ExecCtx},
};
use chrono::Utc;
use serde_json::json;
use std::time::Instant;
use tracing::info;
use url::Url;

/// Prefixes `https://` unless `raw` already is an http(s) URL.
pub fn normalize_url(raw: &str) -> String {
    let trimmed = raw.trim();
    match Url::parse(trimmed) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => trimmed.to_string(),
        _ => format!("https://{trimmed}"),
    }
}

/// Execute navigate primitive
///
/// Reported as soon as the location is set; page load is not awaited here.
pub async fn execute_navigate(
    primitives: &DefaultActionPrimitives,
    ctx: &ExecCtx,
    url: &str,
) -> Result<ActionReport, ActionError> {
    let started_at = Utc::now();
    let start_instant = Instant::now();

    ensure_active(ctx)?;

    let target = normalize_url(url);
    info!(action_id = %ctx.action_id, url = %target, "Executing navigate primitive");
    primitives.dom().set_location(&target);

    Ok(finish(started_at, start_instant).with_data(json!({ "url": target })))
}

#[cfg(test)]
mod tests {
    use super::normalize_url;

    #[test]
    fn adds_scheme_only_when_missing() {
        assert_eq!(normalize_url("example.com"), "https://example.com");
        assert_eq!(normalize_url("http://example.com/a"), "http://example.com/a");
        assert_eq!(normalize_url("HTTPS://Example.com"), "HTTPS://Example.com");
        assert_eq!(normalize_url("localhost:8080"), "https://localhost:8080");
        assert_eq!(normalize_url("httpbin.org/get"), "https://httpbin.org/get");
    }
}
