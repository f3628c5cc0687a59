mod click;
mod drag;
mod navigate;
mod screenshot;
mod scroll;
mod test_selector;
mod type_text;
mod wait;

pub use navigate::normalize_url;

use std::sync::Arc;
use std::time::{Duration, Instant};

use action_locator::{DefaultElementResolver, ElementResolver};
use async_trait::async_trait;
use chrono::Utc;
use page_dom::Dom;
use taxy_core_types::Locale;
use tracing::{info, warn};

use crate::{
    errors::ActionError,
    ports::{CapturePort, NoCapture, NoopNotifier, Notification, Notifier},
    types::{Action, ActionReport, ActionResult, ExecCtx, ScrollTarget},
};

const DEFAULT_HIGHLIGHT: Duration = Duration::from_secs(2);

/// Action primitives trait
///
/// One method per concrete action. Each primitive checks the execution
/// context, resolves its elements, acts on the document and reports.
#[async_trait]
pub trait ActionPrimitives: Send + Sync {
    async fn click(&self, ctx: &ExecCtx, selector: &str) -> Result<ActionReport, ActionError>;

    async fn type_text(
        &self,
        ctx: &ExecCtx,
        selector: &str,
        text: &str,
    ) -> Result<ActionReport, ActionError>;

    async fn navigate(&self, ctx: &ExecCtx, url: &str) -> Result<ActionReport, ActionError>;

    async fn scroll(&self, ctx: &ExecCtx, target: &ScrollTarget)
        -> Result<ActionReport, ActionError>;

    async fn drag(
        &self,
        ctx: &ExecCtx,
        source: &str,
        target: &str,
    ) -> Result<ActionReport, ActionError>;

    async fn wait(&self, ctx: &ExecCtx, duration: Duration) -> Result<ActionReport, ActionError>;

    async fn screenshot(
        &self,
        ctx: &ExecCtx,
        selector: Option<&str>,
    ) -> Result<ActionReport, ActionError>;

    async fn test_selector(&self, ctx: &ExecCtx, selector: &str)
        -> Result<ActionReport, ActionError>;
}

/// Runs a whole [`Action`] and reports a wire-level result.
#[async_trait]
pub trait ActionExecutor: Send + Sync {
    async fn execute(&self, ctx: &ExecCtx, action: &Action) -> ActionResult;
}

/// Default implementation of action primitives
pub struct DefaultActionPrimitives {
    /// Document of the page context
    dom: Arc<dyn Dom>,

    /// Resolver used to turn hints into elements
    resolver: Arc<dyn ElementResolver>,

    /// Host-side capture for screenshots
    capture: Arc<dyn CapturePort>,

    /// Started/completed/failed notifications
    notifier: Arc<dyn Notifier>,

    locale: Locale,

    highlight_duration: Duration,
}

impl DefaultActionPrimitives {
    pub fn new(dom: Arc<dyn Dom>) -> Self {
        Self {
            resolver: Arc::new(DefaultElementResolver::new(dom.clone())),
            dom,
            capture: Arc::new(NoCapture),
            notifier: Arc::new(NoopNotifier),
            locale: Locale::default(),
            highlight_duration: DEFAULT_HIGHLIGHT,
        }
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn ElementResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_capture(mut self, capture: Arc<dyn CapturePort>) -> Self {
        self.capture = capture;
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }

    pub fn with_highlight_duration(mut self, duration: Duration) -> Self {
        self.highlight_duration = duration;
        self
    }

    pub fn dom(&self) -> &Arc<dyn Dom> {
        &self.dom
    }

    pub fn resolver(&self) -> &Arc<dyn ElementResolver> {
        &self.resolver
    }

    pub fn capture_port(&self) -> &Arc<dyn CapturePort> {
        &self.capture
    }

    pub fn highlight_duration(&self) -> Duration {
        self.highlight_duration
    }

    async fn run(&self, ctx: &ExecCtx, action: &Action) -> Result<ActionReport, ActionError> {
        action.validate()?;
        match action {
            Action::Click { selector } => self.click(ctx, selector).await,
            Action::Type { selector, text } => self.type_text(ctx, selector, text).await,
            Action::Navigate { url } => self.navigate(ctx, url).await,
            Action::Scroll { target } => self.scroll(ctx, target).await,
            Action::Drag {
                source_selector,
                target_selector,
            } => self.drag(ctx, source_selector, target_selector).await,
            Action::Wait { duration_ms } => {
                self.wait(ctx, Duration::from_millis(*duration_ms)).await
            }
            Action::Screenshot { selector } => self.screenshot(ctx, selector.as_deref()).await,
            Action::TestSelector { selector } => self.test_selector(ctx, selector).await,
            Action::Automate { .. } => Err(ActionError::Unsupported(
                "automation is planned by the background service".to_string(),
            )),
        }
    }
}

/// Shared pre-flight check for every primitive.
pub(crate) fn ensure_active(ctx: &ExecCtx) -> Result<(), ActionError> {
    if ctx.is_cancelled() {
        return Err(ActionError::Interrupted("Context cancelled".to_string()));
    }
    Ok(())
}

pub(crate) fn finish(started_at: chrono::DateTime<Utc>, start: Instant) -> ActionReport {
    ActionReport::success(started_at, start.elapsed().as_millis() as u64)
}

#[async_trait]
impl ActionExecutor for DefaultActionPrimitives {
    async fn execute(&self, ctx: &ExecCtx, action: &Action) -> ActionResult {
        let kind = action.kind();
        self.notifier.notify(Notification::started(kind, self.locale));

        match self.run(ctx, action).await {
            Ok(report) => {
                info!(
                    action_id = %ctx.action_id,
                    kind = %kind,
                    latency_ms = report.latency_ms,
                    "Action completed"
                );
                self.notifier
                    .notify(Notification::completed(kind, self.locale));
                ActionResult::from(report)
            }
            Err(err) => {
                warn!(
                    action_id = %ctx.action_id,
                    kind = %kind,
                    error = %err,
                    "Action failed"
                );
                self.notifier
                    .notify(Notification::failed(kind, self.locale, err.to_string()));
                ActionResult::from(&err)
            }
        }
    }
}

#[async_trait]
impl ActionPrimitives for DefaultActionPrimitives {
    async fn click(&self, ctx: &ExecCtx, selector: &str) -> Result<ActionReport, ActionError> {
        click::execute_click(self, ctx, selector).await
    }

    async fn type_text(
        &self,
        ctx: &ExecCtx,
        selector: &str,
        text: &str,
    ) -> Result<ActionReport, ActionError> {
        type_text::execute_type_text(self, ctx, selector, text).await
    }

    async fn navigate(&self, ctx: &ExecCtx, url: &str) -> Result<ActionReport, ActionError> {
        navigate::execute_navigate(self, ctx, url).await
    }

    async fn scroll(
        &self,
        ctx: &ExecCtx,
        target: &ScrollTarget,
    ) -> Result<ActionReport, ActionError> {
        scroll::execute_scroll(self, ctx, target).await
    }

    async fn drag(
        &self,
        ctx: &ExecCtx,
        source: &str,
        target: &str,
    ) -> Result<ActionReport, ActionError> {
        drag::execute_drag(self, ctx, source, target).await
    }

    async fn wait(&self, ctx: &ExecCtx, duration: Duration) -> Result<ActionReport, ActionError> {
        wait::execute_wait(self, ctx, duration).await
    }

    async fn screenshot(
        &self,
        ctx: &ExecCtx,
        selector: Option<&str>,
    ) -> Result<ActionReport, ActionError> {
        screenshot::execute_screenshot(self, ctx, selector).await
    }

    async fn test_selector(
        &self,
        ctx: &ExecCtx,
        selector: &str,
    ) -> Result<ActionReport, ActionError> {
        test_selector::execute_test_selector(self, ctx, selector).await
    }
}
