//! Page context of one tab: executes actions against its document and runs
//! area selection.

use std::sync::Arc;
use std::time::Duration;

use action_primitives::{
    ActionError, ActionExecutor, ActionResult, CapturePort, DefaultActionPrimitives, ExecCtx,
};
use area_selection::{SelectedArea, SelectionManager, SelectionSink};
use async_trait::async_trait;
use extensions_bridge::{Bridge, CommandMessage, Endpoint, Envelope, Inbox, Target};
use page_dom::{page_outline, Dom, Rect};
use serde_json::json;
use taxy_core_types::TabId;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::errors::PipelineError;
use crate::pipeline::PipelineContext;

/// Page-side capture: asks the background to capture this tab.
pub struct BridgeCapture {
    tab: TabId,
    bridge: Arc<dyn Bridge>,
    timeout: Duration,
}

impl BridgeCapture {
    pub fn new(tab: TabId, bridge: Arc<dyn Bridge>, timeout: Duration) -> Self {
        Self {
            tab,
            bridge,
            timeout,
        }
    }
}

#[async_trait]
impl CapturePort for BridgeCapture {
    async fn capture(&self, region: Option<Rect>) -> Result<Option<String>, ActionError> {
        let reply = self
            .bridge
            .invoke(
                Endpoint::Tab(self.tab),
                Target::Background,
                CommandMessage::TakeScreenshot { region },
                self.timeout,
            )
            .await
            .map_err(|err| ActionError::Capture(err.to_string()))?;
        if !reply.success {
            return Err(ActionError::Capture(
                reply.error.unwrap_or_else(|| "capture refused".to_string()),
            ));
        }
        Ok(reply
            .data
            .as_ref()
            .and_then(|data| data["dataUrl"].as_str())
            .map(str::to_string))
    }
}

/// Hands committed selections to a forwarding task; the selection manager
/// calls sinks synchronously.
struct ForwardingSink {
    tx: mpsc::UnboundedSender<SelectedArea>,
}

impl SelectionSink for ForwardingSink {
    fn area_selected(&self, area: &SelectedArea) {
        if self.tx.send(area.clone()).is_err() {
            warn!(selector = %area.selector, "selection forwarder is gone");
        }
    }
}

pub struct ContentService {
    tab: TabId,
    dom: Arc<dyn Dom>,
    executor: DefaultActionPrimitives,
    selection: Arc<SelectionManager>,
    outline_limit: usize,
    cancel: CancellationToken,
    forwarder: JoinHandle<()>,
}

impl ContentService {
    /// Must be called inside a runtime: spawns the task that forwards
    /// selections to the background.
    pub fn new(ctx: &PipelineContext, tab: TabId, dom: Arc<dyn Dom>) -> Self {
        let bridge: Arc<dyn Bridge> = ctx.bridge().clone();
        let config = ctx.config();

        let capture = BridgeCapture::new(
            tab,
            bridge.clone(),
            Duration::from_millis(config.dispatch_timeout_ms),
        );
        let executor = DefaultActionPrimitives::new(dom.clone())
            .with_capture(Arc::new(capture))
            .with_notifier(ctx.notifier().clone())
            .with_locale(config.locale)
            .with_highlight_duration(config.highlight());

        let (tx, rx) = mpsc::unbounded_channel();
        let selection = Arc::new(
            SelectionManager::new(dom.clone(), Arc::new(ForwardingSink { tx }))
                .with_locale(config.locale),
        );
        let forwarder = tokio::spawn(forward_selections(tab, bridge, rx));

        Self {
            tab,
            dom,
            executor,
            selection,
            outline_limit: config.outline_limit,
            cancel: CancellationToken::new(),
            forwarder,
        }
    }

    pub fn tab(&self) -> TabId {
        self.tab
    }

    pub fn dom(&self) -> &Arc<dyn Dom> {
        &self.dom
    }

    pub fn selection(&self) -> &Arc<SelectionManager> {
        &self.selection
    }

    /// Cancels in-flight actions such as waits.
    pub fn cancel_all(&self) {
        self.cancel.cancel();
    }

    pub fn serve(self: Arc<Self>, mut inbox: Inbox) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!(tab = %self.tab, "page context started");
            while let Some(envelope) = inbox.recv().await {
                let service = self.clone();
                tokio::spawn(async move { service.handle(envelope).await });
            }
            info!(tab = %self.tab, "page context stopped");
        })
    }

    pub async fn handle(&self, mut envelope: Envelope) {
        let kind = envelope.message.kind();
        debug!(tab = %self.tab, id = %envelope.id, %kind, "page received");
        let result = match &envelope.message {
            CommandMessage::ExecuteAction(action) => {
                let ctx = ExecCtx::new(self.cancel.child_token());
                Some(self.executor.execute(&ctx, action).await)
            }
            CommandMessage::StartAreaSelection { selection_type } => {
                let token = self.selection.start(*selection_type);
                debug!(tab = %self.tab, %token, "area selection started");
                None
            }
            CommandMessage::GetPageDom => {
                let dom = page_outline(self.dom.as_ref(), self.outline_limit);
                Some(ActionResult::ok(Some(json!({ "dom": dom }))))
            }
            other => Some(ActionResult::from(PipelineError::Protocol(format!(
                "{} is not handled by page contexts",
                other.kind()
            )))),
        };
        if let Some(result) = result {
            envelope.respond(result);
        }
    }
}

impl Drop for ContentService {
    fn drop(&mut self) {
        self.cancel.cancel();
        self.forwarder.abort();
    }
}

async fn forward_selections(
    tab: TabId,
    bridge: Arc<dyn Bridge>,
    mut rx: mpsc::UnboundedReceiver<SelectedArea>,
) {
    while let Some(area) = rx.recv().await {
        let message = CommandMessage::AreaSelected {
            selection_type: area.selection_type,
            selector: area.selector,
            name: area.name,
        };
        if let Err(err) = bridge
            .post(Endpoint::Tab(tab), Target::Background, message)
            .await
        {
            warn!(%tab, error = %err, "could not report selected area");
        }
    }
}
