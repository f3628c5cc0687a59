//! Background context: owns the router, stored state and host capture.

use std::sync::Arc;
use std::time::Duration;

use action_flow::{ActionPlanner, FlowError, PlanRequest, Sequencer};
use action_primitives::{Action, ActionResult, Notification};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as Base64, Engine as _};
use extensions_bridge::{Bridge, BridgeError, CommandMessage, Endpoint, Envelope, Inbox, Target};
use page_dom::Rect;
use serde_json::json;
use taxy_core_types::{SelectionType, TabId};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::errors::PipelineError;
use crate::pipeline::PipelineContext;
use crate::router::CommandRouter;

/// Host-level capture of the visible area of a tab.
#[async_trait]
pub trait TabCapture: Send + Sync {
    /// PNG bytes of the visible tab, cropped to `region` when given.
    async fn capture_visible(&self, tab: TabId, region: Option<Rect>)
        -> Result<Vec<u8>, PipelineError>;
}

/// Capture for hosts without a screen.
#[derive(Debug, Default)]
pub struct NoTabCapture;

#[async_trait]
impl TabCapture for NoTabCapture {
    async fn capture_visible(
        &self,
        _tab: TabId,
        _region: Option<Rect>,
    ) -> Result<Vec<u8>, PipelineError> {
        Err(PipelineError::Capture(
            "tab capture is not available on this host".to_string(),
        ))
    }
}

/// Returns the same image for every capture.
#[derive(Debug, Clone)]
pub struct StaticCapture {
    png: Vec<u8>,
}

impl StaticCapture {
    pub fn new(png: Vec<u8>) -> Self {
        Self { png }
    }
}

#[async_trait]
impl TabCapture for StaticCapture {
    async fn capture_visible(
        &self,
        tab: TabId,
        region: Option<Rect>,
    ) -> Result<Vec<u8>, PipelineError> {
        debug!(%tab, ?region, bytes = self.png.len(), "static capture");
        Ok(self.png.clone())
    }
}

pub fn png_data_url(png: &[u8]) -> String {
    format!("data:image/png;base64,{}", Base64.encode(png))
}

pub struct BackgroundService {
    ctx: PipelineContext,
    router: Arc<CommandRouter>,
    capture: Arc<dyn TabCapture>,
    planner: Option<Arc<dyn ActionPlanner>>,
    shutdown: CancellationToken,
}

impl BackgroundService {
    pub fn new(ctx: PipelineContext) -> Self {
        let router = Arc::new(CommandRouter::from_context(&ctx));
        Self {
            ctx,
            router,
            capture: Arc::new(NoTabCapture),
            planner: None,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn with_capture(mut self, capture: Arc<dyn TabCapture>) -> Self {
        self.capture = capture;
        self
    }

    pub fn with_planner(mut self, planner: Arc<dyn ActionPlanner>) -> Self {
        self.planner = Some(planner);
        self
    }

    pub fn router(&self) -> &Arc<CommandRouter> {
        &self.router
    }

    /// Cancels running automations; the inbox loop ends when the endpoint
    /// is disconnected.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    /// Connects the background endpoint and serves it.
    pub fn start(self) -> (Arc<Self>, JoinHandle<()>) {
        let inbox = self.ctx.bridge().connect(Endpoint::Background);
        let service = Arc::new(self);
        let handle = service.clone().serve(inbox);
        (service, handle)
    }

    /// Each envelope gets its own task so a handler waiting on a page never
    /// blocks a request that page sends back.
    pub fn serve(self: Arc<Self>, mut inbox: Inbox) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!("background context started");
            while let Some(envelope) = inbox.recv().await {
                let service = self.clone();
                tokio::spawn(async move { service.handle(envelope).await });
            }
            info!("background context stopped");
        })
    }

    pub async fn handle(&self, mut envelope: Envelope) {
        let kind = envelope.message.kind();
        debug!(id = %envelope.id, %kind, origin = %envelope.origin, "background received");
        let origin = envelope.origin;

        let result = match envelope.message.clone() {
            CommandMessage::ChatCommand { action, source } => {
                info!(%action, %source, "chat command");
                Some(self.run_command(action).await)
            }
            CommandMessage::ExecuteAction(action) => Some(self.run_command(action).await),
            CommandMessage::ExecuteAutomation { instruction } => {
                Some(self.automate(&instruction).await)
            }
            CommandMessage::StartAreaSelection { selection_type } => {
                self.forward_selection(origin, selection_type).await;
                None
            }
            CommandMessage::AreaSelected {
                selection_type,
                selector,
                name,
            } => {
                self.store_selection(selection_type, selector, &name);
                None
            }
            CommandMessage::TakeScreenshot { region } => {
                Some(self.screenshot(origin, region).await)
            }
            CommandMessage::GetPageDom => Some(ActionResult::from(PipelineError::Protocol(
                format!("{kind} is served by page contexts"),
            ))),
        };

        if let Some(result) = result {
            envelope.respond(result);
        }
    }

    async fn run_command(&self, action: Action) -> ActionResult {
        match action {
            Action::Automate { instruction } => self.automate(&instruction).await,
            action => self.router.dispatch(action).await,
        }
    }

    async fn forward_selection(&self, origin: Endpoint, selection_type: SelectionType) {
        let target = match origin {
            Endpoint::Tab(tab) => Target::Tab(tab),
            Endpoint::Background => Target::ActiveTab,
        };
        let message = CommandMessage::StartAreaSelection { selection_type };
        if let Err(err) = self
            .ctx
            .bridge()
            .post(Endpoint::Background, target, message)
            .await
        {
            warn!(error = %err, selection_type = selection_type.as_str(), "could not start area selection");
        }
    }

    fn store_selection(&self, selection_type: SelectionType, selector: String, name: &str) {
        info!(key = selection_type.storage_key(), %selector, %name, "area selected");
        if let Err(err) = self.ctx.state().set_selector(selection_type, selector.clone()) {
            warn!(error = %err, "failed to persist selected area");
            return;
        }
        self.ctx.notifier().notify(Notification::AreaSelected {
            selection_type,
            selector,
        });
    }

    async fn screenshot(&self, origin: Endpoint, region: Option<Rect>) -> ActionResult {
        let tab = match origin {
            Endpoint::Tab(tab) => Ok(tab),
            Endpoint::Background => self
                .ctx
                .bridge()
                .active_tab()
                .ok_or_else(|| PipelineError::Capture("no active tab to capture".to_string())),
        };
        let captured = match tab {
            Ok(tab) => self.capture.capture_visible(tab, region).await,
            Err(err) => Err(err),
        };
        let data_url = match captured {
            Ok(png) => png_data_url(&png),
            Err(err) => {
                warn!(error = %err, "screenshot failed");
                return ActionResult::from(err);
            }
        };
        if let Err(err) = self.ctx.state().set_last_screenshot(data_url.clone()) {
            warn!(error = %err, "failed to store screenshot");
        }
        ActionResult::ok(Some(json!({ "dataUrl": data_url })))
    }

    /// Plans an instruction against the current page and runs the plan.
    /// The page is the tab active when the automation starts; every step
    /// goes there even if another tab is activated meanwhile.
    pub async fn automate(&self, instruction: &str) -> ActionResult {
        let endpoint = match self.ctx.bridge().resolve(Target::ActiveTab) {
            Ok(endpoint) => endpoint,
            Err(err) => {
                warn!(%instruction, error = %err, "no page to automate");
                return ActionResult::from(PipelineError::from(err));
            }
        };
        match self.plan(instruction, endpoint).await {
            Ok(actions) => {
                let cancel = self.shutdown.child_token();
                let sequencer = Sequencer::with_config(
                    Arc::new(self.router.pinned(endpoint)),
                    self.ctx.config().sequencer.clone(),
                );
                let run = sequencer.run(&actions, &cancel);
                match tokio::time::timeout(self.ctx.config().automation_timeout(), run).await {
                    Ok(report) => report.to_result(),
                    Err(_) => {
                        cancel.cancel();
                        ActionResult::from(PipelineError::from(BridgeError::Timeout {
                            ms: self.ctx.config().automation_timeout_ms,
                        }))
                    }
                }
            }
            Err(err) => {
                warn!(%instruction, error = %err, "automation planning failed");
                ActionResult::from(err)
            }
        }
    }

    async fn plan(&self, instruction: &str, endpoint: Endpoint) -> Result<Vec<Action>, PipelineError> {
        let planner = self.planner.as_ref().ok_or(FlowError::PlannerUnavailable)?;
        let request = PlanRequest {
            instruction: instruction.to_string(),
            dom: self.page_outline(endpoint).await,
    /// Outline of the page at `endpoint`; empty when it does not answer.
    async fn page_outline(&self, endpoint: Endpoint) -> String {
        let timeout = Duration::from_millis(self.ctx.config().dispatch_timeout_ms);
        match self
            .ctx
            .bridge()
            .invoke_endpoint(
                Endpoint::Background,
                endpoint,
                CommandMessage::GetPageDom,
                timeout,
            )
            .await
        {
            Ok(ActionResult {
                success: true,
                data: Some(data),
                ..
            }) => data["dom"].as_str().unwrap_or_default().to_string(),
            Ok(result) => {
                warn!(error = ?result.error, "page outline unavailable");
                String::new()
            }
            Err(err) => {
                warn!(error = %err, "page outline unavailable");
                String::new()
            }
        }
    }
}
