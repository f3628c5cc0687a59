//! Wires a background context and page contexts around one bridge.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use action_flow::ActionPlanner;
use action_primitives::ActionError;
use area_selection::SelectedArea;
use extensions_bridge::{Bridge, CommandMessage, Endpoint, TabInfo, Target};
use page_dom::{Dom, DomEvent, EventKind, ListenerId, NodeId};
use taxy_core_types::{SelectionType, TabId};
use tokio::task::JoinHandle;
use tracing::info;

use crate::background::{BackgroundService, TabCapture};
use crate::content::ContentService;
use crate::errors::PipelineError;
use crate::interceptor::{ChatInterceptor, InterceptOutcome};
use crate::pipeline::PipelineContext;

const POLL_INTERVAL: Duration = Duration::from_millis(5);

/// One open tab: its page context and the chat observer attached to it.
pub struct PageHandle {
    pub tab: TabId,
    pub content: Arc<ContentService>,
    pub interceptor: Arc<ChatInterceptor>,
    key_listener: ListenerId,
    task: JoinHandle<()>,
}

impl PageHandle {
    pub async fn submit(&self, text: &str) -> InterceptOutcome {
        self.interceptor.submit(text).await
    }
}

impl Drop for PageHandle {
    fn drop(&mut self) {
        self.content.dom().remove_event_listener(self.key_listener);
        self.task.abort();
    }
}

pub struct Session {
    ctx: PipelineContext,
    background: Arc<BackgroundService>,
    task: JoinHandle<()>,
    next_tab: AtomicU32,
}

impl Session {
    pub fn start(
        ctx: PipelineContext,
        capture: Arc<dyn TabCapture>,
        planner: Option<Arc<dyn ActionPlanner>>,
    ) -> Self {
        let mut background = BackgroundService::new(ctx.clone()).with_capture(capture);
        if let Some(planner) = planner {
            background = background.with_planner(planner);
        }
        let (background, task) = background.start();
        Self {
            ctx,
            background,
            task,
            next_tab: AtomicU32::new(1),
        }
    }

    pub fn context(&self) -> &PipelineContext {
        &self.ctx
    }

    pub fn background(&self) -> &Arc<BackgroundService> {
        &self.background
    }

    /// Opens a tab showing `dom`. The chat observer picks up the stored
    /// input selector as it is at this moment.
    pub fn open_tab(&self, dom: Arc<dyn Dom>) -> PageHandle {
        let tab = TabId(self.next_tab.fetch_add(1, Ordering::Relaxed));
        let inbox = self
            .ctx
            .bridge()
            .open_tab(TabInfo::new(tab, dom.location()));
        let content = Arc::new(ContentService::new(&self.ctx, tab, dom.clone()));
        let task = content.clone().serve(inbox);
        let interceptor = Arc::new(ChatInterceptor::new(
            tab,
            dom,
            self.ctx.bridge().clone(),
            self.ctx.config().clone(),
            self.ctx.state().selector(SelectionType::Input),
        ));
        let key_listener = interceptor.attach();
        info!(%tab, "tab opened");
        PageHandle {
            tab,
            content,
            interceptor,
            key_listener,
            task,
        }
    }

    pub fn close_tab(&self, page: PageHandle) {
        self.ctx.bridge().close_tab(page.tab);
    }

    /// Drives a whole area selection on `page`: asks the background to start
    /// selection mode, hovers and clicks the element matching `selector`
    /// through page events, and waits until the background has stored the
    /// result.
    pub async fn select_area(
        &self,
        page: &PageHandle,
        selection_type: SelectionType,
        selector: &str,
    ) -> Result<SelectedArea, PipelineError> {
        let dom = page.content.dom();
        let node = dom
            .query_selector(selector)
            .map_err(ActionError::from)?
            .ok_or_else(|| ActionError::AnchorNotFound(selector.to_string()))?;

        self.ctx
            .bridge()
            .post(
                Endpoint::Tab(page.tab),
                Target::Background,
                CommandMessage::StartAreaSelection { selection_type },
            )
            .await?;

        let selection = page.content.selection();
        if !self.wait_until(|| selection.is_selecting()).await {
            return Err(PipelineError::Protocol(
                "selection mode did not start".to_string(),
            ));
        }
        dispatch_pointer(dom.as_ref(), node, EventKind::MouseOver)?;
        let proceeded = dispatch_pointer(dom.as_ref(), node, EventKind::Click)?;
        let area = match selection.selected_area(selection_type) {
            Some(area) if !proceeded && area.node == node => area,
            _ => {
                return Err(PipelineError::Protocol(format!(
                    "no selector could be built for {selector}"
                )))
            }
        };

        let state = self.ctx.state();
        let stored = self
            .wait_until(|| state.selector(selection_type).as_deref() == Some(area.selector.as_str()))
            .await;
        if !stored {
            return Err(PipelineError::Protocol(
                "selected area was not stored".to_string(),
            ));
        }
        Ok(area)
    }

    async fn wait_until(&self, mut done: impl FnMut() -> bool) -> bool {
        let deadline =
            tokio::time::Instant::now() + Duration::from_millis(self.ctx.config().dispatch_timeout_ms);
        while !done() {
            if tokio::time::Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
        true
    }

    pub fn shutdown(self) {
        self.background.shutdown();
        self.ctx.bridge().disconnect(Endpoint::Background);
        self.task.abort();
    }
}

/// Dispatches a pointer event at the center of `node`. Returns whether the
/// page's default handling proceeds.
fn dispatch_pointer(dom: &dyn Dom, node: NodeId, kind: EventKind) -> Result<bool, PipelineError> {
    let mut event = DomEvent::new(kind);
    if let Some(rect) = dom.bounding_rect(node) {
        let (x, y) = rect.center();
        event = event.at(x, y);
    }
    Ok(dom.dispatch_event(node, event).map_err(ActionError::from)?)
}
