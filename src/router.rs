//! Command router: relays actions to the page context that owns the
//! document and records what succeeded.

use std::sync::Arc;
use std::time::Duration;

use action_flow::StepRunner;
use action_primitives::{Action, ActionResult};
use async_trait::async_trait;
use extensions_bridge::{Bridge, CommandMessage, Endpoint, Target};
use taxy_state_center::StateCenter;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::errors::PipelineError;
use crate::pipeline::PipelineContext;

/// A dispatch whose target was fixed when it was enqueued.
#[derive(Debug)]
pub struct QueuedDispatch {
    action: Action,
    target: Result<Endpoint, PipelineError>,
    timeout: Duration,
}

impl QueuedDispatch {
    pub fn action(&self) -> &Action {
        &self.action
    }

    /// Endpoint the dispatch will go to, if one could be resolved.
    pub fn endpoint(&self) -> Option<Endpoint> {
        self.target.as_ref().ok().copied()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

pub struct CommandRouter {
    origin: Endpoint,
    bridge: Arc<dyn Bridge>,
    state: Arc<StateCenter>,
    config: Arc<Config>,
}

impl CommandRouter {
    pub fn new(
        origin: Endpoint,
        bridge: Arc<dyn Bridge>,
        state: Arc<StateCenter>,
        config: Config,
    ) -> Self {
        Self {
            origin,
            bridge,
            state,
            config: Arc::new(config),
        }
    }

    /// Router of the background context.
    pub fn from_context(ctx: &PipelineContext) -> Self {
        Self::new(
            Endpoint::Background,
            ctx.bridge().clone(),
            ctx.state().clone(),
            ctx.config().clone(),
        )
    }

    /// Validates the action and pins the tab that is active right now.
    pub fn enqueue(&self, action: Action) -> QueuedDispatch {
        self.enqueue_for(action, Target::ActiveTab)
    }

    /// Validates the action and resolves `target` once.
    pub fn enqueue_for(&self, action: Action, target: Target) -> QueuedDispatch {
        let timeout = self.config.dispatch_timeout(&action);
        let target = action
            .validate()
            .map_err(PipelineError::from)
            .and_then(|()| self.bridge.resolve(target).map_err(PipelineError::from));
        debug!(%action, target = ?target.as_ref().ok(), "enqueued dispatch");
        QueuedDispatch {
            action,
            target,
            timeout,
        }
    }

    pub async fn send(&self, queued: QueuedDispatch) -> ActionResult {
        let QueuedDispatch {
            action,
            target,
            timeout,
        } = queued;
        let endpoint = match target {
            Ok(endpoint) => endpoint,
            Err(err) => {
                warn!(%action, error = %err, "dispatch rejected before sending");
                return ActionResult::from(err);
            }
        };

        let result = match self
            .bridge
            .invoke_endpoint(
                self.origin,
                endpoint,
                CommandMessage::ExecuteAction(action.clone()),
                timeout,
            )
            .await
        {
            Ok(result) => result,
            Err(err) => ActionResult::from(PipelineError::from(err)),
        };

        if result.success {
            info!(%action, %endpoint, "action dispatched");
            if let Err(err) = self.state.append_history(action.to_string()) {
                warn!(%action, error = %err, "failed to record action history");
            }
        } else {
            warn!(%action, %endpoint, error = ?result.error, kind = ?result.error_kind, "action failed");
        }
        result
    }

    pub async fn dispatch(&self, action: Action) -> ActionResult {
        let queued = self.enqueue(action);
        self.send(queued).await
    }

    /// Dispatches to `endpoint` whichever tab is active.
    pub async fn dispatch_to(&self, endpoint: Endpoint, action: Action) -> ActionResult {
        let queued = self.enqueue_for(action, Target::from(endpoint));
        self.send(queued).await
    }

    /// Step runner whose steps all go to `endpoint`.
    pub fn pinned(self: &Arc<Self>, endpoint: Endpoint) -> PinnedRunner {
        PinnedRunner {
            router: self.clone(),
            endpoint,
        }
    }
}

/// Runs automation steps against the tab resolved when the run started.
pub struct PinnedRunner {
    router: Arc<CommandRouter>,
    endpoint: Endpoint,
}

impl PinnedRunner {
    pub fn endpoint(&self) -> Endpoint {
        self.endpoint
    }
}

#[async_trait]
impl StepRunner for PinnedRunner {
    async fn run_step(&self, action: &Action) -> ActionResult {
        self.router.dispatch_to(self.endpoint, action.clone()).await
    }
}
