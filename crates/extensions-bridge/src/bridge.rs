use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use action_primitives::ActionResult;
use async_trait::async_trait;
use dashmap::DashMap;
use taxy_core_types::{CorrelationId, TabId};
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::config::BridgeConfig;
use crate::errors::BridgeError;
use crate::events::{BridgeEvent, BridgeEventBus};
use crate::message::CommandMessage;
use crate::tabs::{TabInfo, TabRegistry};
use crate::{Endpoint, Target};

type Pending = DashMap<CorrelationId, oneshot::Sender<ActionResult>>;

/// Receiving half of an endpoint.
pub type Inbox = mpsc::Receiver<Envelope>;

/// One delivered message.
#[derive(Debug)]
pub struct Envelope {
    pub id: CorrelationId,
    pub origin: Endpoint,
    pub message: CommandMessage,
    /// Present when the sender waits for an answer.
    pub reply: Option<Replier>,
}

impl Envelope {
    /// Answers the request, if it expects an answer.
    pub fn respond(&mut self, result: ActionResult) {
        if let Some(replier) = self.reply.take() {
            replier.send(result);
        }
    }
}

/// Consume-once reply handle. Dropping it unanswered fails the request with
/// [`BridgeError::ChannelClosed`].
pub struct Replier {
    id: CorrelationId,
    pending: Arc<Pending>,
    events: BridgeEventBus,
    sent: bool,
}

impl Replier {
    fn new(id: CorrelationId, pending: Arc<Pending>, events: BridgeEventBus) -> Self {
        Self {
            id,
            pending,
            events,
            sent: false,
        }
    }

    pub fn id(&self) -> CorrelationId {
        self.id
    }

    /// Returns `false` when nobody was waiting any more.
    pub fn send(mut self, result: ActionResult) -> bool {
        self.sent = true;
        let delivered = match self.pending.remove(&self.id) {
            Some((_, tx)) => tx.send(result).is_ok(),
            None => false,
        };
        if !delivered {
            warn!(id = %self.id, "discarding reply that arrived after its caller gave up");
            let _ = self.events.send(BridgeEvent::LateReply { id: self.id });
        }
        delivered
    }
}

impl Drop for Replier {
    fn drop(&mut self) {
        if !self.sent && self.pending.remove(&self.id).is_some() {
            debug!(id = %self.id, "request dropped without a reply");
        }
    }
}

impl fmt::Debug for Replier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Replier").field("id", &self.id).finish()
    }
}

#[async_trait]
pub trait Bridge: Send + Sync {
    /// Resolves a target to a concrete endpoint right now.
    fn resolve(&self, target: Target) -> Result<Endpoint, BridgeError>;

    /// Sends a request to an already resolved endpoint and waits for its
    /// single reply, at most `timeout`.
    async fn invoke_endpoint(
        &self,
        origin: Endpoint,
        endpoint: Endpoint,
        message: CommandMessage,
        timeout: Duration,
    ) -> Result<ActionResult, BridgeError>;

    /// Delivers a message that expects no reply.
    async fn post_endpoint(
        &self,
        origin: Endpoint,
        endpoint: Endpoint,
        message: CommandMessage,
    ) -> Result<(), BridgeError>;

    async fn invoke(
        &self,
        origin: Endpoint,
        target: Target,
        message: CommandMessage,
        timeout: Duration,
    ) -> Result<ActionResult, BridgeError> {
        let endpoint = self.resolve(target)?;
        self.invoke_endpoint(origin, endpoint, message, timeout).await
    }

    async fn post(
        &self,
        origin: Endpoint,
        target: Target,
        message: CommandMessage,
    ) -> Result<(), BridgeError> {
        let endpoint = self.resolve(target)?;
        self.post_endpoint(origin, endpoint, message).await
    }
}

/// In-process bus connecting the background context with page contexts.
pub struct ExtensionsBridge {
    config: BridgeConfig,
    endpoints: DashMap<Endpoint, mpsc::Sender<Envelope>>,
    pending: Arc<Pending>,
    tabs: TabRegistry,
    events: BridgeEventBus,
}

impl ExtensionsBridge {
    pub fn new(config: BridgeConfig) -> Arc<Self> {
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        Arc::new(Self {
            config,
            endpoints: DashMap::new(),
            pending: Arc::new(DashMap::new()),
            tabs: TabRegistry::default(),
            events,
        })
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BridgeEvent> {
        self.events.subscribe()
    }

    pub fn tabs(&self) -> &TabRegistry {
        &self.tabs
    }

    pub fn active_tab(&self) -> Option<TabId> {
        self.tabs.active()
    }

    /// Requests still waiting for their reply.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Registers an endpoint, replacing any previous registration.
    pub fn connect(&self, endpoint: Endpoint) -> Inbox {
        let (tx, rx) = mpsc::channel(self.config.inbox_capacity.max(1));
        if self.endpoints.insert(endpoint, tx).is_some() {
            debug!(%endpoint, "endpoint reconnected");
        }
        info!(%endpoint, "endpoint connected");
        let _ = self.events.send(BridgeEvent::EndpointConnected { endpoint });
        rx
    }

    pub fn disconnect(&self, endpoint: Endpoint) -> bool {
        let removed = self.endpoints.remove(&endpoint).is_some();
        if removed {
            info!(%endpoint, "endpoint closed");
            let _ = self.events.send(BridgeEvent::EndpointClosed { endpoint });
        }
        removed
    }

    /// Registers a tab and its page endpoint.
    pub fn open_tab(&self, info: TabInfo) -> Inbox {
        let id = info.id;
        if self.tabs.insert(info) {
            let _ = self
                .events
                .send(BridgeEvent::ActiveTabChanged { tab: Some(id) });
        }
        self.connect(Endpoint::Tab(id))
    }

    pub fn close_tab(&self, id: TabId) {
        let was_active = self.tabs.active() == Some(id);
        self.tabs.remove(id);
        self.disconnect(Endpoint::Tab(id));
        if was_active {
            let _ = self.events.send(BridgeEvent::ActiveTabChanged { tab: None });
        }
    }

    pub fn activate_tab(&self, id: TabId) -> Result<(), BridgeError> {
        if !self.tabs.activate(id) {
            return Err(BridgeError::UnknownTab(id));
        }
        debug!(tab = %id, "active tab changed");
        let _ = self
            .events
            .send(BridgeEvent::ActiveTabChanged { tab: Some(id) });
        Ok(())
    }

    fn sender(&self, endpoint: Endpoint) -> Result<mpsc::Sender<Envelope>, BridgeError> {
        self.endpoints
            .get(&endpoint)
            .map(|entry| entry.value().clone())
            .ok_or(BridgeError::EndpointUnavailable(endpoint))
    }
}

#[async_trait]
impl Bridge for ExtensionsBridge {
    fn resolve(&self, target: Target) -> Result<Endpoint, BridgeError> {
        match target {
            Target::Background => Ok(Endpoint::Background),
            Target::Tab(id) => Ok(Endpoint::Tab(id)),
            Target::ActiveTab => self
                .tabs
                .active()
                .map(Endpoint::Tab)
                .ok_or(BridgeError::NoActiveTab),
        }
    }

    async fn invoke_endpoint(
        &self,
        origin: Endpoint,
        endpoint: Endpoint,
        message: CommandMessage,
        timeout: Duration,
    ) -> Result<ActionResult, BridgeError> {
        let sender = self.sender(endpoint)?;
        let id = CorrelationId::new();
        let kind = message.kind();

        let (tx, rx) = oneshot::channel();
        self.pending.insert(id, tx);
        let envelope = Envelope {
            id,
            origin,
            message,
            reply: Some(Replier::new(id, self.pending.clone(), self.events.clone())),
        };
        debug!(%id, %kind, %origin, %endpoint, "invoking endpoint");

        let exchange = async move {
            sender
                .send(envelope)
                .await
                .map_err(|_| BridgeError::EndpointUnavailable(endpoint))?;
            rx.await.map_err(|_| BridgeError::ChannelClosed)
        };
        let outcome = match tokio::time::timeout(timeout, exchange).await {
            Ok(outcome) => outcome,
            Err(_) => {
                self.pending.remove(&id);
                Err(BridgeError::Timeout {
                    ms: timeout.as_millis() as u64,
                })
            }
        };

        match &outcome {
            Ok(_) => {
                let _ = self.events.send(BridgeEvent::InvokeOk { id, kind, endpoint });
            }
            Err(err) => {
                warn!(%id, %kind, %endpoint, error = %err, "invoke failed");
                let _ = self.events.send(BridgeEvent::InvokeFail {
                    id,
                    kind,
                    endpoint,
                    error: err.to_string(),
                });
            }
        }
        outcome
    }

    async fn post_endpoint(
        &self,
        origin: Endpoint,
        endpoint: Endpoint,
        message: CommandMessage,
    ) -> Result<(), BridgeError> {
        let sender = self.sender(endpoint)?;
        let id = CorrelationId::new();
        debug!(%id, kind = %message.kind(), %origin, %endpoint, "posting message");
        sender
            .send(Envelope {
                id,
                origin,
                message,
                reply: None,
            })
            .await
            .map_err(|_| BridgeError::EndpointUnavailable(endpoint))
    }
}
