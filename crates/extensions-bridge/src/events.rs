use serde::{Deserialize, Serialize};
use taxy_core_types::{CorrelationId, TabId};

use crate::message::MessageKind;
use crate::Endpoint;

/// Broadcast channel of bridge lifecycle events.
pub type BridgeEventBus = tokio::sync::broadcast::Sender<BridgeEvent>;

/// Events emitted by the bridge to observers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum BridgeEvent {
    EndpointConnected {
        endpoint: Endpoint,
    },
    EndpointClosed {
        endpoint: Endpoint,
    },
    ActiveTabChanged {
        tab: Option<TabId>,
    },
    InvokeOk {
        id: CorrelationId,
        kind: MessageKind,
        endpoint: Endpoint,
    },
    InvokeFail {
        id: CorrelationId,
        kind: MessageKind,
        endpoint: Endpoint,
        error: String,
    },
    /// A reply arrived after its caller stopped waiting.
    LateReply {
        id: CorrelationId,
    },
}
