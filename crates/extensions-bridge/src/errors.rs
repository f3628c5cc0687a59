use taxy_core_types::TabId;
use thiserror::Error;

use crate::Endpoint;

/// Errors surfaced by the bridge.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum BridgeError {
    #[error("no active tab")]
    NoActiveTab,
    #[error("unknown tab {0}")]
    UnknownTab(TabId),
    #[error("endpoint {0} is not connected")]
    EndpointUnavailable(Endpoint),
    #[error("no reply within {ms} ms")]
    Timeout { ms: u64 },
    #[error("endpoint dropped the request without replying")]
    ChannelClosed,
    #[error("internal error: {0}")]
    Internal(String),
}
