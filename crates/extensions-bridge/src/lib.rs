//! Taxy extensions bridge.
//!
//! The background context and every page context own their state and talk
//! only through this bus. Each context registers an [`Endpoint`] and drains
//! its inbox of [`Envelope`]s. Requests that expect an answer carry a
//! consume-once [`Replier`]; the caller waits on it with a timeout.

pub mod bridge;
pub mod config;
pub mod errors;
pub mod events;
pub mod message;
pub mod tabs;

pub use bridge::{Bridge, Envelope, ExtensionsBridge, Inbox, Replier};
pub use config::BridgeConfig;
pub use errors::BridgeError;
pub use events::{BridgeEvent, BridgeEventBus};
pub use message::{CommandMessage, MessageKind};
pub use tabs::{TabInfo, TabRegistry};

use std::fmt;

use serde::{Deserialize, Serialize};
use taxy_core_types::TabId;

/// A registered execution context.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Endpoint {
    Background,
    Tab(TabId),
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Background => f.write_str("background"),
            Endpoint::Tab(tab) => tab.fmt(f),
        }
    }
}

/// Where a message should go. `ActiveTab` is resolved when the message is
/// enqueued, not when it is delivered.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Target {
    Background,
    ActiveTab,
    Tab(TabId),
}

impl From<Endpoint> for Target {
    fn from(endpoint: Endpoint) -> Self {
        match endpoint {
            Endpoint::Background => Target::Background,
            Endpoint::Tab(tab) => Target::Tab(tab),
        }
    }
}
