//! Taxy command pipeline
//!
//! Chat text starting with `/taxy` is parsed into an [`Action`], routed from
//! the page context through the background context to the page that owns the
//! document, executed there and reported back. This crate holds the
//! host-side pieces (router, background and content services, chat
//! interceptor) and the `taxy` CLI; the building blocks live in the
//! workspace crates.
//!
//! [`Action`]: action_primitives::Action

pub mod background;
pub mod cli;
pub mod config;
pub mod content;
pub mod errors;
pub mod interceptor;
pub mod pipeline;
pub mod planner;
pub mod router;
pub mod session;

pub use background::{png_data_url, BackgroundService, NoTabCapture, StaticCapture, TabCapture};
pub use config::Config;
pub use content::{BridgeCapture, ContentService};
pub use errors::PipelineError;
pub use interceptor::{ChatInterceptor, InterceptOutcome};
pub use pipeline::PipelineContext;
pub use planner::CommandListPlanner;
pub use router::{CommandRouter, PinnedRunner, QueuedDispatch};
pub use session::{PageHandle, Session};
