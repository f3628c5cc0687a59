//! Action Executor - page-side browser automation operations
//!
//! This crate provides the building blocks the page context runs commands with:
//! - The `Action` model and its validation
//! - Primitives: click, type, navigate, scroll, drag, wait, screenshot, test-selector
//! - The `ActionResult` wire shape and failure taxonomy
//! - Notification and capture ports

pub mod errors;
mod locator;
pub mod ports;
mod primitives;
pub mod types;

pub use errors::*;
pub use locator::*;
pub use ports::*;
pub use primitives::*;
pub use types::*;
