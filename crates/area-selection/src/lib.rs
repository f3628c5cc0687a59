//! Pointer-driven element selection.
//!
//! `Idle -> Selecting -> Committed | Cancelled -> Idle`. While selecting, the
//! hovered element is outlined; a click commits its selector and an Escape
//! key press cancels. At most one session is active at a time.

mod manager;
mod types;

pub use manager::SelectionManager;
pub use types::{SelectedArea, SelectionSink, SelectionState, SessionToken};
