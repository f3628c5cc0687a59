//! Element location for command hints
//!
//! This crate turns the loose element hints users type into commands into
//! concrete document elements:
//! - CSS selector resolution (primary strategy)
//! - Text content fallback over clickable elements
//! - Selector construction for elements picked interactively

pub mod builder;
pub mod errors;
pub mod resolver;
pub mod strategies;
pub mod types;

pub use builder::*;
pub use errors::*;
pub use resolver::*;
pub use strategies::*;
pub use types::*;
