//! Message module - Message content types
//!
//! Shared message types used across the system.

mod content;
mod role;

pub use content::{ContentPart, ImageSource, MessageContent};
pub use role::Role;
