//! Agent module - Agent presets and user profile
//!
//! Read-only configuration inputs of the context pipeline.

mod preset;
mod profile;

pub use preset::{AgentConfig, AnchorPlacement, AnchorTarget, InjectionPosition, PresetMessage};
pub use profile::UserProfile;
