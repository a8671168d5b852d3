//! chat_core - Core types shared by the chat context pipeline
//!
//! This crate provides the foundational types used across the chat crates:
//! - `message` - Role, MessageContent and its typed parts
//! - `rules` - Regex rewrite rules and their layers
//! - `agent` - Agent presets, injection placement, user profile
//! - `config` - Pipeline settings loading

pub mod agent;
pub mod config;
pub mod message;
pub mod paths;
pub mod rules;

// Re-export commonly used types
pub use agent::{AgentConfig, AnchorPlacement, AnchorTarget, InjectionPosition, PresetMessage, UserProfile};
pub use config::{BudgetUnit, PipelineSettings, TokenLimitSettings, DEFAULT_CHARS_PER_TOKEN};
pub use message::{ContentPart, ImageSource, MessageContent, Role};
pub use rules::{RegexRule, RuleLayer, RuleSet, RuleStage};
