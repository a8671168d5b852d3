//! Rules module - Regex rewrite rule definitions
//!
//! Rules are declared in global, agent and user configuration and merged by
//! the context pipeline.

mod rule;

pub use rule::{RegexRule, RuleLayer, RuleSet, RuleStage};
