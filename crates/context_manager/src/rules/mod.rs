//! Regex rule resolution and compilation

pub mod compiled;
pub mod resolver;

pub use compiled::{compile_rules, normalize_replacement, CompiledRule};
pub use resolver::{ResolvedRule, RuleResolver};
