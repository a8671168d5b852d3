//! Context Processors
//!
//! The four stages that turn a session branch into model input.

pub mod injection;
pub mod regex_rewrite;
pub mod session_loader;
pub mod token_limiter;

/// Runs first: seeds `messages` from the session
pub const SESSION_LOADER_PRIORITY: i32 = 100;
/// Runs on the untruncated history so depths refer to the full branch
pub const REGEX_PRIORITY: i32 = 200;
pub const TOKEN_LIMITER_PRIORITY: i32 = 300;
pub const INJECTION_PRIORITY: i32 = 400;

// Re-exports
pub use injection::{render_preset, InjectionProcessor};
pub use regex_rewrite::RegexProcessor;
pub use session_loader::SessionLoaderProcessor;
pub use token_limiter::TokenLimiterProcessor;
