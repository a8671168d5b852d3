//! Context Processor Trait
//!
//! This module defines the core trait that all context processors must implement.

use async_trait::async_trait;

use super::context::PipelineContext;
use super::error::ProcessError;
use super::result::ProcessResult;

/// Context Processor Trait
///
/// All processors in the pipeline must implement this trait.
/// Processors are stateless across runs: everything a run needs lives in the
/// `PipelineContext`. Each processor can:
/// - Seed or rewrite `messages`
/// - Append diagnostics to `logs`
/// - Halt the pipeline when a precondition fails
///
/// # Example
///
/// ```no_run
/// use async_trait::async_trait;
/// use context_manager::pipeline::{ContextProcessor, PipelineContext, ProcessError, ProcessResult};
///
/// struct Uppercase;
///
/// #[async_trait]
/// impl ContextProcessor for Uppercase {
///     fn id(&self) -> &str {
///         "uppercase"
///     }
///
///     fn priority(&self) -> i32 {
///         250
///     }
///
///     async fn execute<'a>(&self, ctx: &mut PipelineContext<'a>) -> Result<ProcessResult, ProcessError> {
///         for message in ctx.messages.iter_mut() {
///             message.content.map_text(|t| t.to_uppercase());
///         }
///         Ok(ProcessResult::Continue)
///     }
/// }
/// ```
#[async_trait]
pub trait ContextProcessor: Send + Sync {
    /// Identifier used in logs and statistics
    fn id(&self) -> &str;

    /// Lower values run first
    fn priority(&self) -> i32;

    /// Run this stage against the shared context
    ///
    /// # Returns
    ///
    /// - `Ok(ProcessResult)` - Continue or Halt
    /// - `Err(ProcessError)` - Logged by the pipeline; the next stage still runs
    async fn execute<'a>(&self, ctx: &mut PipelineContext<'a>) -> Result<ProcessResult, ProcessError>;
}
