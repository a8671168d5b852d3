//! Context Pipeline
//!
//! Ordered processors that build the message list sent to the model from
//! the active branch of a session.
//!
//! # Architecture
//!
//! ```text
//! ChatSession → [SessionLoader] → [Regex] → [TokenLimiter] → [Injection] → messages
//!                     100            200          300             400
//! ```
//!
//! # Example
//!
//! ```no_run
//! use chat_core::{AgentConfig, PipelineSettings};
//! use context_manager::pipeline::{ContextPipeline, PipelineContext};
//! use context_manager::ChatSession;
//!
//! async fn build(session: &ChatSession, agent: &AgentConfig) {
//!     let settings = PipelineSettings::load();
//!     let pipeline = ContextPipeline::with_default_processors(&settings);
//!     let ctx = PipelineContext::new(session).with_agent(agent);
//!     let output = pipeline.execute(ctx).await;
//!     for entry in output.errors() {
//!         eprintln!("{}: {}", entry.processor, entry.message);
//!     }
//! }
//! ```

pub mod context;
pub mod error;
pub mod message;
pub mod pipeline;
pub mod processors;
pub mod result;
pub mod traits;

// Re-exports for convenience
pub use context::{LogLevel, PipelineContext, PipelineLog, ProcessingStats};
pub use error::ProcessError;
pub use message::{ProcessableMessage, SourceType};
pub use pipeline::{ContextPipeline, PipelineConfig, PIPELINE_LOG_ID};
pub use result::{PipelineOutput, PipelineStatus, ProcessResult};
pub use traits::ContextProcessor;
