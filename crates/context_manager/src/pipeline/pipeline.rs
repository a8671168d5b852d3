//! Context Pipeline Implementation
//!
//! This module implements the engine that runs processors over a context.

use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

use chat_core::PipelineSettings;

use super::context::PipelineContext;
use super::processors::{InjectionProcessor, RegexProcessor, SessionLoaderProcessor, TokenLimiterProcessor};
use super::result::{PipelineOutput, PipelineStatus, ProcessResult};
use super::traits::ContextProcessor;

/// Id used for log entries written by the engine itself
pub const PIPELINE_LOG_ID: &str = "pipeline";

/// Context Pipeline
///
/// Runs processors strictly one after another in ascending priority order,
/// handing the same context to each. A failing or panicking processor is
/// logged and skipped; only a `Halt` or cancellation ends a run early.
///
/// # Example
///
/// ```no_run
/// use chat_core::PipelineSettings;
/// use context_manager::pipeline::{ContextPipeline, PipelineContext};
/// use context_manager::ChatSession;
///
/// async fn build(session: &ChatSession) {
///     let pipeline = ContextPipeline::with_default_processors(&PipelineSettings::default());
///     let output = pipeline.execute(PipelineContext::new(session).with_budget(8_000)).await;
///     println!("{} messages", output.messages.len());
/// }
/// ```
pub struct ContextPipeline {
    /// Registered processors, kept sorted by priority
    processors: Vec<Box<dyn ContextProcessor>>,

    /// Pipeline configuration
    config: PipelineConfig,
}

/// Pipeline Configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Enable timing statistics
    pub enable_timing: bool,

    /// Record a debug log entry for every stage
    pub enable_logging: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            enable_timing: true,
            enable_logging: false,
        }
    }
}

impl ContextPipeline {
    /// Create a new empty pipeline
    pub fn new() -> Self {
        Self {
            processors: Vec::new(),
            config: PipelineConfig::default(),
        }
    }

    /// Create a pipeline with custom configuration
    pub fn with_config(config: PipelineConfig) -> Self {
        Self {
            processors: Vec::new(),
            config,
        }
    }

    /// Session loader, regex, token limiter and injection assembler.
    ///
    /// Regex rules therefore see depths of the untruncated history, and the
    /// limiter measures text after every rewrite.
    pub fn with_default_processors(settings: &PipelineSettings) -> Self {
        Self::new()
            .register(Box::new(SessionLoaderProcessor::new()))
            .register(Box::new(RegexProcessor::new(settings.global_rules.clone())))
            .register(Box::new(TokenLimiterProcessor::new(settings.token_limit.clone())))
            .register(Box::new(InjectionProcessor::new()))
    }

    /// Register a processor (chainable)
    ///
    /// Processors run by ascending priority; equal priorities keep
    /// registration order.
    pub fn register(mut self, processor: Box<dyn ContextProcessor>) -> Self {
        self.processors.push(processor);
        self.processors.sort_by_key(|p| p.priority());
        self
    }

    /// Execute the pipeline on a context
    pub async fn execute(&self, ctx: PipelineContext<'_>) -> PipelineOutput {
        self.run(ctx, None).await
    }

    /// Execute the pipeline, checking `cancel` before each processor
    pub async fn execute_with_cancel(
        &self,
        ctx: PipelineContext<'_>,
        cancel: &CancellationToken,
    ) -> PipelineOutput {
        self.run(ctx, Some(cancel)).await
    }

    async fn run(&self, mut ctx: PipelineContext<'_>, cancel: Option<&CancellationToken>) -> PipelineOutput {
        let mut status = PipelineStatus::Completed;

        if self.processors.is_empty() {
            ctx.warn(PIPELINE_LOG_ID, "no processors registered");
        }

        for processor in &self.processors {
            let id = processor.id();

            if cancel.is_some_and(|token| token.is_cancelled()) {
                ctx.warn(PIPELINE_LOG_ID, format!("cancelled before processor '{id}'"));
                status = PipelineStatus::Cancelled {
                    next_processor: id.to_string(),
                };
                break;
            }

            if self.config.enable_logging {
                ctx.debug(PIPELINE_LOG_ID, format!("running processor '{id}'"));
            }

            let start = Instant::now();
            let outcome = AssertUnwindSafe(processor.execute(&mut ctx)).catch_unwind().await;

            if self.config.enable_timing {
                let duration_us = start.elapsed().as_micros() as u64;
                ctx.stats.record_processor(id.to_string(), duration_us);
            }

            match outcome {
                Ok(Ok(ProcessResult::Continue)) => {}
                Ok(Ok(ProcessResult::Halt { reason })) => {
                    ctx.warn(PIPELINE_LOG_ID, format!("halted by '{id}': {reason}"));
                    status = PipelineStatus::Halted {
                        processor: id.to_string(),
                        reason,
                    };
                    break;
                }
                Ok(Err(error)) => {
                    ctx.error(id, format!("processor failed: {error}"));
                }
                Err(panic) => {
                    ctx.error(id, format!("processor panicked: {}", panic_message(panic.as_ref())));
                }
            }
        }

        tracing::debug!(
            processors_run = ctx.stats.processors_run,
            messages = ctx.messages.len(),
            status = ?status,
            "ContextPipeline: run finished"
        );

        PipelineOutput {
            messages: ctx.messages,
            logs: ctx.logs,
            stats: ctx.stats,
            status,
        }
    }

    /// Ids of the registered processors in execution order
    pub fn processor_ids(&self) -> Vec<&str> {
        self.processors.iter().map(|p| p.id()).collect()
    }

    /// Get the number of registered processors
    pub fn processor_count(&self) -> usize {
        self.processors.len()
    }

    /// Check if pipeline is empty
    pub fn is_empty(&self) -> bool {
        self.processors.is_empty()
    }
}

impl Default for ContextPipeline {
    fn default() -> Self {
        Self::new()
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
