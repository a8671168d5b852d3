//! Processing Results
//!
//! This module defines the result types returned by processors and the pipeline.

use serde::Serialize;

use crate::pipeline::context::{LogLevel, PipelineLog, ProcessingStats};
use crate::pipeline::message::ProcessableMessage;

/// Process Result
///
/// Returned by each processor to indicate what should happen next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessResult {
    /// Continue to the next processor
    Continue,

    /// A precondition failed and later stages would be meaningless.
    ///
    /// The pipeline stops and returns the context as it stands.
    Halt {
        /// Reason for halting
        reason: String,
    },
}

/// How a pipeline run ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PipelineStatus {
    /// Every processor ran (some may have failed and been logged)
    Completed,
    /// A processor stopped the run
    Halted { processor: String, reason: String },
    /// Cancellation was observed before `next_processor` started
    Cancelled { next_processor: String },
}

/// Pipeline Output
///
/// The final result of executing the entire pipeline.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutput {
    /// The finished message list for the model
    pub messages: Vec<ProcessableMessage>,
    /// Diagnostic trail
    pub logs: Vec<PipelineLog>,
    /// Statistics about the processing
    pub stats: ProcessingStats,
    pub status: PipelineStatus,
}

impl PipelineOutput {
    pub fn is_completed(&self) -> bool {
        self.status == PipelineStatus::Completed
    }

    /// Errors recorded during the run
    pub fn errors(&self) -> impl Iterator<Item = &PipelineLog> {
        self.logs.iter().filter(|entry| entry.level == LogLevel::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &PipelineLog> {
        self.logs.iter().filter(|entry| entry.level == LogLevel::Warn)
    }
}
