//! Pipeline Context
//!
//! This module defines the context that is passed through the pipeline.

use chat_core::{AgentConfig, UserProfile};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::pipeline::message::ProcessableMessage;
use crate::structs::session::ChatSession;

/// Pipeline Context
///
/// Built fresh for every context-build request and discarded afterwards.
/// Inputs are borrowed read-only; processors rewrite `messages` and append
/// to `logs`.
pub struct PipelineContext<'a> {
    /// The session whose active branch is being built
    pub session: Option<&'a ChatSession>,

    pub agent_config: Option<&'a AgentConfig>,

    pub user_profile: Option<&'a UserProfile>,

    /// Budget for the token limiter, in its configured unit
    pub max_context_size: Option<usize>,

    /// Build history up to this node instead of the active leaf
    pub leaf_override: Option<Uuid>,

    /// The messages being built
    pub messages: Vec<ProcessableMessage>,

    /// Append-only diagnostic trail
    pub logs: Vec<PipelineLog>,

    /// Processing statistics
    pub stats: ProcessingStats,
}

impl<'a> PipelineContext<'a> {
    pub fn new(session: &'a ChatSession) -> Self {
        Self {
            session: Some(session),
            ..Self::empty()
        }
    }

    /// A context with no inputs at all
    pub fn empty() -> Self {
        Self {
            session: None,
            agent_config: None,
            user_profile: None,
            max_context_size: None,
            leaf_override: None,
            messages: Vec::new(),
            logs: Vec::new(),
            stats: ProcessingStats::default(),
        }
    }

    pub fn with_agent(mut self, agent: &'a AgentConfig) -> Self {
        self.agent_config = Some(agent);
        self
    }

    pub fn with_profile(mut self, profile: &'a UserProfile) -> Self {
        self.user_profile = Some(profile);
        self
    }

    pub fn with_budget(mut self, max_context_size: usize) -> Self {
        self.max_context_size = Some(max_context_size);
        self
    }

    pub fn with_leaf(mut self, node_id: Uuid) -> Self {
        self.leaf_override = Some(node_id);
        self
    }

    /// Record a diagnostic and mirror it to tracing
    pub fn log(&mut self, level: LogLevel, processor: &str, message: impl Into<String>) {
        self.push_log(PipelineLog::new(level, processor, message));
    }

    /// Record a diagnostic about one regex rule
    pub fn log_rule(&mut self, level: LogLevel, processor: &str, rule_id: &str, message: impl Into<String>) {
        let mut entry = PipelineLog::new(level, processor, message);
        entry.rule_id = Some(rule_id.to_string());
        self.push_log(entry);
    }

    pub fn debug(&mut self, processor: &str, message: impl Into<String>) {
        self.log(LogLevel::Debug, processor, message);
    }

    pub fn info(&mut self, processor: &str, message: impl Into<String>) {
        self.log(LogLevel::Info, processor, message);
    }

    pub fn warn(&mut self, processor: &str, message: impl Into<String>) {
        self.log(LogLevel::Warn, processor, message);
    }

    pub fn error(&mut self, processor: &str, message: impl Into<String>) {
        self.log(LogLevel::Error, processor, message);
    }

    pub fn push_log(&mut self, entry: PipelineLog) {
        entry.emit();
        self.logs.push(entry);
    }

    /// Log entries at or above `level`
    pub fn logs_at_least(&self, level: LogLevel) -> impl Iterator<Item = &PipelineLog> {
        self.logs.iter().filter(move |entry| entry.level >= level)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

/// One diagnostic entry produced while building context
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineLog {
    pub level: LogLevel,
    /// Id of the processor (or "pipeline") that produced the entry
    pub processor: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule_id: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl PipelineLog {
    pub fn new(level: LogLevel, processor: &str, message: impl Into<String>) -> Self {
        Self {
            level,
            processor: processor.to_string(),
            message: message.into(),
            rule_id: None,
            timestamp: Utc::now(),
        }
    }

    fn emit(&self) {
        let rule_id = self.rule_id.as_deref().unwrap_or("-");
        match self.level {
            LogLevel::Debug => {
                tracing::debug!(processor = %self.processor, rule_id, "{}", self.message)
            }
            LogLevel::Info => {
                tracing::info!(processor = %self.processor, rule_id, "{}", self.message)
            }
            LogLevel::Warn => {
                tracing::warn!(processor = %self.processor, rule_id, "{}", self.message)
            }
            LogLevel::Error => {
                tracing::error!(processor = %self.processor, rule_id, "{}", self.message)
            }
        }
    }
}

/// Processing Statistics
///
/// Tracks statistics during pipeline execution.
#[derive(Debug, Default, Clone, Serialize)]
pub struct ProcessingStats {
    /// Number of processors executed
    pub processors_run: usize,
    /// Total processing time in microseconds
    pub total_duration_us: u64,
    /// Per-processor durations (processor_id, duration_us)
    pub processor_durations: Vec<(String, u64)>,
}

impl ProcessingStats {
    /// Record that a processor ran
    pub fn record_processor(&mut self, id: String, duration_us: u64) {
        self.processors_run += 1;
        self.total_duration_us += duration_us;
        self.processor_durations.push((id, duration_us));
    }

    /// Processor ids in the order they ran
    pub fn execution_order(&self) -> Vec<&str> {
        self.processor_durations
            .iter()
            .map(|(id, _)| id.as_str())
            .collect()
    }
}
