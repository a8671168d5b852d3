//! `context_manager` keeps branching chat histories as message trees and
//! builds the message list sent to a model from the active branch.

// Declare the modules
pub mod error;
pub mod pipeline;
pub mod rules;
pub mod structs;

// Re-export the public API
pub use error::{RuleError, TreeError};
pub use pipeline::{
    ContextPipeline, ContextProcessor, LogLevel, PipelineContext, PipelineLog, PipelineOutput,
    PipelineStatus, ProcessError, ProcessResult, ProcessableMessage, SourceType,
};
pub use rules::{compile_rules, CompiledRule, ResolvedRule, RuleResolver};
pub use structs::branch_path::{BranchPath, PathIssue};
pub use structs::message::{MessageNode, NodeDraft};
pub use structs::metadata::{NodeMetadata, TokenUsage};
pub use structs::session::{ChatSession, TreeIssue};
