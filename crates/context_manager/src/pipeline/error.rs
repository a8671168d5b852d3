//! Pipeline Errors
//!
//! Errors a single processor can raise. The pipeline catches every one of
//! them; none stops the remaining stages.

use thiserror::Error;

use crate::error::RuleError;

/// Process Error
///
/// Errors that can occur during context processing by a single processor.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// A required input was missing
    #[error("Missing input: {0}")]
    MissingInput(&'static str),

    /// A rule could not be used
    #[error(transparent)]
    Rule(#[from] RuleError),

    /// Invalid processor configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Generic processing error
    #[error("Processing error: {0}")]
    Generic(String),
}
