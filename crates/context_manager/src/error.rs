use thiserror::Error;
use uuid::Uuid;

/// Errors returned by node manager operations on a `ChatSession`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TreeError {
    /// No node with this id exists in the session.
    #[error("node not found: {0}")]
    NodeNotFound(Uuid),

    /// The synthetic root cannot be edited, disabled or deleted.
    #[error("root node {0} cannot be modified")]
    RootImmutable(Uuid),

    /// A non-root node has no parent, so it has nowhere to branch from.
    #[error("node {0} is detached from the session root")]
    Detached(Uuid),
}

/// A regex rule that could not be turned into a usable matcher.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RuleError {
    #[error("rule '{rule_id}': invalid pattern: {reason}")]
    InvalidPattern { rule_id: String, reason: String },

    #[error("rule '{rule_id}': unsupported flag '{flag}'")]
    UnsupportedFlag { rule_id: String, flag: char },
}

impl RuleError {
    pub fn rule_id(&self) -> &str {
        match self {
            RuleError::InvalidPattern { rule_id, .. } | RuleError::UnsupportedFlag { rule_id, .. } => {
                rule_id
            }
        }
    }
}
