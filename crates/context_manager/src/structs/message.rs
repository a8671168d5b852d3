use chat_core::{MessageContent, Role};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::structs::metadata::NodeMetadata;

/// A node in the message tree, stored in the session's node map.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct MessageNode {
    pub id: Uuid,
    /// None only for the session root
    pub parent_id: Option<Uuid>,
    pub role: Role,
    pub content: MessageContent,
    /// Soft-delete flag; disabled nodes stay in the tree but are not sent
    #[serde(default = "default_true")]
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub metadata: NodeMetadata,
}

fn default_true() -> bool {
    true
}

impl MessageNode {
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// Content for a node that has not been placed in the tree yet.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeDraft {
    pub role: Role,
    pub content: MessageContent,
    pub metadata: NodeMetadata,
}

impl NodeDraft {
    pub fn new(role: Role, content: impl Into<MessageContent>) -> Self {
        Self {
            role,
            content: content.into(),
            metadata: NodeMetadata::default(),
        }
    }

    pub fn user(content: impl Into<MessageContent>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<MessageContent>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn system(content: impl Into<MessageContent>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn with_metadata(mut self, metadata: NodeMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub(crate) fn into_node(self, parent_id: Uuid, created_at: DateTime<Utc>) -> MessageNode {
        MessageNode {
            id: Uuid::new_v4(),
            parent_id: Some(parent_id),
            role: self.role,
            content: self.content,
            enabled: true,
            created_at,
            metadata: self.metadata,
        }
    }
}
