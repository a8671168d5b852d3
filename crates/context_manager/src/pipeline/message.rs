//! Processable Message
//!
//! The unit the pipeline builds and rewrites, tagged with where it came from.

use chat_core::{MessageContent, PresetMessage, Role};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::structs::message::MessageNode;

/// Provenance of a processable message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    SessionHistory,
    AgentPreset,
}

/// A message on its way to the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessableMessage {
    pub role: Role,
    pub content: MessageContent,
    pub source_type: SourceType,
    /// Session node this message was loaded from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_node_id: Option<Uuid>,
    /// Agent preset this message was injected from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preset_id: Option<String>,
}

impl ProcessableMessage {
    pub fn from_node(node: &MessageNode) -> Self {
        Self {
            role: node.role,
            content: node.content.clone(),
            source_type: SourceType::SessionHistory,
            source_node_id: Some(node.id),
            preset_id: None,
        }
    }

    pub fn from_preset(preset: &PresetMessage, content: MessageContent) -> Self {
        Self {
            role: preset.role,
            content,
            source_type: SourceType::AgentPreset,
            source_node_id: None,
            preset_id: Some(preset.id.clone()),
        }
    }

    /// Plain text message without provenance, mostly for tests and callers
    /// seeding a context by hand.
    pub fn text(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            content: MessageContent::text(text),
            source_type: SourceType::SessionHistory,
            source_node_id: None,
            preset_id: None,
        }
    }

    pub fn text_content(&self) -> String {
        self.content.as_text()
    }
}
