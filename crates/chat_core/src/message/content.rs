//! MessageContent - Message content types
//!
//! A message carries either plain text or an ordered list of typed parts.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A part of structured message content
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    /// Text content
    Text { text: String },

    /// Image content (base64 or URL)
    Image {
        /// Base64 encoded image data or URL
        source: ImageSource,
        /// Optional alt text
        #[serde(default, skip_serializing_if = "Option::is_none")]
        alt_text: Option<String>,
    },

    /// A tool invocation requested by the assistant
    ToolCall {
        id: String,
        name: String,
        #[serde(default)]
        arguments: Value,
    },

    /// The output of a tool invocation
    ToolResult {
        tool_call_id: String,
        content: String,
        #[serde(default)]
        is_error: bool,
    },
}

impl ContentPart {
    /// Create a text content part
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Create an image content part from a URL
    pub fn image_url(url: impl Into<String>) -> Self {
        Self::Image {
            source: ImageSource::Url { url: url.into() },
            alt_text: None,
        }
    }

    pub fn tool_call(id: impl Into<String>, name: impl Into<String>, arguments: Value) -> Self {
        Self::ToolCall {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }

    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self::ToolResult {
            tool_call_id: tool_call_id.into(),
            content: content.into(),
            is_error: false,
        }
    }

    /// Get text content if this is a text part
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { text } => Some(text),
            _ => None,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Self::Text { .. })
    }
}

/// Image source (base64 or URL)
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ImageSource {
    /// Base64 encoded image data
    Base64 { data: String, media_type: String },
    /// URL to the image
    Url { url: String },
}

/// Message content: plain text or a sequence of typed parts, never both.
///
/// Serialized untagged so that `"hello"` and `[{"type":"text",...}]` are both
/// accepted on the wire.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

impl Default for MessageContent {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

impl MessageContent {
    /// Create plain text content
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Create structured content from parts
    pub fn parts(parts: Vec<ContentPart>) -> Self {
        Self::Parts(parts)
    }

    /// Get all text content concatenated
    pub fn as_text(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Parts(parts) => parts
                .iter()
                .filter_map(|p| p.as_text())
                .collect::<Vec<_>>()
                .join(""),
        }
    }

    /// Whether there is at least one text segment to operate on.
    pub fn has_text(&self) -> bool {
        match self {
            Self::Text(_) => true,
            Self::Parts(parts) => parts.iter().any(ContentPart::is_text),
        }
    }

    /// True when the content carries nothing but blank text.
    ///
    /// Structured content containing any non-text part is never blank.
    pub fn is_blank_text(&self) -> bool {
        match self {
            Self::Text(text) => text.trim().is_empty(),
            Self::Parts(parts) => parts
                .iter()
                .all(|p| p.as_text().is_some_and(|t| t.trim().is_empty())),
        }
    }

    /// Rewrite every text segment in place with `f`.
    ///
    /// Non-text parts are left untouched.
    pub fn map_text<F>(&mut self, mut f: F)
    where
        F: FnMut(&str) -> String,
    {
        match self {
            Self::Text(text) => *text = f(text),
            Self::Parts(parts) => {
                for part in parts.iter_mut() {
                    if let ContentPart::Text { text } = part {
                        *text = f(text);
                    }
                }
            }
        }
    }
}

impl From<String> for MessageContent {
    fn from(text: String) -> Self {
        Self::text(text)
    }
}

impl From<&str> for MessageContent {
    fn from(text: &str) -> Self {
        Self::text(text)
    }
}

impl From<Vec<ContentPart>> for MessageContent {
    fn from(parts: Vec<ContentPart>) -> Self {
        Self::Parts(parts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_text() {
        let content = MessageContent::text("Hello, world!");
        assert_eq!(content.as_text(), "Hello, world!");
    }

    #[test]
    fn test_content_parts() {
        let content = MessageContent::parts(vec![
            ContentPart::text("Hello "),
            ContentPart::image_url("https://example.com/a.png"),
            ContentPart::text("world!"),
        ]);
        assert_eq!(content.as_text(), "Hello world!");
        assert!(content.has_text());
    }

    #[test]
    fn test_blank_detection_ignores_non_text_parts() {
        assert!(MessageContent::text("  \n ").is_blank_text());
        assert!(!MessageContent::text("hi").is_blank_text());

        let image_only = MessageContent::parts(vec![ContentPart::image_url("u")]);
        assert!(!image_only.is_blank_text());
        assert!(!image_only.has_text());

        let blank_parts = MessageContent::parts(vec![ContentPart::text(" ")]);
        assert!(blank_parts.is_blank_text());
    }

    #[test]
    fn test_map_text_leaves_other_parts() {
        let mut content = MessageContent::parts(vec![
            ContentPart::text("foo"),
            ContentPart::tool_result("call_1", "foo"),
        ]);
        content.map_text(|t| t.replace("foo", "bar"));

        assert_eq!(
            content,
            MessageContent::parts(vec![
                ContentPart::text("bar"),
                ContentPart::tool_result("call_1", "foo"),
            ])
        );
    }

    #[test]
    fn test_untagged_deserialization() {
        let text: MessageContent = serde_json::from_str("\"plain\"").unwrap();
        assert_eq!(text, MessageContent::text("plain"));

        let parts: MessageContent =
            serde_json::from_str(r#"[{"type":"text","text":"a"},{"type":"tool_call","id":"1","name":"ls","arguments":{}}]"#)
                .unwrap();
        match parts {
            MessageContent::Parts(parts) => assert_eq!(parts.len(), 2),
            other => panic!("expected parts, got {other:?}"),
        }
    }
}
