//! AgentConfig - Preset messages and injection placement
//!
//! An agent contributes preset messages that are injected into the assembled
//! history, plus its own layer of regex rules.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::message::{MessageContent, Role};
use crate::rules::RuleSet;

/// Agent preset configuration consumed by the context pipeline
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct AgentConfig {
    pub id: String,
    pub name: String,

    /// Messages injected into every assembled history
    #[serde(default)]
    pub presets: Vec<PresetMessage>,

    /// Agent-level rule layer
    #[serde(default)]
    pub regex_rules: RuleSet,

    /// Depth used when an anchored preset cannot find its anchor
    #[serde(default)]
    pub default_injection_depth: usize,
}

impl AgentConfig {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            presets: Vec::new(),
            regex_rules: RuleSet::default(),
            default_injection_depth: 0,
        }
    }

    pub fn with_preset(mut self, preset: PresetMessage) -> Self {
        self.presets.push(preset);
        self
    }

    pub fn with_rules(mut self, rules: RuleSet) -> Self {
        self.regex_rules = rules;
        self
    }

    /// Presets that will actually be injected
    pub fn enabled_presets(&self) -> impl Iterator<Item = &PresetMessage> {
        self.presets.iter().filter(|p| p.enabled)
    }
}

/// A message authored by the agent configuration rather than the conversation
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PresetMessage {
    pub id: String,
    pub role: Role,
    pub content: MessageContent,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub position: InjectionPosition,
}

fn default_true() -> bool {
    true
}

impl PresetMessage {
    pub fn new(id: impl Into<String>, role: Role, content: impl Into<MessageContent>) -> Self {
        Self {
            id: id.into(),
            role,
            content: content.into(),
            enabled: true,
            position: InjectionPosition::default(),
        }
    }

    /// Place the preset so that `depth` messages follow it
    pub fn at_depth(mut self, depth: usize) -> Self {
        self.position = InjectionPosition::Depth { depth };
        self
    }

    pub fn anchored(mut self, target: AnchorTarget, placement: AnchorPlacement) -> Self {
        self.position = InjectionPosition::Anchor { target, placement };
        self
    }
}

/// Where a preset is inserted into the assembled history
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InjectionPosition {
    /// Fixed offset from the end; 0 appends after the newest message
    Depth { depth: usize },
    /// Relative to a specific existing message
    Anchor {
        target: AnchorTarget,
        #[serde(default)]
        placement: AnchorPlacement,
    },
}

impl Default for InjectionPosition {
    fn default() -> Self {
        Self::Depth { depth: 0 }
    }
}

/// The message an anchored preset attaches to
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnchorTarget {
    /// The message that originated from this session node
    Node { id: Uuid },
    FirstOfRole { role: Role },
    LastOfRole { role: Role },
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AnchorPlacement {
    #[default]
    Before,
    After,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_defaults_from_toml() {
        let config: AgentConfig = toml::from_str(
            r#"
id = "writer"
name = "Writer"

[[presets]]
id = "jailbreak"
role = "system"
content = "Stay in character."

[[presets]]
id = "note"
role = "system"
content = "Author's note"
enabled = false
position = { type = "depth", depth = 2 }
"#,
        )
        .unwrap();

        assert_eq!(config.presets.len(), 2);
        assert_eq!(config.presets[0].position, InjectionPosition::Depth { depth: 0 });
        assert_eq!(config.presets[1].position, InjectionPosition::Depth { depth: 2 });
        assert_eq!(config.enabled_presets().count(), 1);
    }

    #[test]
    fn test_anchor_from_json() {
        let preset: PresetMessage = serde_json::from_str(
            r#"{"id":"p","role":"system","content":"x",
                "position":{"type":"anchor","target":{"kind":"last_of_role","role":"user"},"placement":"after"}}"#,
        )
        .unwrap();

        assert_eq!(
            preset.position,
            InjectionPosition::Anchor {
                target: AnchorTarget::LastOfRole { role: Role::User },
                placement: AnchorPlacement::After,
            }
        );
    }
}
