use serde::{Deserialize, Serialize};

use crate::message::Role;

/// Pipeline stage a rule participates in
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum RuleStage {
    /// Rewrites the history sent to the model
    Request,
    /// Rewrites what the UI renders; never sent to the model
    Display,
}

/// Which configuration layer a rule came from.
///
/// Layers are ordered: a later layer may add rules or override an earlier
/// rule that has the same id.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum RuleLayer {
    Global,
    Agent,
    User,
}

impl RuleLayer {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleLayer::Global => "global",
            RuleLayer::Agent => "agent",
            RuleLayer::User => "user",
        }
    }
}

impl std::fmt::Display for RuleLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single regex rewrite rule
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RegexRule {
    /// Stable identifier, also the override key across layers
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// The pattern to match
    pub regex: String,
    /// Single-letter flags: g, i, m, s, x
    #[serde(default)]
    pub flags: String,
    #[serde(default)]
    pub replacement: String,
    /// Only apply to messages with this role (None = any role)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role_filter: Option<Role>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_depth: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<usize>,
    #[serde(default)]
    pub order: i32,
    /// Whether this rule is enabled
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_stages")]
    pub stages: Vec<RuleStage>,
}

fn default_true() -> bool {
    true
}

fn default_stages() -> Vec<RuleStage> {
    vec![RuleStage::Request]
}

impl RegexRule {
    /// Create an enabled request-stage rule with no filters
    pub fn new(id: impl Into<String>, regex: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            regex: regex.into(),
            flags: String::new(),
            replacement: replacement.into(),
            role_filter: None,
            min_depth: None,
            max_depth: None,
            order: 0,
            enabled: true,
            stages: default_stages(),
        }
    }

    pub fn with_flags(mut self, flags: impl Into<String>) -> Self {
        self.flags = flags.into();
        self
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role_filter = Some(role);
        self
    }

    pub fn with_depth(mut self, min_depth: Option<usize>, max_depth: Option<usize>) -> Self {
        self.min_depth = min_depth;
        self.max_depth = max_depth;
        self
    }

    pub fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn applies_to_stage(&self, stage: RuleStage) -> bool {
        self.stages.contains(&stage)
    }

    /// Whether the rule targets a message with `role` at `depth`.
    ///
    /// Unset bounds are unbounded.
    pub fn matches_target(&self, role: Role, depth: usize) -> bool {
        if self.role_filter.is_some_and(|r| r != role) {
            return false;
        }
        if self.min_depth.is_some_and(|min| depth < min) {
            return false;
        }
        if self.max_depth.is_some_and(|max| depth > max) {
            return false;
        }
        true
    }

    /// Label used in diagnostics
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}

/// A set of rules from one configuration layer
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RuleSet {
    #[serde(default)]
    pub rules: Vec<RegexRule>,
}

impl RuleSet {
    pub fn new(rules: Vec<RegexRule>) -> Self {
        Self { rules }
    }

    pub fn push(&mut self, rule: RegexRule) {
        self.rules.push(rule);
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
