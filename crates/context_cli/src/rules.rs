//! Resolve and compile the layered regex rules without building context.

use chat_core::{RuleLayer, RuleStage};
use context_manager::{compile_rules, RuleResolver};
use serde_json::{json, Value};

use crate::inputs::Configs;

/// Effective rules for a stage, in application order, plus compile failures
pub struct RuleReport {
    pub rules: Vec<Value>,
    pub failures: Vec<Value>,
}

impl RuleReport {
    pub fn build(configs: &Configs, stage: RuleStage) -> Self {
        let resolved = RuleResolver::new(stage)
            .layer(RuleLayer::Global, &configs.settings.global_rules)
            .optional_layer(RuleLayer::Agent, configs.agent.as_ref().map(|a| &a.regex_rules))
            .optional_layer(RuleLayer::User, configs.profile.as_ref().map(|p| &p.regex_rules))
            .resolve();
        let (compiled, failures) = compile_rules(&resolved);

        let rules = compiled
            .iter()
            .map(|rule| {
                json!({
                    "id": rule.id(),
                    "label": rule.rule.label(),
                    "layer": rule.layer,
                    "order": rule.rule.order,
                })
            })
            .collect();
        let failures = failures
            .iter()
            .map(|e| json!({ "id": e.rule_id(), "error": e.to_string() }))
            .collect();

        Self { rules, failures }
    }

    pub fn to_json(&self) -> Value {
        json!({ "rules": self.rules, "failures": self.failures })
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}
