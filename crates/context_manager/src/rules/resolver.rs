//! Layered rule resolution.
//!
//! Layers are concatenated global, agent, user. A rule in a later layer with
//! the same id replaces the earlier one, which is how a user disables or
//! rewrites a global rule. Disabled rules and rules for other stages are then
//! dropped and the rest stably sorted by `order`.

use chat_core::{RegexRule, RuleLayer, RuleSet, RuleStage};

/// A rule together with the layer it was taken from
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedRule<'r> {
    pub layer: RuleLayer,
    pub rule: &'r RegexRule,
}

pub struct RuleResolver<'r> {
    stage: RuleStage,
    layers: Vec<(RuleLayer, &'r RuleSet)>,
}

impl<'r> RuleResolver<'r> {
    pub fn new(stage: RuleStage) -> Self {
        Self {
            stage,
            layers: Vec::new(),
        }
    }

    /// Add a layer (chainable). Layers may be added in any order.
    pub fn layer(mut self, layer: RuleLayer, rules: &'r RuleSet) -> Self {
        self.layers.push((layer, rules));
        self
    }

    /// Add a layer only when present
    pub fn optional_layer(self, layer: RuleLayer, rules: Option<&'r RuleSet>) -> Self {
        match rules {
            Some(rules) => self.layer(layer, rules),
            None => self,
        }
    }

    pub fn resolve(&self) -> Vec<ResolvedRule<'r>> {
        let mut layers = self.layers.clone();
        layers.sort_by_key(|(layer, _)| *layer);

        let mut merged: Vec<ResolvedRule<'r>> = Vec::new();
        for (layer, set) in layers {
            for rule in &set.rules {
                merged.retain(|existing| existing.rule.id != rule.id);
                merged.push(ResolvedRule { layer, rule });
            }
        }

        let mut resolved: Vec<ResolvedRule<'r>> = merged
            .into_iter()
            .filter(|r| r.rule.enabled && r.rule.applies_to_stage(self.stage))
            .collect();
        resolved.sort_by_key(|r| r.rule.order);

        tracing::debug!(
            stage = ?self.stage,
            resolved = resolved.len(),
            "RuleResolver: resolved rules"
        );

        resolved
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(rules: &[ResolvedRule<'_>]) -> Vec<String> {
        rules.iter().map(|r| r.rule.id.clone()).collect()
    }

    #[test]
    fn test_layers_concatenate_in_precedence_order() {
        let global = RuleSet::new(vec![RegexRule::new("g1", "a", "b")]);
        let agent = RuleSet::new(vec![RegexRule::new("a1", "a", "b")]);
        let user = RuleSet::new(vec![RegexRule::new("u1", "a", "b")]);

        let resolved = RuleResolver::new(RuleStage::Request)
            .layer(RuleLayer::User, &user)
            .layer(RuleLayer::Global, &global)
            .layer(RuleLayer::Agent, &agent)
            .resolve();

        assert_eq!(ids(&resolved), vec!["g1", "a1", "u1"]);
        assert_eq!(resolved[2].layer, RuleLayer::User);
    }

    #[test]
    fn test_later_layer_overrides_same_id() {
        let global = RuleSet::new(vec![
            RegexRule::new("shared", "foo", "global"),
            RegexRule::new("other", "x", "y"),
        ]);
        let user = RuleSet::new(vec![RegexRule::new("shared", "foo", "user")]);

        let resolved = RuleResolver::new(RuleStage::Request)
            .layer(RuleLayer::Global, &global)
            .layer(RuleLayer::User, &user)
            .resolve();

        assert_eq!(ids(&resolved), vec!["other", "shared"]);
        assert_eq!(resolved[1].rule.replacement, "user");
    }

    #[test]
    fn test_user_can_disable_global_rule() {
        let global = RuleSet::new(vec![RegexRule::new("shared", "foo", "bar")]);
        let user = RuleSet::new(vec![RegexRule::new("shared", "foo", "bar").disabled()]);

        let resolved = RuleResolver::new(RuleStage::Request)
            .layer(RuleLayer::Global, &global)
            .layer(RuleLayer::User, &user)
            .resolve();

        assert!(resolved.is_empty());
    }

    #[test]
    fn test_stage_filter_and_order() {
        let mut display_only = RegexRule::new("display", "a", "b");
        display_only.stages = vec![RuleStage::Display];

        let global = RuleSet::new(vec![
            RegexRule::new("late", "a", "b").with_order(10),
            display_only,
            RegexRule::new("early", "a", "b").with_order(-1),
            RegexRule::new("mid", "a", "b"),
        ]);

        let resolved = RuleResolver::new(RuleStage::Request)
            .layer(RuleLayer::Global, &global)
            .resolve();

        assert_eq!(ids(&resolved), vec!["early", "mid", "late"]);
    }
}
