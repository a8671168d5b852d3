//! Regex Processor
//!
//! Rewrites message text with the layered regex rules for the request stage.

use async_trait::async_trait;
use chat_core::{RuleLayer, RuleSet, RuleStage};

use crate::pipeline::context::{LogLevel, PipelineContext, PipelineLog};
use crate::pipeline::error::ProcessError;
use crate::pipeline::result::ProcessResult;
use crate::pipeline::traits::ContextProcessor;
use crate::rules::{compile_rules, RuleResolver};

use super::REGEX_PRIORITY;

/// Regex Processor
///
/// Rules come from three layers: the global set held by the processor, the
/// agent's set and the user profile's set. Depth is counted from the end of
/// the list as it stands when this stage runs, so the newest message has
/// depth 0.
pub struct RegexProcessor {
    global_rules: RuleSet,
}

impl RegexProcessor {
    pub const ID: &'static str = "regex";

    pub fn new(global_rules: RuleSet) -> Self {
        Self { global_rules }
    }
}

impl Default for RegexProcessor {
    fn default() -> Self {
        Self::new(RuleSet::default())
    }
}

#[async_trait]
impl ContextProcessor for RegexProcessor {
    fn id(&self) -> &str {
        Self::ID
    }

    fn priority(&self) -> i32 {
        REGEX_PRIORITY
    }

    async fn execute<'a>(&self, ctx: &mut PipelineContext<'a>) -> Result<ProcessResult, ProcessError> {
        let resolved = RuleResolver::new(RuleStage::Request)
            .layer(RuleLayer::Global, &self.global_rules)
            .optional_layer(RuleLayer::Agent, ctx.agent_config.map(|a| &a.regex_rules))
            .optional_layer(RuleLayer::User, ctx.user_profile.map(|p| &p.regex_rules))
            .resolve();

        if resolved.is_empty() {
            ctx.debug(Self::ID, "no request-stage rules");
            return Ok(ProcessResult::Continue);
        }

        let (rules, failures) = compile_rules(&resolved);
        for failure in failures {
            let rule_id = failure.rule_id().to_string();
            ctx.log_rule(LogLevel::Error, Self::ID, &rule_id, failure.to_string());
        }

        let total = ctx.messages.len();
        let mut notes = Vec::new();
        let mut rewritten = 0usize;

        for (index, message) in ctx.messages.iter_mut().enumerate() {
            if !message.content.has_text() {
                continue;
            }
            let depth = total - 1 - index;
            let role = message.role;

            for rule in rules.iter().filter(|r| r.targets(role, depth)) {
                let mut changed = false;
                message.content.map_text(|text| {
                    let replaced = rule.apply(text);
                    changed |= replaced != text;
                    replaced
                });
                if changed {
                    rewritten += 1;
                    let mut note = PipelineLog::new(
                        LogLevel::Debug,
                        Self::ID,
                        format!(
                            "{} ({} layer) rewrote {role} message at depth {depth}",
                            rule.rule.label(),
                            rule.layer
                        ),
                    );
                    note.rule_id = Some(rule.id().to_string());
                    notes.push(note);
                }
            }
        }

        for note in notes {
            ctx.push_log(note);
        }
        ctx.debug(
            Self::ID,
            format!("{} rules applied, {rewritten} rewrites", rules.len()),
        );

        Ok(ProcessResult::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::message::ProcessableMessage;
    use chat_core::{AgentConfig, ContentPart, MessageContent, RegexRule, Role, UserProfile};
    use serde_json::json;

    fn texts(ctx: &PipelineContext<'_>) -> Vec<String> {
        ctx.messages.iter().map(|m| m.text_content()).collect()
    }

    #[tokio::test]
    async fn test_max_depth_zero_only_touches_last_message() {
        let rules = RuleSet::new(vec![RegexRule::new("latest", "foo", "bar").with_depth(None, Some(0))]);
        let mut ctx = PipelineContext::empty();
        ctx.messages = vec![
            ProcessableMessage::text(Role::User, "foo one"),
            ProcessableMessage::text(Role::Assistant, "foo two"),
            ProcessableMessage::text(Role::User, "foo three"),
        ];

        RegexProcessor::new(rules).execute(&mut ctx).await.unwrap();

        assert_eq!(texts(&ctx), vec!["foo one", "foo two", "bar three"]);
    }

    #[tokio::test]
    async fn test_role_filter() {
        let rules = RuleSet::new(vec![RegexRule::new("assistant-only", "x", "y")
            .with_flags("g")
            .with_role(Role::Assistant)]);
        let mut ctx = PipelineContext::empty();
        ctx.messages = vec![
            ProcessableMessage::text(Role::User, "xx"),
            ProcessableMessage::text(Role::Assistant, "xx"),
        ];

        RegexProcessor::new(rules).execute(&mut ctx).await.unwrap();

        assert_eq!(texts(&ctx), vec!["xx", "yy"]);
    }

    #[tokio::test]
    async fn test_layers_apply_in_resolved_order() {
        let global = RuleSet::new(vec![RegexRule::new("first", "a", "b").with_order(0)]);
        let agent = AgentConfig::new("agent", "Agent")
            .with_rules(RuleSet::new(vec![RegexRule::new("second", "b", "c").with_order(1)]));
        let profile = UserProfile::new("user", "Ann")
            .with_rules(RuleSet::new(vec![RegexRule::new("third", "c", "d").with_order(2)]));

        let mut ctx = PipelineContext::empty().with_agent(&agent).with_profile(&profile);
        ctx.messages = vec![ProcessableMessage::text(Role::User, "a")];

        RegexProcessor::new(global).execute(&mut ctx).await.unwrap();

        assert_eq!(texts(&ctx), vec!["d"]);
    }

    #[tokio::test]
    async fn test_broken_rule_is_logged_and_others_still_run() {
        let rules = RuleSet::new(vec![
            RegexRule::new("broken", "(", ""),
            RegexRule::new("works", "cat", "dog"),
        ]);
        let mut ctx = PipelineContext::empty();
        ctx.messages = vec![ProcessableMessage::text(Role::User, "cat")];

        RegexProcessor::new(rules).execute(&mut ctx).await.unwrap();

        assert_eq!(texts(&ctx), vec!["dog"]);
        let errors: Vec<_> = ctx.logs_at_least(LogLevel::Error).collect();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].rule_id.as_deref(), Some("broken"));
    }

    #[tokio::test]
    async fn test_rewrite_log_names_rule_and_layer() {
        let global = RuleSet::new(vec![RegexRule::new("shout", "hi", "HI")]);
        let profile = UserProfile::new("user", "Ann").with_rules(RuleSet::new(vec![RegexRule {
            name: Some("Polite".to_string()),
            ..RegexRule::new("polite", "yo", "hello")
        }]));

        let mut ctx = PipelineContext::empty().with_profile(&profile);
        ctx.messages = vec![ProcessableMessage::text(Role::User, "hi yo")];

        RegexProcessor::new(global).execute(&mut ctx).await.unwrap();

        assert_eq!(texts(&ctx), vec!["HI hello"]);
        let notes: Vec<_> = ctx.logs.iter().filter(|l| l.rule_id.is_some()).collect();
        assert_eq!(notes.len(), 2);
        assert_eq!(notes[0].message, "shout (global layer) rewrote user message at depth 0");
        assert_eq!(notes[1].message, "Polite (user layer) rewrote user message at depth 0");
    }

    #[tokio::test]
    async fn test_structured_content_rewrites_text_parts_only() {
        let rules = RuleSet::new(vec![RegexRule::new("r", "secret", "[redacted]").with_flags("g")]);
        let mut ctx = PipelineContext::empty();
        ctx.messages = vec![
            ProcessableMessage::text(Role::User, "no text below"),
            ProcessableMessage {
                content: MessageContent::Parts(vec![
                    ContentPart::text("a secret"),
                    ContentPart::tool_call("call-1", "lookup", json!({"q": "secret"})),
                ]),
                ..ProcessableMessage::text(Role::Assistant, "")
            },
        ];

        RegexProcessor::new(rules).execute(&mut ctx).await.unwrap();

        let MessageContent::Parts(parts) = &ctx.messages[1].content else {
            panic!("content should stay structured");
        };
        assert_eq!(parts[0].as_text(), Some("a [redacted]"));
        assert_eq!(
            parts[1],
            ContentPart::tool_call("call-1", "lookup", json!({"q": "secret"}))
        );
    }
}
