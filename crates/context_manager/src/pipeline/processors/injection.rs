//! Injection Processor
//!
//! Inserts the agent's enabled preset messages into the assembled history.

use async_trait::async_trait;
use chat_core::{AgentConfig, AnchorPlacement, AnchorTarget, InjectionPosition, MessageContent, PresetMessage, UserProfile};

use crate::pipeline::context::PipelineContext;
use crate::pipeline::error::ProcessError;
use crate::pipeline::message::ProcessableMessage;
use crate::pipeline::result::ProcessResult;
use crate::pipeline::traits::ContextProcessor;

use super::INJECTION_PRIORITY;

const USER_MACRO: &str = "{{user}}";
const AGENT_MACRO: &str = "{{agent}}";

/// Injection Processor
///
/// Every position is resolved against the list as it is before anything is
/// inserted, so presets never shift each other. Presets landing on the same
/// index keep their declaration order.
pub struct InjectionProcessor;

impl InjectionProcessor {
    pub const ID: &'static str = "injection";

    pub fn new() -> Self {
        Self
    }
}

impl Default for InjectionProcessor {
    fn default() -> Self {
        Self::new()
    }
}

/// Preset content with `{{user}}` and `{{agent}}` expanded.
pub fn render_preset(preset: &PresetMessage, agent: &AgentConfig, profile: Option<&UserProfile>) -> MessageContent {
    let user = profile.map(|p| p.display_name.as_str()).unwrap_or("User");
    let mut content = preset.content.clone();
    content.map_text(|text| text.replace(USER_MACRO, user).replace(AGENT_MACRO, &agent.name));
    content
}

/// Index a preset is inserted before, or `None` when its anchor is missing.
fn resolve_position(position: &InjectionPosition, messages: &[ProcessableMessage]) -> Option<usize> {
    match position {
        InjectionPosition::Depth { depth } => Some(messages.len() - (*depth).min(messages.len())),
        InjectionPosition::Anchor { target, placement } => {
            let index = match target {
                AnchorTarget::Node { id } => messages.iter().position(|m| m.source_node_id == Some(*id)),
                AnchorTarget::FirstOfRole { role } => messages.iter().position(|m| m.role == *role),
                AnchorTarget::LastOfRole { role } => messages.iter().rposition(|m| m.role == *role),
            }?;
            Some(match placement {
                AnchorPlacement::Before => index,
                AnchorPlacement::After => index + 1,
            })
        }
    }
}

#[async_trait]
impl ContextProcessor for InjectionProcessor {
    fn id(&self) -> &str {
        Self::ID
    }

    fn priority(&self) -> i32 {
        INJECTION_PRIORITY
    }

    async fn execute<'a>(&self, ctx: &mut PipelineContext<'a>) -> Result<ProcessResult, ProcessError> {
        let Some(agent) = ctx.agent_config else {
            ctx.debug(Self::ID, "no agent config, nothing to inject");
            return Ok(ProcessResult::Continue);
        };

        let fallback = ctx.messages.len() - agent.default_injection_depth.min(ctx.messages.len());
        let mut unresolved = Vec::new();
        let mut placements: Vec<(usize, ProcessableMessage)> = agent
            .enabled_presets()
            .map(|preset| {
                let index = resolve_position(&preset.position, &ctx.messages).unwrap_or_else(|| {
                    unresolved.push(preset.id.clone());
                    fallback
                });
                let content = render_preset(preset, agent, ctx.user_profile);
                (index, ProcessableMessage::from_preset(preset, content))
            })
            .collect();

        for preset_id in unresolved {
            ctx.warn(
                Self::ID,
                format!(
                    "anchor for preset '{preset_id}' not found, using depth {}",
                    agent.default_injection_depth
                ),
            );
        }

        if placements.is_empty() {
            return Ok(ProcessResult::Continue);
        }

        // Stable: equal indexes stay in declaration order.
        placements.sort_by_key(|(index, _)| *index);
        let injected = placements.len();

        let history = std::mem::take(&mut ctx.messages);
        let mut merged = Vec::with_capacity(history.len() + injected);
        let mut pending = placements.into_iter().peekable();
        for (index, message) in history.into_iter().enumerate() {
            while let Some((_, preset)) = pending.next_if(|(at, _)| *at == index) {
                merged.push(preset);
            }
            merged.push(message);
        }
        merged.extend(pending.map(|(_, preset)| preset));
        ctx.messages = merged;

        ctx.debug(Self::ID, format!("injected {injected} presets from agent '{}'", agent.id));
        Ok(ProcessResult::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::message::SourceType;
    use chat_core::Role;
    use uuid::Uuid;

    fn history() -> Vec<ProcessableMessage> {
        vec![
            ProcessableMessage::text(Role::User, "u1"),
            ProcessableMessage::text(Role::Assistant, "a1"),
            ProcessableMessage::text(Role::User, "u2"),
        ]
    }

    fn texts(ctx: &PipelineContext<'_>) -> Vec<String> {
        ctx.messages.iter().map(|m| m.text_content()).collect()
    }

    async fn inject(agent: &AgentConfig, messages: Vec<ProcessableMessage>) -> Vec<String> {
        let mut ctx = PipelineContext::empty().with_agent(agent);
        ctx.messages = messages;
        InjectionProcessor::new().execute(&mut ctx).await.unwrap();
        texts(&ctx)
    }

    #[tokio::test]
    async fn test_depth_positions() {
        let agent = AgentConfig::new("a", "Agent")
            .with_preset(PresetMessage::new("end", Role::System, "P0").at_depth(0))
            .with_preset(PresetMessage::new("one", Role::System, "P1").at_depth(1))
            .with_preset(PresetMessage::new("deep", Role::System, "P9").at_depth(9));

        assert_eq!(
            inject(&agent, history()).await,
            vec!["P9", "u1", "a1", "P1", "u2", "P0"]
        );
    }

    #[tokio::test]
    async fn test_shared_position_keeps_declaration_order() {
        let agent = AgentConfig::new("a", "Agent")
            .with_preset(PresetMessage::new("x", Role::System, "X").at_depth(1))
            .with_preset(PresetMessage::new("y", Role::System, "Y").at_depth(1));

        assert_eq!(inject(&agent, history()).await, vec!["u1", "a1", "X", "Y", "u2"]);
    }

    #[tokio::test]
    async fn test_anchor_positions() {
        let agent = AgentConfig::new("a", "Agent")
            .with_preset(
                PresetMessage::new("before-last-user", Role::System, "B")
                    .anchored(AnchorTarget::LastOfRole { role: Role::User }, AnchorPlacement::Before),
            )
            .with_preset(
                PresetMessage::new("after-first-assistant", Role::System, "A")
                    .anchored(AnchorTarget::FirstOfRole { role: Role::Assistant }, AnchorPlacement::After),
            );

        assert_eq!(inject(&agent, history()).await, vec!["u1", "a1", "B", "A", "u2"]);
    }

    #[tokio::test]
    async fn test_node_anchor_and_fallback() {
        let node = Uuid::new_v4();
        let mut messages = history();
        messages[0].source_node_id = Some(node);

        let mut agent = AgentConfig::new("a", "Agent")
            .with_preset(
                PresetMessage::new("node", Role::System, "N")
                    .anchored(AnchorTarget::Node { id: node }, AnchorPlacement::After),
            )
            .with_preset(
                PresetMessage::new("missing", Role::System, "M")
                    .anchored(AnchorTarget::Node { id: Uuid::new_v4() }, AnchorPlacement::Before),
            );
        agent.default_injection_depth = 2;

        let mut ctx = PipelineContext::empty().with_agent(&agent);
        ctx.messages = messages;
        InjectionProcessor::new().execute(&mut ctx).await.unwrap();

        assert_eq!(texts(&ctx), vec!["u1", "N", "M", "a1", "u2"]);
        assert_eq!(ctx.logs_at_least(crate::pipeline::context::LogLevel::Warn).count(), 1);
    }

    #[tokio::test]
    async fn test_disabled_presets_and_provenance() {
        let mut hidden = PresetMessage::new("hidden", Role::System, "H");
        hidden.enabled = false;
        let agent = AgentConfig::new("a", "Agent")
            .with_preset(hidden)
            .with_preset(PresetMessage::new("shown", Role::System, "S"));

        let mut ctx = PipelineContext::empty().with_agent(&agent);
        InjectionProcessor::new().execute(&mut ctx).await.unwrap();

        assert_eq!(ctx.messages.len(), 1);
        assert_eq!(ctx.messages[0].source_type, SourceType::AgentPreset);
        assert_eq!(ctx.messages[0].preset_id.as_deref(), Some("shown"));
    }

    #[test]
    fn test_render_preset_macros() {
        let agent = AgentConfig::new("a", "Narrator");
        let profile = UserProfile::new("u", "Ann");
        let preset = PresetMessage::new("p", Role::System, "{{agent}} talks to {{user}}.");

        assert_eq!(
            render_preset(&preset, &agent, Some(&profile)).as_text(),
            "Narrator talks to Ann."
        );
        assert_eq!(render_preset(&preset, &agent, None).as_text(), "Narrator talks to User.");
    }
}
