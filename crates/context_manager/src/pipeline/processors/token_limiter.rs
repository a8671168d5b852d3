//! Token Limiter Processor
//!
//! Drops the oldest unprotected messages until the context fits its budget.

use async_trait::async_trait;
use chat_core::{BudgetUnit, ContentPart, MessageContent, TokenLimitSettings};

use crate::pipeline::context::PipelineContext;
use crate::pipeline::error::ProcessError;
use crate::pipeline::message::ProcessableMessage;
use crate::pipeline::result::ProcessResult;
use crate::pipeline::traits::ContextProcessor;

use super::injection::render_preset;
use super::TOKEN_LIMITER_PRIORITY;

/// Token Limiter Processor
///
/// Keeps the first `preserve_head` messages, then the longest run of the
/// most recent messages that still fits, and removes everything between.
/// The size of the presets injected afterwards is reserved up front.
pub struct TokenLimiterProcessor {
    settings: TokenLimitSettings,
}

impl TokenLimiterProcessor {
    pub const ID: &'static str = "token_limiter";

    pub fn new(settings: TokenLimitSettings) -> Self {
        Self { settings }
    }

    /// Size of one message in the configured unit
    pub fn measure(&self, message: &ProcessableMessage) -> usize {
        self.measure_content(&message.content)
    }

    fn measure_content(&self, content: &MessageContent) -> usize {
        let (chars, images) = match content {
            MessageContent::Text(text) => (text.chars().count(), 0),
            MessageContent::Parts(parts) => parts.iter().fold((0, 0), |(chars, images), part| match part {
                ContentPart::Text { text } => (chars + text.chars().count(), images),
                ContentPart::Image { .. } => (chars, images + 1),
                ContentPart::ToolCall { name, arguments, .. } => {
                    (chars + name.chars().count() + arguments.to_string().chars().count(), images)
                }
                ContentPart::ToolResult { content, .. } => (chars + content.chars().count(), images),
            }),
        };

        let text_size = match self.settings.unit {
            BudgetUnit::Characters => chars,
            BudgetUnit::Tokens => estimate_tokens(chars, self.settings.chars_per_token),
        };
        text_size + images * self.settings.image_cost
    }
}

impl Default for TokenLimiterProcessor {
    fn default() -> Self {
        Self::new(TokenLimitSettings::default())
    }
}

/// Round up so a non-empty message never measures zero tokens.
fn estimate_tokens(chars: usize, chars_per_token: f64) -> usize {
    if chars == 0 {
        return 0;
    }
    if chars_per_token <= 0.0 {
        return chars;
    }
    (chars as f64 / chars_per_token).ceil() as usize
}

#[async_trait]
impl ContextProcessor for TokenLimiterProcessor {
    fn id(&self) -> &str {
        Self::ID
    }

    fn priority(&self) -> i32 {
        TOKEN_LIMITER_PRIORITY
    }

    async fn execute<'a>(&self, ctx: &mut PipelineContext<'a>) -> Result<ProcessResult, ProcessError> {
        let Some(budget) = ctx.max_context_size.or(self.settings.max_context_size) else {
            ctx.debug(Self::ID, "no context budget configured");
            return Ok(ProcessResult::Continue);
        };

        let reserved: usize = match ctx.agent_config {
            Some(agent) => agent
                .enabled_presets()
                .map(|preset| self.measure_content(&render_preset(preset, agent, ctx.user_profile)))
                .sum(),
            None => 0,
        };
        if reserved > budget {
            ctx.warn(
                Self::ID,
                format!("presets ({reserved}) exceed budget {budget}; history dropped and the final context will not fit"),
            );
        }
        let available = budget.saturating_sub(reserved);

        let sizes: Vec<usize> = ctx.messages.iter().map(|m| self.measure(m)).collect();
        let total: usize = sizes.iter().sum();
        if total <= available {
            ctx.debug(
                Self::ID,
                format!("{total} of {available} available ({reserved} reserved for presets), nothing removed"),
            );
            return Ok(ProcessResult::Continue);
        }

        let head_len = self.settings.preserve_head.min(ctx.messages.len());
        let head_size: usize = sizes[..head_len].iter().sum();

        if head_size > available {
            let dropped = ctx.messages.len() - head_len;
            ctx.messages.truncate(head_len);
            ctx.warn(
                Self::ID,
                format!(
                    "protected head ({head_size}) exceeds budget {available}; kept {head_len} head messages, dropped {dropped}"
                ),
            );
            return Ok(ProcessResult::Continue);
        }

        let mut remaining = available - head_size;
        let mut tail_start = ctx.messages.len();
        while tail_start > head_len && sizes[tail_start - 1] <= remaining {
            remaining -= sizes[tail_start - 1];
            tail_start -= 1;
        }

        let dropped = tail_start - head_len;
        ctx.messages.drain(head_len..tail_start);
        ctx.info(
            Self::ID,
            format!(
                "dropped {dropped} messages to fit {} of budget {budget} ({reserved} reserved for presets)",
                available - remaining
            ),
        );

        Ok(ProcessResult::Continue)
    }
}
