//! Session Loader Processor
//!
//! Seeds the context with the enabled messages of the active branch.

use async_trait::async_trait;

use crate::pipeline::context::PipelineContext;
use crate::pipeline::error::ProcessError;
use crate::pipeline::message::ProcessableMessage;
use crate::pipeline::result::ProcessResult;
use crate::pipeline::traits::ContextProcessor;

use super::SESSION_LOADER_PRIORITY;

/// Session Loader Processor
///
/// Replaces `messages` with the branch ending at the active leaf (or the
/// context's leaf override). Disabled nodes and text-only nodes with blank
/// text are skipped; images and tool parts keep a node in.
pub struct SessionLoaderProcessor;

impl SessionLoaderProcessor {
    pub const ID: &'static str = "session_loader";

    pub fn new() -> Self {
        Self
    }
}

impl Default for SessionLoaderProcessor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContextProcessor for SessionLoaderProcessor {
    fn id(&self) -> &str {
        Self::ID
    }

    fn priority(&self) -> i32 {
        SESSION_LOADER_PRIORITY
    }

    async fn execute<'a>(&self, ctx: &mut PipelineContext<'a>) -> Result<ProcessResult, ProcessError> {
        let Some(session) = ctx.session else {
            ctx.warn(Self::ID, "no session in context, messages left untouched");
            return Ok(ProcessResult::Halt {
                reason: "missing session".to_string(),
            });
        };

        let path = match ctx.leaf_override {
            Some(leaf) => session.branch_path(leaf),
            None => session.active_path(),
        };

        if let Some(issue) = &path.issue {
            ctx.warn(Self::ID, format!("branch path is incomplete: {issue}"));
        }

        let mut skipped_blank = 0usize;
        let mut messages = Vec::with_capacity(path.nodes.len());
        for node in &path.nodes {
            if node.content.is_blank_text() {
                skipped_blank += 1;
                continue;
            }
            messages.push(ProcessableMessage::from_node(node));
        }

        ctx.messages = messages;
        ctx.debug(
            Self::ID,
            format!(
                "loaded {} messages from session {} ({} blank skipped)",
                ctx.messages.len(),
                session.id,
                skipped_blank
            ),
        );

        Ok(ProcessResult::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::message::SourceType;
    use crate::structs::message::NodeDraft;
    use crate::structs::session::ChatSession;
    use chat_core::{ContentPart, MessageContent, Role};
    use uuid::Uuid;

    #[tokio::test]
    async fn test_loads_active_branch_in_order() {
        let mut session = ChatSession::new(Uuid::new_v4());
        let root = session.root_node_id;
        let a = session.append_child(root, NodeDraft::user("hello")).unwrap();
        let b = session.append_child(a, NodeDraft::assistant("hi")).unwrap();

        let mut ctx = PipelineContext::new(&session);
        let result = SessionLoaderProcessor::new().execute(&mut ctx).await.unwrap();

        assert_eq!(result, ProcessResult::Continue);
        let ids: Vec<_> = ctx.messages.iter().map(|m| m.source_node_id).collect();
        assert_eq!(ids, vec![Some(a), Some(b)]);
        assert!(ctx
            .messages
            .iter()
            .all(|m| m.source_type == SourceType::SessionHistory));
    }

    #[tokio::test]
    async fn test_skips_blank_text_but_keeps_images() {
        let mut session = ChatSession::new(Uuid::new_v4());
        let root = session.root_node_id;
        let blank = session.append_child(root, NodeDraft::user("   ")).unwrap();
        let image = session
            .append_child(
                blank,
                NodeDraft::new(
                    Role::User,
                    MessageContent::Parts(vec![ContentPart::image_url("https://example.com/cat.png")]),
                ),
            )
            .unwrap();

        let mut ctx = PipelineContext::new(&session);
        SessionLoaderProcessor::new().execute(&mut ctx).await.unwrap();

        assert_eq!(ctx.messages.len(), 1);
        assert_eq!(ctx.messages[0].source_node_id, Some(image));
    }

    #[tokio::test]
    async fn test_leaf_override_loads_other_branch() {
        let mut session = ChatSession::new(Uuid::new_v4());
        let root = session.root_node_id;
        let a = session.append_child(root, NodeDraft::user("first")).unwrap();
        let b = session.append_child(root, NodeDraft::user("second")).unwrap();
        assert_eq!(session.active_leaf_id, b);

        let mut ctx = PipelineContext::new(&session).with_leaf(a);
        SessionLoaderProcessor::new().execute(&mut ctx).await.unwrap();

        assert_eq!(ctx.messages.len(), 1);
        assert_eq!(ctx.messages[0].text_content(), "first");
    }

    #[tokio::test]
    async fn test_missing_session_halts() {
        let mut ctx = PipelineContext::empty();
        ctx.messages.push(ProcessableMessage::text(Role::User, "kept"));

        let result = SessionLoaderProcessor::new().execute(&mut ctx).await.unwrap();

        assert!(matches!(result, ProcessResult::Halt { .. }));
        assert_eq!(ctx.messages.len(), 1);
        assert_eq!(ctx.logs.len(), 1);
    }
}
