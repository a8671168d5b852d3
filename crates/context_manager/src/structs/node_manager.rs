//! Tree mutations. Every operation returns the resulting `active_leaf_id`.

use chat_core::MessageContent;
use std::collections::{HashMap, HashSet, VecDeque};
use uuid::Uuid;

use crate::error::TreeError;
use crate::structs::message::NodeDraft;
use crate::structs::metadata::NodeMetadata;
use crate::structs::session::ChatSession;

impl ChatSession {
    /// Add `draft` under `parent_id` and make it the active leaf.
    pub fn append_child(&mut self, parent_id: Uuid, draft: NodeDraft) -> Result<Uuid, TreeError> {
        if !self.nodes.contains_key(&parent_id) {
            return Err(TreeError::NodeNotFound(parent_id));
        }

        let created_at = self.next_timestamp();
        let node = draft.into_node(parent_id, created_at);
        let node_id = node.id;

        tracing::info!(
            session_id = %self.id,
            node_id = %node_id,
            parent_id = %parent_id,
            role = %node.role,
            "ChatSession: appending node"
        );

        self.nodes.insert(node_id, node);
        self.active_leaf_id = node_id;
        self.updated_at = created_at;
        Ok(node_id)
    }

    /// Create an edited copy of `node_id` as a new sibling and switch to it.
    ///
    /// The original node and its descendants are left untouched so the old
    /// branch can be switched back to later.
    pub fn edit_as_branch(
        &mut self,
        node_id: Uuid,
        new_content: impl Into<MessageContent>,
    ) -> Result<Uuid, TreeError> {
        let original = self.nodes.get(&node_id).ok_or(TreeError::NodeNotFound(node_id))?;
        if node_id == self.root_node_id {
            return Err(TreeError::RootImmutable(node_id));
        }
        let parent_id = original.parent_id.ok_or(TreeError::Detached(node_id))?;

        let draft = NodeDraft {
            role: original.role,
            content: new_content.into(),
            metadata: NodeMetadata {
                edited_from: Some(node_id),
                ..NodeMetadata::default()
            },
        };

        tracing::info!(
            session_id = %self.id,
            edited_from = %node_id,
            parent_id = %parent_id,
            "ChatSession: editing node as new branch"
        );

        self.append_child(parent_id, draft)
    }

    /// Flip the soft-delete flag. The tree shape and active leaf are unchanged.
    pub fn toggle_enabled(&mut self, node_id: Uuid, enabled: bool) -> Result<Uuid, TreeError> {
        if node_id == self.root_node_id {
            return Err(TreeError::RootImmutable(node_id));
        }
        let node = self.nodes.get_mut(&node_id).ok_or(TreeError::NodeNotFound(node_id))?;
        node.enabled = enabled;

        tracing::debug!(session_id = %self.id, node_id = %node_id, enabled, "ChatSession: toggled node");

        self.touch();
        Ok(self.active_leaf_id)
    }

    /// Remove `node_id` and every descendant.
    ///
    /// When the active leaf is removed it moves to the nearest surviving
    /// enabled ancestor, or the root when none survives. On a looping parent
    /// chain every ancestor may be inside the removed subtree.
    pub fn delete_subtree(&mut self, node_id: Uuid) -> Result<Uuid, TreeError> {
        if node_id == self.root_node_id {
            return Err(TreeError::RootImmutable(node_id));
        }
        if !self.nodes.contains_key(&node_id) {
            return Err(TreeError::NodeNotFound(node_id));
        }

        let removed = self.collect_subtree(node_id);

        if removed.contains(&self.active_leaf_id) {
            let (ancestors, _) = self.walk_to_root(node_id);
            let fallback = ancestors
                .iter()
                .skip(1)
                .find(|node| node.enabled && !removed.contains(&node.id))
                .map(|node| node.id)
                .unwrap_or(self.root_node_id);
            self.active_leaf_id = fallback;
        }

        for id in &removed {
            self.nodes.remove(id);
        }

        tracing::info!(
            session_id = %self.id,
            node_id = %node_id,
            removed = removed.len(),
            active_leaf_id = %self.active_leaf_id,
            "ChatSession: deleted subtree"
        );

        self.touch();
        Ok(self.active_leaf_id)
    }

    /// Point the active leaf at an existing node.
    pub fn switch_active_leaf(&mut self, node_id: Uuid) -> Result<Uuid, TreeError> {
        if !self.nodes.contains_key(&node_id) {
            return Err(TreeError::NodeNotFound(node_id));
        }

        tracing::debug!(
            session_id = %self.id,
            from = %self.active_leaf_id,
            to = %node_id,
            "ChatSession: switching active leaf"
        );

        self.active_leaf_id = node_id;
        Ok(node_id)
    }

    /// Follow the newest child from `node_id` down to a leaf.
    ///
    /// Used to resume a sibling branch at its most recent turn.
    pub fn latest_leaf_of(&self, node_id: Uuid) -> Result<Uuid, TreeError> {
        if !self.nodes.contains_key(&node_id) {
            return Err(TreeError::NodeNotFound(node_id));
        }

        let mut visited = HashSet::new();
        let mut cursor = node_id;
        while visited.insert(cursor) {
            match self.children_of(cursor).last() {
                Some(child) => cursor = child.id,
                None => break,
            }
        }
        Ok(cursor)
    }

    fn collect_subtree(&self, node_id: Uuid) -> HashSet<Uuid> {
        let mut children: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
        for node in self.nodes.values() {
            if let Some(parent_id) = node.parent_id {
                children.entry(parent_id).or_default().push(node.id);
            }
        }

        let mut removed = HashSet::new();
        let mut queue = VecDeque::from([node_id]);
        while let Some(id) = queue.pop_front() {
            if !removed.insert(id) {
                continue;
            }
            if let Some(kids) = children.get(&id) {
                queue.extend(kids.iter().copied());
            }
        }
        removed
    }
}
