use chat_core::{MessageContent, Role};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use uuid::Uuid;

use crate::structs::message::MessageNode;
use crate::structs::metadata::NodeMetadata;

/// A complete conversation: a tree of message nodes under one synthetic root.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ChatSession {
    pub id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// The single source of truth for all nodes in this session.
    pub nodes: HashMap<Uuid, MessageNode>,

    /// Synthetic origin node, never part of the sent history.
    pub root_node_id: Uuid,

    /// Tip of the branch that is currently in use.
    pub active_leaf_id: Uuid,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ChatSession {
    /// Create an empty session holding only its root node.
    pub fn new(id: Uuid) -> Self {
        let now = Utc::now();
        let root = MessageNode {
            id: Uuid::new_v4(),
            parent_id: None,
            role: Role::System,
            content: MessageContent::default(),
            enabled: true,
            created_at: now,
            metadata: NodeMetadata::default(),
        };
        let root_id = root.id;

        tracing::debug!(session_id = %id, root_id = %root_id, "ChatSession: created");

        Self {
            id,
            title: None,
            nodes: HashMap::from([(root_id, root)]),
            root_node_id: root_id,
            active_leaf_id: root_id,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn get(&self, id: Uuid) -> Option<&MessageNode> {
        self.nodes.get(&id)
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn root(&self) -> Option<&MessageNode> {
        self.nodes.get(&self.root_node_id)
    }

    pub fn active_leaf(&self) -> Option<&MessageNode> {
        self.nodes.get(&self.active_leaf_id)
    }

    /// Number of nodes, root included
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when the session holds nothing but its root
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// Direct children of `id`, oldest first.
    pub fn children_of(&self, id: Uuid) -> Vec<&MessageNode> {
        let mut children: Vec<&MessageNode> = self
            .nodes
            .values()
            .filter(|node| node.parent_id == Some(id))
            .collect();
        children.sort_by_key(|node| (node.created_at, node.id));
        children
    }

    /// Every node sharing `id`'s parent, `id` itself included, oldest first.
    ///
    /// The root has no siblings and yields only itself.
    pub fn siblings_of(&self, id: Uuid) -> Vec<&MessageNode> {
        match self.nodes.get(&id) {
            Some(node) => match node.parent_id {
                Some(parent_id) => self.children_of(parent_id),
                None => vec![node],
            },
            None => Vec::new(),
        }
    }

    /// Strictly increasing timestamp so sibling order never ties.
    pub(crate) fn next_timestamp(&self) -> DateTime<Utc> {
        let now = Utc::now();
        if now > self.updated_at {
            now
        } else {
            self.updated_at + chrono::Duration::nanoseconds(1)
        }
    }

    pub(crate) fn touch(&mut self) {
        self.updated_at = self.next_timestamp();
    }

    /// Check the tree invariants, reporting every violation found.
    ///
    /// An empty result means the session can be traversed and mutated safely.
    pub fn validate(&self) -> Vec<TreeIssue> {
        let mut issues = Vec::new();

        for (key, node) in &self.nodes {
            if *key != node.id {
                issues.push(TreeIssue::KeyMismatch { key: *key, node_id: node.id });
            }
        }

        match self.nodes.get(&self.root_node_id) {
            None => issues.push(TreeIssue::MissingRoot(self.root_node_id)),
            Some(root) if root.parent_id.is_some() => {
                issues.push(TreeIssue::RootHasParent(self.root_node_id))
            }
            Some(_) => {}
        }

        if !self.nodes.contains_key(&self.active_leaf_id) {
            issues.push(TreeIssue::ActiveLeafMissing(self.active_leaf_id));
        }

        let mut ids: Vec<&Uuid> = self.nodes.keys().collect();
        ids.sort();
        for id in ids {
            let node = &self.nodes[id];
            match node.parent_id {
                None if node.id != self.root_node_id => {
                    issues.push(TreeIssue::ExtraRoot(node.id));
                }
                Some(parent_id) if !self.nodes.contains_key(&parent_id) => {
                    issues.push(TreeIssue::DanglingParent {
                        node_id: node.id,
                        parent_id,
                    });
                }
                _ => {}
            }
            if self.has_cycle_from(node.id) {
                issues.push(TreeIssue::Cycle(node.id));
            }
        }

        issues
    }

    fn has_cycle_from(&self, start: Uuid) -> bool {
        let mut visited = HashSet::new();
        let mut cursor = Some(start);
        while let Some(id) = cursor {
            if !visited.insert(id) {
                return true;
            }
            cursor = self.nodes.get(&id).and_then(|node| node.parent_id);
        }
        false
    }
}

/// A violation of the message tree invariants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum TreeIssue {
    KeyMismatch { key: Uuid, node_id: Uuid },
    MissingRoot(Uuid),
    RootHasParent(Uuid),
    ExtraRoot(Uuid),
    ActiveLeafMissing(Uuid),
    DanglingParent { node_id: Uuid, parent_id: Uuid },
    Cycle(Uuid),
}

impl fmt::Display for TreeIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TreeIssue::KeyMismatch { key, node_id } => {
                write!(f, "node {node_id} is stored under key {key}")
            }
            TreeIssue::MissingRoot(id) => write!(f, "root node {id} is missing"),
            TreeIssue::RootHasParent(id) => write!(f, "root node {id} has a parent"),
            TreeIssue::ExtraRoot(id) => write!(f, "node {id} has no parent but is not the root"),
            TreeIssue::ActiveLeafMissing(id) => write!(f, "active leaf {id} does not exist"),
            TreeIssue::DanglingParent { node_id, parent_id } => {
                write!(f, "node {node_id} references missing parent {parent_id}")
            }
            TreeIssue::Cycle(id) => write!(f, "parent chain of node {id} contains a cycle"),
        }
    }
}
