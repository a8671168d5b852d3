//! Branch navigation: the linear history from the root to a node.

use std::collections::HashSet;
use std::fmt;
use uuid::Uuid;

use crate::structs::message::MessageNode;
use crate::structs::session::ChatSession;

/// Ordered history from the root (exclusive) to a node (inclusive).
#[derive(Debug, Clone)]
pub struct BranchPath<'a> {
    /// Enabled nodes, oldest first
    pub nodes: Vec<&'a MessageNode>,
    /// Set when the walk stopped early on a corrupt tree
    pub issue: Option<PathIssue>,
}

impl<'a> BranchPath<'a> {
    pub fn ids(&self) -> Vec<Uuid> {
        self.nodes.iter().map(|node| node.id).collect()
    }

    pub fn is_complete(&self) -> bool {
        self.issue.is_none()
    }
}

/// Why a walk towards the root stopped before reaching it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathIssue {
    UnknownStart(Uuid),
    DanglingParent { node_id: Uuid, missing_parent: Uuid },
    Detached(Uuid),
    Cycle(Uuid),
}

impl fmt::Display for PathIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathIssue::UnknownStart(id) => write!(f, "start node {id} is not in the session"),
            PathIssue::DanglingParent { node_id, missing_parent } => write!(
                f,
                "node {node_id} references missing parent {missing_parent}; history truncated"
            ),
            PathIssue::Detached(id) => {
                write!(f, "node {id} has no parent but is not the root; history truncated")
            }
            PathIssue::Cycle(id) => write!(f, "parent chain loops back to node {id}; history truncated"),
        }
    }
}

impl ChatSession {
    /// Path for the active leaf.
    pub fn active_path(&self) -> BranchPath<'_> {
        self.branch_path(self.active_leaf_id)
    }

    /// Walk parent links from `from` to the root and return the enabled nodes
    /// in conversation order.
    ///
    /// Disabled nodes contribute nothing but their parent link is still
    /// followed. A dangling link, detached node or cycle stops the walk; what
    /// was collected so far is returned together with the issue.
    pub fn branch_path(&self, from: Uuid) -> BranchPath<'_> {
        let (chain, issue) = self.walk_to_root(from);

        if let Some(issue) = &issue {
            tracing::warn!(session_id = %self.id, start = %from, %issue, "ChatSession: corrupt branch path");
        }

        let mut nodes: Vec<&MessageNode> = chain.into_iter().filter(|node| node.enabled).collect();
        nodes.reverse();

        BranchPath { nodes, issue }
    }

    /// Raw ancestor chain from `from` upwards, disabled nodes included,
    /// root excluded. Iterative with a visited guard.
    pub(crate) fn walk_to_root(&self, from: Uuid) -> (Vec<&MessageNode>, Option<PathIssue>) {
        let mut chain = Vec::new();

        if !self.nodes.contains_key(&from) {
            return (chain, Some(PathIssue::UnknownStart(from)));
        }

        let mut visited = HashSet::new();
        let mut child: Option<Uuid> = None;
        let mut cursor = from;

        loop {
            if cursor == self.root_node_id {
                return (chain, None);
            }
            if !visited.insert(cursor) {
                return (chain, Some(PathIssue::Cycle(cursor)));
            }
            let Some(node) = self.nodes.get(&cursor) else {
                // Only reachable through a parent link; the start was checked above.
                let node_id = child.unwrap_or(from);
                return (
                    chain,
                    Some(PathIssue::DanglingParent { node_id, missing_parent: cursor }),
                );
            };
            chain.push(node);
            match node.parent_id {
                Some(parent_id) => {
                    child = Some(node.id);
                    cursor = parent_id;
                }
                None => return (chain, Some(PathIssue::Detached(node.id))),
            }
        }
    }
}
