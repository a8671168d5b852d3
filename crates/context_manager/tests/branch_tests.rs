//! Tests for message tree mutation and branch navigation

use context_manager::{ChatSession, NodeDraft, PathIssue, TreeError};
use uuid::Uuid;

fn texts(session: &ChatSession, from: Uuid) -> Vec<String> {
    session
        .branch_path(from)
        .nodes
        .iter()
        .map(|node| node.content.as_text())
        .collect()
}

#[test]
fn test_edit_as_branch_keeps_old_branch_reachable() {
    let mut session = ChatSession::new(Uuid::new_v4());
    let root = session.root_node_id;
    let a = session.append_child(root, NodeDraft::user("hi")).unwrap();
    let b = session.append_child(a, NodeDraft::assistant("hello")).unwrap();

    let a2 = session.edit_as_branch(a, "hi there").unwrap();

    assert_eq!(session.active_leaf_id, a2);
    assert_eq!(session.get(a2).unwrap().parent_id, Some(root));
    assert_eq!(session.get(a2).unwrap().metadata.edited_from, Some(a));
    assert_eq!(texts(&session, b), vec!["hi", "hello"]);
    assert_eq!(texts(&session, a2), vec!["hi there"]);

    // source untouched
    assert_eq!(session.get(a).unwrap().content.as_text(), "hi");
    let siblings: Vec<Uuid> = session.siblings_of(a).iter().map(|n| n.id).collect();
    assert_eq!(siblings, vec![a, a2]);
}

#[test]
fn test_switch_back_to_old_branch() {
    let mut session = ChatSession::new(Uuid::new_v4());
    let root = session.root_node_id;
    let a = session.append_child(root, NodeDraft::user("hi")).unwrap();
    let b = session.append_child(a, NodeDraft::assistant("hello")).unwrap();
    session.edit_as_branch(a, "hi there").unwrap();

    let leaf = session.latest_leaf_of(a).unwrap();
    assert_eq!(leaf, b);
    session.switch_active_leaf(leaf).unwrap();

    assert_eq!(session.active_path().ids(), vec![a, b]);
}

#[test]
fn test_walk_terminates_on_cycle() {
    let mut session = ChatSession::new(Uuid::new_v4());
    let root = session.root_node_id;
    let a = session.append_child(root, NodeDraft::user("a")).unwrap();
    let b = session.append_child(a, NodeDraft::assistant("b")).unwrap();
    session.nodes.get_mut(&a).unwrap().parent_id = Some(b);

    let path = session.active_path();

    assert!(matches!(path.issue, Some(PathIssue::Cycle(_))));
    let ids = path.ids();
    let unique: std::collections::HashSet<_> = ids.iter().collect();
    assert_eq!(ids.len(), unique.len());
    assert!(!ids.contains(&root));
}

#[test]
fn test_dangling_parent_returns_partial_path() {
    let mut session = ChatSession::new(Uuid::new_v4());
    let root = session.root_node_id;
    let a = session.append_child(root, NodeDraft::user("a")).unwrap();
    let b = session.append_child(a, NodeDraft::assistant("b")).unwrap();
    session.nodes.remove(&a);

    let path = session.active_path();

    assert_eq!(path.ids(), vec![b]);
    assert!(!path.is_complete());
    assert!(!session.validate().is_empty());
}

#[test]
fn test_disabled_nodes_keep_continuity() {
    let mut session = ChatSession::new(Uuid::new_v4());
    let root = session.root_node_id;
    let a = session.append_child(root, NodeDraft::user("a")).unwrap();
    let b = session.append_child(a, NodeDraft::assistant("b")).unwrap();
    let c = session.append_child(b, NodeDraft::user("c")).unwrap();

    session.toggle_enabled(b, false).unwrap();

    assert_eq!(session.active_path().ids(), vec![a, c]);
    assert!(session.active_path().is_complete());
}

#[test]
fn test_delete_subtree_moves_active_leaf_up() {
    let mut session = ChatSession::new(Uuid::new_v4());
    let root = session.root_node_id;
    let a = session.append_child(root, NodeDraft::user("a")).unwrap();
    let b = session.append_child(a, NodeDraft::assistant("b")).unwrap();
    session.append_child(b, NodeDraft::user("c")).unwrap();

    let leaf = session.delete_subtree(b).unwrap();

    assert_eq!(leaf, a);
    assert_eq!(session.len(), 2);
    assert!(session.validate().is_empty());
}

#[test]
fn test_root_is_immutable() {
    let mut session = ChatSession::new(Uuid::new_v4());
    let root = session.root_node_id;

    assert_eq!(session.edit_as_branch(root, "x"), Err(TreeError::RootImmutable(root)));
    assert_eq!(session.delete_subtree(root), Err(TreeError::RootImmutable(root)));
    assert_eq!(session.toggle_enabled(root, false), Err(TreeError::RootImmutable(root)));
}

#[test]
fn test_session_survives_json_snapshot() {
    let mut session = ChatSession::new(Uuid::new_v4()).with_title("snapshot");
    let root = session.root_node_id;
    let a = session.append_child(root, NodeDraft::user("hi")).unwrap();
    session.append_child(a, NodeDraft::assistant("hello")).unwrap();

    let json = serde_json::to_string(&session).unwrap();
    let restored: ChatSession = serde_json::from_str(&json).unwrap();

    assert_eq!(restored.active_path().ids(), session.active_path().ids());
    assert!(restored.validate().is_empty());
}
