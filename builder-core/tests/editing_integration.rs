//! Editing Integration Tests
//!
//! Exercises the editor session end to end:
//! - Building a tree from unattached nodes
//! - Non-detaching delete and dangling references
//! - Copy/cut/paste structure and id freshness
//! - Undo/redo over mixed command sequences
//! - Acyclicity under hostile moves and updates

use builder_core::{
    BuilderConfig, BuilderError, ComponentKind, ComponentNode, Document, EditorSession, Kind,
    NodeId, NodePatch,
};
use std::collections::HashSet;

/// Child ids of `id` as owned strings.
fn children(session: &EditorSession, id: &str) -> Vec<String> {
    session
        .document()
        .get(id)
        .map(|node| node.child_ids().into_iter().map(str::to_string).collect())
        .unwrap_or_default()
}

/// Structural fingerprint of a subtree: kinds and child layout, ignoring ids.
fn shape(document: &Document, id: &str) -> String {
    let Some(node) = document.get(id) else {
        return "?".to_string();
    };
    let inner: Vec<String> = node
        .child_ids()
        .into_iter()
        .map(|child| shape(document, child))
        .collect();
    format!("{}[{}]", node.kind, inner.join(","))
}

/// A page with a header row, a card slot and a nested list.
fn page() -> EditorSession {
    let document = Document::from_nodes(
        vec![
            ComponentNode::with_defaults("root", ComponentKind::Column)
                .with_children(["header", "card", "list"]),
            ComponentNode::with_defaults("header", ComponentKind::Row).with_children(["logo", "title"]),
            ComponentNode::with_defaults("logo", ComponentKind::Image),
            ComponentNode::with_defaults("title", ComponentKind::Text),
            ComponentNode::with_defaults("card", ComponentKind::Card)
                .with_prop("child", builder_core::PropValue::reference("body")),
            ComponentNode::with_defaults("body", ComponentKind::Column).with_children(["para"]),
            ComponentNode::with_defaults("para", ComponentKind::Text),
            ComponentNode::with_defaults("list", ComponentKind::Column).with_children(["item"]),
            ComponentNode::with_defaults("item", ComponentKind::Row).with_children(["label"]),
            ComponentNode::with_defaults("label", ComponentKind::Text),
        ],
        NodeId::from("root"),
    );
    EditorSession::with_document(document, BuilderConfig::default())
}

// ============================================================================
// Scenario Tests
// ============================================================================

#[test]
fn test_scenario_build_tree_from_unattached_node() {
    let mut session = EditorSession::default();
    assert!(children(&session, "root").is_empty());

    session
        .add_component(ComponentNode::with_defaults("T1", ComponentKind::Text))
        .expect("should add T1");
    session
        .update_component("root", NodePatch::new().children(["T1"]))
        .expect("should attach T1");

    assert!(children(&session, "root").contains(&"T1".to_string()));
    let t1 = session.document().get("T1").expect("T1 should exist");
    assert_eq!(t1.kind, Kind::Known(ComponentKind::Text));
}

#[test]
fn test_scenario_delete_leaves_parent_reference() {
    let mut session = EditorSession::default();
    session
        .add_component(ComponentNode::with_defaults("T1", ComponentKind::Text))
        .expect("should add T1");
    session
        .update_component("root", NodePatch::new().children(["T1"]))
        .expect("should attach T1");

    session.delete_components(["T1"]);

    assert!(session.document().get("T1").is_none());
    assert_eq!(children(&session, "root"), vec!["T1"]);
    assert_eq!(
        session.document().dangling_references(),
        vec![(NodeId::from("root"), "T1".to_string())]
    );
}

// ============================================================================
// Structural Properties
// ============================================================================

#[test]
fn test_delete_removes_every_descendant() {
    let mut session = page();
    let deleted = session.delete_components(["list", "card"]);
    let deleted: HashSet<&str> = deleted.iter().map(NodeId::as_str).collect();
    let expected: HashSet<&str> = ["list", "item", "label", "card", "body", "para"]
        .into_iter()
        .collect();
    assert_eq!(deleted, expected);
    for id in expected {
        assert!(!session.document().contains(id), "{id} should be gone");
    }
    assert_eq!(session.document().len(), 4);
}

#[test]
fn test_root_survives_delete() {
    let mut session = page();
    session.delete_components(["root"]);
    assert_eq!(session.document().len(), 10);
}

#[test]
fn test_hostile_edits_keep_tree_acyclic() {
    let mut session = page();

    let err = session
        .move_component("root", None, "item", None)
        .expect_err("root cannot move");
    assert!(matches!(err, BuilderError::InvalidTarget(_)));

    let err = session
        .move_component("list", Some("root"), "item", None)
        .expect_err("cannot move into own subtree");
    assert!(matches!(err, BuilderError::CycleDetected { .. }));

    let err = session
        .update_component("item", NodePatch::new().children(["label", "list"]))
        .expect_err("cannot reference an ancestor");
    assert!(matches!(err, BuilderError::CycleDetected { .. }));

    session.select(["header"]);
    session.cut();
    assert!(session.paste("logo").is_err());
    assert!(session.paste("title").is_err());

    session
        .move_component("item", Some("list"), "body", Some(0))
        .expect("should move");
    session.select(["body"]);
    session.copy();
    session.paste("list").expect("should paste");

    assert!(session.document().is_acyclic());
    assert_eq!(children(&session, "body"), vec!["item", "para"]);
}

#[test]
fn test_copy_paste_is_isomorphic_with_fresh_ids() {
    let mut session = page();
    let before: HashSet<String> = session.document().ids().map(ToString::to_string).collect();
    let original_shape = shape(session.document(), "card");

    session.select(["card"]);
    assert_eq!(session.copy(), 3);
    let pasted = session.paste("list").expect("should paste");
    assert_eq!(pasted.len(), 1);

    let copy_root = pasted[0].as_str();
    assert_eq!(shape(session.document(), copy_root), original_shape);

    let copied = session.document().subtree(copy_root);
    assert_eq!(copied.len(), 3);
    for id in &copied {
        assert!(!before.contains(id.as_str()), "{id} should be new");
    }
    assert_eq!(children(&session, "list"), vec!["item".to_string(), copy_root.to_string()]);
    assert_eq!(shape(session.document(), "card"), original_shape);
}

#[test]
fn test_pasting_twice_never_collides() {
    let mut session = page();
    session.select(["title"]);
    session.copy();
    let first = session.paste("header").expect("first paste");
    let second = session.paste("header").expect("second paste");
    assert_ne!(first, second);
    assert_eq!(children(&session, "header").len(), 4);
}

#[test]
fn test_cut_paste_conserves_nodes() {
    let mut session = page();
    let count = session.document().len();
    let original_shape = shape(session.document(), "header");

    session.select(["header", "logo"]);
    assert_eq!(session.cut(), 3);
    let pasted = session.paste("body").expect("should paste");

    assert_eq!(session.document().len(), count);
    assert!(!session.document().contains("header"));
    assert!(!children(&session, "root").contains(&"header".to_string()));
    assert_eq!(shape(session.document(), pasted[0].as_str()), original_shape);
    assert!(session.document().dangling_references().is_empty());
}

#[test]
fn test_duplicate_sibling() {
    let mut session = page();
    session.select(["item"]);
    let pasted = session.duplicate().expect("should duplicate");
    assert_eq!(children(&session, "list"), vec!["item".to_string(), pasted[0].to_string()]);
    assert_eq!(
        shape(session.document(), pasted[0].as_str()),
        shape(session.document(), "item")
    );
}

// ============================================================================
// History
// ============================================================================

#[test]
fn test_undo_redo_inverse() {
    let mut session = page();
    let initial = session.document().clone();

    session
        .add_component(ComponentNode::with_defaults("extra", ComponentKind::Button))
        .expect("should add");
    session
        .move_component("extra", None, "header", Some(0))
        .expect("should move");
    session
        .update_component("title", NodePatch::new().rename("heading"))
        .expect("should rename");
    session.delete_components(["list"]);
    session.select(["card"]);
    session.copy();
    session.paste("root").expect("should paste");
    let last = session.document().clone();

    let mut undone = 0;
    while session.undo() {
        undone += 1;
    }
    assert_eq!(undone, 5);
    assert_eq!(session.document(), &initial);

    let mut redone = 0;
    while session.redo() {
        redone += 1;
    }
    assert_eq!(redone, 5);
    assert_eq!(session.document(), &last);
}

#[test]
fn test_new_command_clears_redo() {
    let mut session = page();
    session.delete_components(["label"]);
    assert!(session.undo());
    assert!(session.can_redo());
    session.delete_components(["para"]);
    assert!(!session.can_redo());
    assert!(session.document().contains("label"));
}

#[test]
fn test_failed_commands_do_not_record() {
    let mut session = page();
    assert!(session.move_component("item", Some("list"), "label", None).is_err());
    assert!(session.update_component("title", NodePatch::new().rename("logo")).is_err());
    assert!(!session.can_undo());
}

#[test]
fn test_noop_commands_still_record() {
    let mut session = page();
    session
        .update_component("ghost", NodePatch::new().kind(ComponentKind::Row))
        .expect("no-op");
    session
        .move_component("ghost", None, "root", None)
        .expect("no-op");
    session.delete_components(["ghost"]);
    assert_eq!(session.history().undo_depth(), 3);
}

#[test]
fn test_long_sequence_fully_undoable_by_default() {
    let mut session = EditorSession::default();
    let initial = session.document().clone();
    for i in 0..150 {
        session
            .add_component(ComponentNode::with_defaults(format!("t{i}"), ComponentKind::Text))
            .expect("should add");
    }
    while session.undo() {}
    assert_eq!(session.document(), &initial);
    assert!(!session.document().contains("t0"));
}

#[test]
fn test_opt_in_history_depth_limit() {
    let config = BuilderConfig {
        history: builder_core::HistoryConfig { max_depth: 3 },
        ..BuilderConfig::default()
    };
    let mut session = EditorSession::new(config);
    for i in 0..6 {
        session
            .add_component(ComponentNode::with_defaults(format!("t{i}"), ComponentKind::Text))
            .expect("should add");
    }
    let mut undone = 0;
    while session.undo() {
        undone += 1;
    }
    assert_eq!(undone, 3);
    assert!(session.document().contains("t2"));
    assert!(!session.document().contains("t3"));
}
