//! Property tests for the condition module
//!
//! Covers codec and grammar round trips, renderer determinism and the
//! structural guarantees of the tree editor.

use proptest::prelude::*;
use proptest::sample::Index;

use crate::condition::ast::{Combinator, Condition, NodeKind};
use crate::condition::codec::{decode, encode};
use crate::condition::editor::{NodePath, TreeEditor};
use crate::condition::parser::parse;
use crate::condition::render::render;
use crate::condition::validate::DSCP_MAX;

// ═══════════════════════════════════════════════════════════════════════════
// Strategy generators for property tests
// ═══════════════════════════════════════════════════════════════════════════

/// Generate well-formed IPv4 CIDR strings
fn cidr_strategy() -> impl Strategy<Value = String> {
    (any::<[u8; 4]>(), 0..=32u8)
        .prop_map(|(o, len)| format!("{}.{}.{}.{}/{}", o[0], o[1], o[2], o[3], len))
}

/// Generate complete, valid leaves
fn leaf_strategy() -> impl Strategy<Value = Condition> {
    prop_oneof![
        any::<bool>().prop_map(Condition::Bool),
        cidr_strategy().prop_map(Condition::source),
        cidr_strategy().prop_map(Condition::destination),
        (0..=DSCP_MAX).prop_map(Condition::dscp),
        (0..10_000u32).prop_map(Condition::class),
    ]
}

/// Generate complete condition trees up to four levels deep
fn condition_strategy() -> impl Strategy<Value = Condition> {
    leaf_strategy().prop_recursive(4, 48, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Condition::AllOf),
            prop::collection::vec(inner.clone(), 0..4).prop_map(Condition::AnyOf),
            inner.prop_map(Condition::not),
        ]
    })
}

/// Generate insertable node kinds
fn node_kind_strategy() -> impl Strategy<Value = NodeKind> {
    prop_oneof![
        Just(NodeKind::AllOf),
        Just(NodeKind::AnyOf),
        Just(NodeKind::Not),
        Just(NodeKind::Bool),
        Just(NodeKind::Source),
        Just(NodeKind::Destination),
        Just(NodeKind::Dscp),
        Just(NodeKind::Class),
    ]
}

fn combinator_strategy() -> impl Strategy<Value = Combinator> {
    prop_oneof![
        Just(Combinator::AllOf),
        Just(Combinator::AnyOf),
        Just(Combinator::Not),
    ]
}

/// Every node path in pre-order, root first
fn all_paths(cond: &Condition) -> Vec<NodePath> {
    fn walk(cond: &Condition, at: &mut NodePath, out: &mut Vec<NodePath>) {
        out.push(at.clone());
        for (i, child) in cond.children().iter().enumerate() {
            at.push(i);
            walk(child, at, out);
            at.pop();
        }
    }
    let mut out = Vec::new();
    walk(cond, &mut NodePath::new(), &mut out);
    out
}

// ═══════════════════════════════════════════════════════════════════════════
// Property Tests
// ═══════════════════════════════════════════════════════════════════════════

proptest! {
    /// decode(encode(t)) reconstructs t
    #[test]
    fn prop_codec_round_trip(tree in condition_strategy()) {
        let wire = encode(&tree).unwrap();
        let back = decode(&wire).unwrap();
        prop_assert_eq!(back, tree);
    }

    /// The canonical string of a complete tree parses back to the same tree
    #[test]
    fn prop_render_parse_round_trip(tree in condition_strategy()) {
        let text = render(&tree);
        let back = parse(&text);
        prop_assert!(back.is_ok(), "Failed to parse: {}", text);
        prop_assert_eq!(back.unwrap(), tree);
    }

    /// Rendering is deterministic
    #[test]
    fn prop_render_deterministic(tree in condition_strategy()) {
        prop_assert_eq!(render(&tree), render(&tree.clone()));
    }

    /// Insertion puts the new node first and shifts the existing children
    #[test]
    fn prop_insert_unshifts(
        children in prop::collection::vec(condition_strategy(), 0..5),
        kind in node_kind_strategy()
    ) {
        let mut root = Some(Condition::AnyOf(children.clone()));
        TreeEditor::new(&mut root).insert_leaf(&[], kind).unwrap();

        match root {
            Some(Condition::AnyOf(after)) => {
                prop_assert_eq!(after.len(), children.len() + 1);
                prop_assert_eq!(&after[0], &kind.instantiate());
                prop_assert_eq!(&after[1..], &children[..]);
            }
            other => prop_assert!(false, "Expected ANY root, got {:?}", other),
        }
    }

    /// Wrapping any node yields a combinator whose only child is that node,
    /// and leaves the rest of the tree alone
    #[test]
    fn prop_wrap_any_node(
        tree in condition_strategy(),
        pick in any::<Index>(),
        with in combinator_strategy()
    ) {
        let paths = all_paths(&tree);
        let path = pick.get(&paths).clone();
        let original = TreeEditor::new(&mut Some(tree.clone())).get(&path).unwrap().clone();

        let mut root = Some(tree.clone());
        let mut editor = TreeEditor::new(&mut root);
        editor.wrap(&path, with).unwrap();

        let wrapped = editor.get(&path).unwrap();
        prop_assert_eq!(wrapped.children(), std::slice::from_ref(&original));
        prop_assert_eq!(all_paths(editor.root().unwrap()).len(), paths.len() + 1);

        // Undo by replacing the wrapper with its child
        editor.replace(&path, original).unwrap();
        prop_assert_eq!(root, Some(tree));
    }

    /// Deleting a child shrinks its container by one and keeps order
    #[test]
    fn prop_delete_keeps_order(
        children in prop::collection::vec(condition_strategy(), 1..6),
        pick in any::<Index>()
    ) {
        let index = pick.index(children.len());
        let mut root = Some(Condition::AllOf(children.clone()));
        let removed = TreeEditor::new(&mut root).delete(&[], index).unwrap();

        let mut expected = children.clone();
        let expected_removed = expected.remove(index);
        prop_assert_eq!(removed, expected_removed);
        prop_assert_eq!(root, Some(Condition::AllOf(expected)));
    }
}
