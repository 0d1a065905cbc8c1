//! Structural edits on a live condition tree
//!
//! Nodes are addressed by [`NodePath`]: the child index at every level from
//! the root, where the operand of a `Not` is index 0. Edits rebuild the
//! subtree at the target slot and put it back in place, so a failed edit
//! never leaves a partially modified tree.

use crate::condition::ast::{ClassId, Combinator, Condition, Ipv4Predicate, NodeKind, Tag};
use crate::condition::validate::{parse_cidr, parse_dscp};
use crate::error::{ClassError, Result};
use smallvec::SmallVec;

/// Child indices from the root to a node
pub type NodePath = SmallVec<[usize; 8]>;

/// New value for a leaf node, as typed into a leaf editor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeafEdit {
    Source(String),
    Destination(String),
    /// `0x`-prefixed hex text
    Dscp(String),
    Class(Option<ClassId>),
    Bool(bool),
}

impl LeafEdit {
    fn expected(&self) -> &'static str {
        match self {
            LeafEdit::Source(_) => Tag::MatchSource.as_str(),
            LeafEdit::Destination(_) => Tag::MatchDestination.as_str(),
            LeafEdit::Dscp(_) => Tag::MatchDscp.as_str(),
            LeafEdit::Class(_) => Tag::CondClass.as_str(),
            LeafEdit::Bool(_) => Tag::CondBool.as_str(),
        }
    }
}

/// Editor over a borrowed root slot
pub struct TreeEditor<'a> {
    root: &'a mut Option<Condition>,
}

impl<'a> TreeEditor<'a> {
    pub fn new(root: &'a mut Option<Condition>) -> Self {
        Self { root }
    }

    pub fn root(&self) -> Option<&Condition> {
        self.root.as_ref()
    }

    /// Node at `path`
    pub fn get(&self, path: &[usize]) -> Result<&Condition> {
        let mut node = self
            .root
            .as_ref()
            .ok_or_else(|| path_error(path, "tree is empty"))?;
        for (depth, &index) in path.iter().enumerate() {
            node = child(node, index).ok_or_else(|| path_error(&path[..=depth], "no such node"))?;
        }
        Ok(node)
    }

    fn get_mut(&mut self, path: &[usize]) -> Result<&mut Condition> {
        let mut node = self
            .root
            .as_mut()
            .ok_or_else(|| path_error(path, "tree is empty"))?;
        for (depth, &index) in path.iter().enumerate() {
            node = child_mut(node, index)
                .ok_or_else(|| path_error(&path[..=depth], "no such node"))?;
        }
        Ok(node)
    }

    /// Replace the node at `path` with `with` wrapping it
    pub fn wrap(&mut self, path: &[usize], with: Combinator) -> Result<()> {
        let slot = self.get_mut(path)?;
        let node = std::mem::replace(slot, Condition::Bool(false));
        *slot = with.wrap(node);
        Ok(())
    }

    /// Replace the node at `path`, returning the previous one.
    /// The empty path on an empty tree sets the root.
    pub fn replace(&mut self, path: &[usize], node: Condition) -> Result<Option<Condition>> {
        if path.is_empty() {
            return Ok(self.root.replace(node));
        }
        let slot = self.get_mut(path)?;
        Ok(Some(std::mem::replace(slot, node)))
    }

    /// Insert a default node of `kind` into `container`.
    ///
    /// `AllOf`/`AnyOf` containers receive it at the front. A `Not` receives it
    /// as operand if it has none. An empty tree takes it as root.
    pub fn insert_leaf(&mut self, container: &[usize], kind: NodeKind) -> Result<()> {
        let node = kind.instantiate();
        if container.is_empty() && self.root.is_none() {
            *self.root = Some(node);
            return Ok(());
        }
        match self.get_mut(container)? {
            Condition::AllOf(conds) | Condition::AnyOf(conds) => {
                conds.insert(0, node);
                Ok(())
            }
            Condition::Not(operand @ None) => {
                *operand = Some(Box::new(node));
                Ok(())
            }
            Condition::Not(Some(_)) => Err(ClassError::OperandOccupied),
            other => Err(ClassError::NotAContainer(other.tag())),
        }
    }

    /// Remove child `index` of `container`, returning it.
    ///
    /// For a `Not` the operand (index 0) is cleared and the `Not` stays.
    pub fn delete(&mut self, container: &[usize], index: usize) -> Result<Condition> {
        match self.get_mut(container)? {
            Condition::AllOf(conds) | Condition::AnyOf(conds) => {
                if index >= conds.len() {
                    return Err(ClassError::IndexOutOfRange {
                        index,
                        len: conds.len(),
                    });
                }
                Ok(conds.remove(index))
            }
            Condition::Not(operand) => {
                let len = usize::from(operand.is_some());
                match (index, operand.take()) {
                    (0, Some(removed)) => Ok(*removed),
                    (_, previous) => {
                        *operand = previous;
                        Err(ClassError::IndexOutOfRange { index, len })
                    }
                }
            }
            other => Err(ClassError::NotAContainer(other.tag())),
        }
    }

    /// Clear the whole tree
    pub fn delete_root(&mut self) -> Option<Condition> {
        self.root.take()
    }

    /// Set the value of the leaf at `path`.
    ///
    /// The value is validated first; on failure the leaf keeps its old value.
    pub fn edit_leaf(&mut self, path: &[usize], edit: LeafEdit) -> Result<()> {
        let node = self.get_mut(path)?;
        let expected = edit.expected();
        match (node, edit) {
            (Condition::Ipv4Match(Ipv4Predicate::MatchSource(net)), LeafEdit::Source(text))
            | (
                Condition::Ipv4Match(Ipv4Predicate::MatchDestination(net)),
                LeafEdit::Destination(text),
            ) => {
                parse_cidr(&text)?;
                *net = text;
            }
            (Condition::Ipv4Match(Ipv4Predicate::MatchDscp(dscp)), LeafEdit::Dscp(text)) => {
                *dscp = Some(parse_dscp(&text)?);
            }
            (Condition::ClassMatch(id), LeafEdit::Class(value)) => *id = value,
            (Condition::Bool(current), LeafEdit::Bool(value)) => *current = value,
            (node, _) => {
                let found = match node {
                    Condition::Ipv4Match(predicate) => predicate.tag(),
                    other => other.tag(),
                };
                return Err(ClassError::LeafMismatch { expected, found });
            }
        }
        Ok(())
    }
}

fn child(node: &Condition, index: usize) -> Option<&Condition> {
    match node {
        Condition::AllOf(conds) | Condition::AnyOf(conds) => conds.get(index),
        Condition::Not(Some(operand)) if index == 0 => Some(&**operand),
        _ => None,
    }
}

fn child_mut(node: &mut Condition, index: usize) -> Option<&mut Condition> {
    match node {
        Condition::AllOf(conds) | Condition::AnyOf(conds) => conds.get_mut(index),
        Condition::Not(Some(operand)) if index == 0 => Some(&mut **operand),
        _ => None,
    }
}

fn path_error(path: &[usize], reason: &str) -> ClassError {
    ClassError::InvalidPath(format!("{:?}: {}", path, reason))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::render::render;
    use smallvec::smallvec;

    fn sample() -> Option<Condition> {
        Some(Condition::all_of([
            Condition::source("10.0.0.0/8"),
            Condition::not(Condition::class(2)),
        ]))
    }

    #[test]
    fn test_get_follows_not_operand() {
        let mut root = sample();
        let editor = TreeEditor::new(&mut root);
        let path: NodePath = smallvec![1, 0];
        assert_eq!(editor.get(&path).unwrap(), &Condition::class(2));
        assert!(editor.get(&[1, 1]).is_err());
        assert!(editor.get(&[0, 0]).is_err());
    }

    #[test]
    fn test_wrap_leaf_in_any() {
        let mut root = sample();
        let mut editor = TreeEditor::new(&mut root);
        editor.wrap(&[0], Combinator::AnyOf).unwrap();
        assert_eq!(
            editor.get(&[0]).unwrap(),
            &Condition::any_of([Condition::source("10.0.0.0/8")])
        );
        assert_eq!(render(editor.root().unwrap()), "ALL(ANY(src=10.0.0.0/8),NOT(cls=2))");
    }

    #[test]
    fn test_wrap_root_in_not() {
        let mut root = Some(Condition::Bool(true));
        TreeEditor::new(&mut root).wrap(&[], Combinator::Not).unwrap();
        assert_eq!(root, Some(Condition::not(Condition::Bool(true))));
    }

    #[test]
    fn test_insert_unshifts() {
        let mut root = sample();
        let mut editor = TreeEditor::new(&mut root);
        editor.insert_leaf(&[], NodeKind::Dscp).unwrap();
        assert_eq!(
            render(editor.root().unwrap()),
            "ALL(dscp=,src=10.0.0.0/8,NOT(cls=2))"
        );
        editor.insert_leaf(&[], NodeKind::AnyOf).unwrap();
        assert_eq!(editor.get(&[0]).unwrap(), &Condition::any_of([]));
        assert_eq!(editor.get(&[2]).unwrap(), &Condition::source("10.0.0.0/8"));
    }

    #[test]
    fn test_insert_into_not_and_empty_root() {
        let mut root = None;
        let mut editor = TreeEditor::new(&mut root);
        editor.insert_leaf(&[], NodeKind::Not).unwrap();
        editor.insert_leaf(&[], NodeKind::Class).unwrap();
        assert!(matches!(
            editor.insert_leaf(&[], NodeKind::Bool),
            Err(ClassError::OperandOccupied)
        ));
        assert_eq!(root, Some(Condition::not(Condition::ClassMatch(None))));
    }

    #[test]
    fn test_insert_into_leaf_fails() {
        let mut root = sample();
        let mut editor = TreeEditor::new(&mut root);
        assert!(matches!(
            editor.insert_leaf(&[0], NodeKind::Bool),
            Err(ClassError::NotAContainer(Tag::CondIpv4))
        ));
    }

    #[test]
    fn test_delete_child_and_not_operand() {
        let mut root = sample();
        let mut editor = TreeEditor::new(&mut root);
        assert_eq!(editor.delete(&[1], 0).unwrap(), Condition::class(2));
        assert_eq!(editor.get(&[1]).unwrap(), &Condition::Not(None));
        assert!(matches!(
            editor.delete(&[1], 0),
            Err(ClassError::IndexOutOfRange { index: 0, len: 0 })
        ));
        assert_eq!(editor.delete(&[], 0).unwrap(), Condition::source("10.0.0.0/8"));
        assert!(matches!(
            editor.delete(&[], 5),
            Err(ClassError::IndexOutOfRange { index: 5, len: 1 })
        ));
        assert!(editor.delete_root().is_some());
        assert!(editor.root().is_none());
    }

    #[test]
    fn test_delete_wrong_not_index_keeps_operand() {
        let mut root = Some(Condition::not(Condition::Bool(true)));
        let mut editor = TreeEditor::new(&mut root);
        assert!(editor.delete(&[], 1).is_err());
        assert_eq!(root, Some(Condition::not(Condition::Bool(true))));
    }

    #[test]
    fn test_replace() {
        let mut root = sample();
        let mut editor = TreeEditor::new(&mut root);
        let old = editor.replace(&[1, 0], Condition::Bool(false)).unwrap();
        assert_eq!(old, Some(Condition::class(2)));
        assert_eq!(render(editor.root().unwrap()), "ALL(src=10.0.0.0/8,NOT(false))");
    }

    #[test]
    fn test_edit_leaf_validates() {
        let mut root = Some(Condition::all_of([
            NodeKind::Dscp.instantiate(),
            NodeKind::Destination.instantiate(),
        ]));
        let mut editor = TreeEditor::new(&mut root);

        assert!(editor.edit_leaf(&[0], LeafEdit::Dscp("64".into())).is_err());
        assert!(editor.edit_leaf(&[0], LeafEdit::Dscp("0x41".into())).is_err());
        editor.edit_leaf(&[0], LeafEdit::Dscp("0x10".into())).unwrap();

        assert!(editor
            .edit_leaf(&[1], LeafEdit::Destination("192.168.0.0".into()))
            .is_err());
        assert_eq!(render(editor.root().unwrap()), "ALL(dscp=0x10,dst=)");
        editor
            .edit_leaf(&[1], LeafEdit::Destination("192.168.0.0/24".into()))
            .unwrap();
        assert_eq!(
            render(editor.root().unwrap()),
            "ALL(dscp=0x10,dst=192.168.0.0/24)"
        );
    }

    #[test]
    fn test_edit_leaf_mismatch() {
        let mut root = Some(Condition::dscp(1));
        let mut editor = TreeEditor::new(&mut root);
        match editor.edit_leaf(&[], LeafEdit::Source("10.0.0.0/8".into())) {
            Err(ClassError::LeafMismatch { expected, found }) => {
                assert_eq!(expected, "MatchSource");
                assert_eq!(found, Tag::MatchDscp);
            }
            other => panic!("Expected leaf mismatch, got {:?}", other),
        }
    }
}
