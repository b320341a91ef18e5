//! # Document Tree
//!
//! Arena-backed ownership tree.
//!
//! Every node lives in the tree's arena and is addressed by [`NodeId`].
//! A node is either attached (its ancestor chain reaches the root), detached
//! (created or moved out, waiting to be attached somewhere) or removed (its
//! slot is gone and the id no longer resolves).
//!
//! ## Invariants
//!
//! - A node appears in at most one parent's child list, and its `parent`
//!   link points back at that parent.
//! - No cycles: a node is never attached under itself or a descendant.
//! - Removing a node destroys its whole subtree in one step.

use crate::error::{TreeError, TreeResult};
use crate::modifier::Modifiers;
use crate::node::{NodeId, NodeKind, NodeTraits};
use std::cmp::Ordering;
use tracing::warn;

/// Storage for one node.
#[derive(Debug, Clone)]
pub struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    modifiers: Modifiers,
}

impl NodeData {
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn modifiers(&self) -> &Modifiers {
        &self.modifiers
    }

    pub fn traits(&self) -> NodeTraits {
        self.kind.traits()
    }

    pub fn is_tangible(&self) -> bool {
        self.traits().contains(NodeTraits::TANGIBLE)
    }

    pub fn is_atomic(&self) -> bool {
        self.traits().contains(NodeTraits::ATOMIC)
    }

    pub fn is_container(&self) -> bool {
        self.traits().contains(NodeTraits::CONTAINER)
    }

    pub fn is_inline(&self) -> bool {
        self.traits().contains(NodeTraits::INLINE)
    }
}

/// The document tree.
///
/// Slots of removed nodes are not reclaimed: the arena grows with every
/// created node for the lifetime of the tree.
#[derive(Debug, Clone)]
pub struct Tree {
    nodes: Vec<Option<NodeData>>,
    root: NodeId,
    live: usize,
    next_id: u32,
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

impl Tree {
    /// Create a tree whose root is a [`NodeKind::Fragment`].
    pub fn new() -> Self {
        Self::with_root(NodeKind::Fragment)
    }

    pub fn with_root(kind: NodeKind) -> Self {
        let mut tree = Self {
            nodes: Vec::new(),
            root: NodeId(0),
            live: 0,
            next_id: 0,
        };
        tree.root = tree.create(kind);
        tree
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of live nodes, attached or not.
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Whether `id` still resolves to a live node.
    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    pub fn get(&self, id: NodeId) -> Option<&NodeData> {
        self.nodes.get(id.index()).and_then(Option::as_ref)
    }

    pub fn node(&self, id: NodeId) -> TreeResult<&NodeData> {
        self.get(id).ok_or(TreeError::NodeNotFound(id))
    }

    fn node_mut(&mut self, id: NodeId) -> TreeResult<&mut NodeData> {
        self.nodes
            .get_mut(id.index())
            .and_then(Option::as_mut)
            .ok_or(TreeError::NodeNotFound(id))
    }

    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.get(id).map(NodeData::kind)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(NodeData::parent)
    }

    /// Raw child list, markers included. Empty for unknown ids.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(NodeData::children).unwrap_or(&[])
    }

    pub fn modifiers(&self, id: NodeId) -> Option<&Modifiers> {
        self.get(id).map(NodeData::modifiers)
    }

    pub fn modifiers_mut(&mut self, id: NodeId) -> TreeResult<&mut Modifiers> {
        Ok(&mut self.node_mut(id)?.modifiers)
    }

    /// Replace the kind of a node, keeping its wiring and modifiers.
    pub fn set_kind(&mut self, id: NodeId, kind: NodeKind) -> TreeResult<()> {
        let node = self.node_mut(id)?;
        if kind.traits().contains(NodeTraits::ATOMIC) && !node.children.is_empty() {
            return Err(TreeError::AtomicParent(id));
        }
        node.kind = kind;
        Ok(())
    }

    /// Create a detached node.
    pub fn create(&mut self, kind: NodeKind) -> NodeId {
        self.create_with(kind, Modifiers::new())
    }

    pub fn create_with(&mut self, kind: NodeKind, modifiers: Modifiers) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.resize_with(id.index(), || None);
        self.nodes.push(Some(NodeData {
            kind,
            parent: None,
            children: Vec::new(),
            modifiers,
        }));
        self.live += 1;
        id
    }

    /// Replace the contents with `snapshot`, an earlier clone of this tree.
    /// Ids handed out since the snapshot stay retired.
    pub fn restore(&mut self, snapshot: Tree) {
        let next_id = self.next_id.max(snapshot.next_id);
        *self = snapshot;
        self.next_id = next_id;
    }

    /// Attach `children` at the end of `parent`, reparenting as needed.
    pub fn append(&mut self, parent: NodeId, children: &[NodeId]) -> TreeResult<()> {
        let index = self.node(parent)?.children.len();
        self.insert_at(parent, index, children)
    }

    /// Attach `children` at the start of `parent`, reparenting as needed.
    pub fn prepend(&mut self, parent: NodeId, children: &[NodeId]) -> TreeResult<()> {
        self.insert_at(parent, 0, children)
    }

    pub fn insert_before(&mut self, reference: NodeId, nodes: &[NodeId]) -> TreeResult<()> {
        let (parent, index) = self.slot_of(reference)?;
        self.insert_at(parent, index, nodes)
    }

    pub fn insert_after(&mut self, reference: NodeId, nodes: &[NodeId]) -> TreeResult<()> {
        let (parent, index) = self.slot_of(reference)?;
        self.insert_at(parent, index + 1, nodes)
    }

    fn slot_of(&self, reference: NodeId) -> TreeResult<(NodeId, usize)> {
        let parent = self
            .node(reference)?
            .parent
            .ok_or(TreeError::Orphan(reference))?;
        let index = self.index(reference).ok_or(TreeError::Orphan(reference))?;
        Ok((parent, index))
    }

    /// Attach `nodes` into `parent` starting at child `index`.
    ///
    /// Everything is validated before the first node moves, so a failing
    /// call leaves the tree untouched.
    pub fn insert_at(&mut self, parent: NodeId, index: usize, nodes: &[NodeId]) -> TreeResult<()> {
        let parent_data = self.node(parent)?;
        if parent_data.is_atomic() {
            return Err(TreeError::AtomicParent(parent));
        }
        for &node in nodes {
            self.node(node)?;
            if node == self.root {
                return Err(TreeError::RootImmovable);
            }
            if self.is_ancestor_or_self(node, parent) {
                return Err(TreeError::CycleDetected { node, parent });
            }
        }

        let mut index = index.min(self.children(parent).len());
        for &node in nodes {
            if self.parent(node) == Some(parent) {
                if let Some(current) = self.index(node) {
                    if current < index {
                        index -= 1;
                    }
                }
            }
            self.unlink(node);
            self.node_mut(node)?.parent = Some(parent);
            self.node_mut(parent)?.children.insert(index, node);
            index += 1;
        }
        Ok(())
    }

    /// Detach a node from its parent, keeping it alive for reattachment.
    pub fn detach(&mut self, id: NodeId) -> TreeResult<()> {
        self.node(id)?;
        if id == self.root {
            return Err(TreeError::RootImmovable);
        }
        self.unlink(id);
        Ok(())
    }

    fn unlink(&mut self, id: NodeId) {
        let Some(parent) = self.parent(id) else {
            return;
        };
        if let Some(Some(parent_data)) = self.nodes.get_mut(parent.index()) {
            parent_data.children.retain(|child| *child != id);
        }
        if let Some(Some(data)) = self.nodes.get_mut(id.index()) {
            data.parent = None;
        }
    }

    /// Detach and destroy a node and its subtree. Removing a node that is
    /// already gone does nothing.
    pub fn remove(&mut self, id: NodeId) {
        if !self.contains(id) {
            return;
        }
        if id == self.root {
            warn!(node = %id, "Ignoring attempt to remove the root node");
            return;
        }
        self.unlink(id);

        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(slot) = self.nodes.get_mut(current.index()) {
                if let Some(data) = slot.take() {
                    stack.extend(data.children);
                    self.live -= 1;
                }
            }
        }
    }

    /// Position of `id` in its parent's child list.
    pub fn index(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|child| *child == id)
    }

    /// Whether `ancestor` is `node` or one of its ancestors.
    pub fn is_ancestor_or_self(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// Whether the ancestor chain of `id` reaches the root.
    pub fn is_attached(&self, id: NodeId) -> bool {
        self.contains(id) && self.is_ancestor_or_self(self.root, id)
    }

    pub fn depth(&self, id: NodeId) -> usize {
        let mut depth = 0;
        let mut current = self.parent(id);
        while let Some(parent) = current {
            depth += 1;
            current = self.parent(parent);
        }
        depth
    }

    /// Child indexes from the root down to `id`; `None` if detached.
    pub fn path(&self, id: NodeId) -> Option<Vec<usize>> {
        if !self.contains(id) {
            return None;
        }
        let mut path = Vec::new();
        let mut current = id;
        while current != self.root {
            path.push(self.index(current)?);
            current = self.parent(current)?;
        }
        path.reverse();
        Some(path)
    }

    /// Document order of two attached nodes (ancestors sort first).
    pub fn compare_order(&self, a: NodeId, b: NodeId) -> Option<Ordering> {
        Some(self.path(a)?.cmp(&self.path(b)?))
    }

    /// Copy a node, and its subtree when `deep`. The copy is detached.
    pub fn clone_node(&mut self, id: NodeId, deep: bool) -> TreeResult<NodeId> {
        let data = self.node(id)?;
        let kind = data.kind.clone();
        let modifiers = data.modifiers.clone();
        let children = if deep { data.children.clone() } else { Vec::new() };

        let copy = self.create_with(kind, modifiers);
        for child in children {
            let child_copy = self.clone_node(child, true)?;
            self.node_mut(child_copy)?.parent = Some(copy);
            self.node_mut(copy)?.children.push(child_copy);
        }
        Ok(copy)
    }

    /// Split `container` before child `index`: the children from `index` on
    /// move into a shallow copy inserted right after `container`.
    pub fn split(&mut self, container: NodeId, index: usize) -> TreeResult<NodeId> {
        self.slot_of(container)?;
        let moved: Vec<NodeId> = self
            .node(container)?
            .children
            .iter()
            .skip(index)
            .copied()
            .collect();
        let copy = self.clone_node(container, false)?;
        self.insert_after(container, &[copy])?;
        self.append(copy, &moved)?;
        Ok(copy)
    }

    /// Text of the tangible subtree: characters, with `\n` for line breaks.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        let Some(data) = self.get(id) else {
            return;
        };
        if !data.is_tangible() {
            return;
        }
        match data.kind() {
            NodeKind::Char { ch } => out.push(*ch),
            NodeKind::LineBreak => out.push('\n'),
            _ => {
                for child in data.children() {
                    self.collect_text(*child, out);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paragraph(tree: &mut Tree, text: &str) -> NodeId {
        let p = tree.create(NodeKind::block("p"));
        let chars: Vec<NodeId> = text.chars().map(|ch| tree.create(NodeKind::char(ch))).collect();
        tree.append(p, &chars).unwrap();
        p
    }

    #[test]
    fn test_append_and_prepend() {
        let mut tree = Tree::new();
        let root = tree.root();
        let a = tree.create(NodeKind::char('a'));
        let b = tree.create(NodeKind::char('b'));
        tree.append(root, &[b]).unwrap();
        tree.prepend(root, &[a]).unwrap();
        assert_eq!(tree.children(root), &[a, b]);
        assert_eq!(tree.parent(a), Some(root));
    }

    #[test]
    fn test_append_reparents() {
        let mut tree = Tree::new();
        let root = tree.root();
        let p1 = paragraph(&mut tree, "ab");
        let p2 = paragraph(&mut tree, "");
        tree.append(root, &[p1, p2]).unwrap();

        let a = tree.children(p1)[0];
        tree.append(p2, &[a]).unwrap();
        assert_eq!(tree.children(p1).len(), 1);
        assert_eq!(tree.children(p2), &[a]);
        assert_eq!(tree.parent(a), Some(p2));
    }

    #[test]
    fn test_reorder_within_same_parent() {
        let mut tree = Tree::new();
        let p = paragraph(&mut tree, "abc");
        let [a, b, c] = [tree.children(p)[0], tree.children(p)[1], tree.children(p)[2]];
        tree.insert_at(p, 3, &[a]).unwrap();
        assert_eq!(tree.children(p), &[b, c, a]);
        tree.insert_before(b, &[a]).unwrap();
        assert_eq!(tree.children(p), &[a, b, c]);
    }

    #[test]
    fn test_cycle_rejected() {
        let mut tree = Tree::new();
        let root = tree.root();
        let p = paragraph(&mut tree, "a");
        tree.append(root, &[p]).unwrap();
        let a = tree.children(p)[0];

        assert_eq!(
            tree.append(p, &[p]),
            Err(TreeError::CycleDetected { node: p, parent: p })
        );
        assert!(matches!(tree.append(a, &[p]), Err(TreeError::CycleDetected { .. })));
        assert_eq!(tree.append(p, &[root]), Err(TreeError::RootImmovable));
    }

    #[test]
    fn test_atomic_parent_rejected() {
        let mut tree = Tree::new();
        let br = tree.create(NodeKind::LineBreak);
        let a = tree.create(NodeKind::char('a'));
        assert_eq!(tree.append(br, &[a]), Err(TreeError::AtomicParent(br)));
        assert_eq!(tree.parent(a), None);
    }

    #[test]
    fn test_remove_subtree_and_noop() {
        let mut tree = Tree::new();
        let root = tree.root();
        let p = paragraph(&mut tree, "ab");
        tree.append(root, &[p]).unwrap();
        let a = tree.children(p)[0];
        assert_eq!(tree.len(), 4);

        tree.remove(p);
        assert!(!tree.contains(p));
        assert!(!tree.contains(a));
        assert!(tree.children(root).is_empty());
        assert_eq!(tree.len(), 1);

        tree.remove(p);
        tree.remove(root);
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_clone_deep_preserves_fields() {
        use crate::modifier::Modifier;

        let mut tree = Tree::new();
        let p = paragraph(&mut tree, "ab");
        let a = tree.children(p)[0];
        tree.modifiers_mut(a).unwrap().append(Modifier::format("B"));
        tree.modifiers_mut(a).unwrap().append(Modifier::format("I"));

        let copy = tree.clone_node(p, true).unwrap();
        assert_ne!(copy, p);
        assert_eq!(tree.parent(copy), None);
        assert_eq!(tree.text_content(copy), "ab");
        let a_copy = tree.children(copy)[0];
        assert_eq!(tree.modifiers(a_copy), tree.modifiers(a));

        let shallow = tree.clone_node(p, false).unwrap();
        assert!(tree.children(shallow).is_empty());
        assert_eq!(tree.kind(shallow), Some(&NodeKind::block("P")));
    }

    #[test]
    fn test_split_container() {
        let mut tree = Tree::new();
        let root = tree.root();
        let p = paragraph(&mut tree, "abcd");
        tree.append(root, &[p]).unwrap();

        let tail = tree.split(p, 2).unwrap();
        assert_eq!(tree.children(root), &[p, tail]);
        assert_eq!(tree.text_content(p), "ab");
        assert_eq!(tree.text_content(tail), "cd");
    }

    #[test]
    fn test_path_and_order() {
        let mut tree = Tree::new();
        let root = tree.root();
        let p1 = paragraph(&mut tree, "ab");
        let p2 = paragraph(&mut tree, "c");
        tree.append(root, &[p1, p2]).unwrap();
        let b = tree.children(p1)[1];
        let c = tree.children(p2)[0];

        assert_eq!(tree.path(b), Some(vec![0, 1]));
        assert_eq!(tree.compare_order(b, c), Some(Ordering::Less));
        assert_eq!(tree.compare_order(p1, b), Some(Ordering::Less));

        let loose = tree.create(NodeKind::char('x'));
        assert!(!tree.is_attached(loose));
        assert_eq!(tree.path(loose), None);
    }

    #[test]
    fn test_restore_keeps_ids_retired() {
        let mut tree = Tree::new();
        let root = tree.root();
        let p = paragraph(&mut tree, "ab");
        tree.append(root, &[p]).unwrap();
        let snapshot = tree.clone();

        let discarded = paragraph(&mut tree, "xyz");
        tree.append(root, &[discarded]).unwrap();
        let last = tree.create(NodeKind::LineBreak);
        tree.restore(snapshot);

        assert!(!tree.contains(discarded));
        assert_eq!(tree.text_content(root), "ab");
        let fresh = tree.create(NodeKind::char('z'));
        assert!(fresh > last);
        assert!(tree.get(fresh).is_some());
    }
}
