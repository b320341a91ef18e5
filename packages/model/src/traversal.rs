//! Predicate-driven traversal.
//!
//! A [`Walker`] only yields tangible nodes unless it was created with
//! [`Traversal::All`], which also sees markers and other bookkeeping nodes.
//! Structure is always followed through every node; the mode only filters
//! what gets returned.

use crate::node::NodeId;
use crate::tree::{NodeData, Tree};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Traversal {
    #[default]
    Tangible,
    All,
}

impl Traversal {
    fn admits(self, data: &NodeData) -> bool {
        match self {
            Traversal::Tangible => data.is_tangible(),
            Traversal::All => true,
        }
    }
}

/// Read-only traversal helper bound to a tree.
#[derive(Clone, Copy)]
pub struct Walker<'t> {
    tree: &'t Tree,
    mode: Traversal,
}

impl Tree {
    /// Walker over tangible nodes.
    pub fn walk(&self) -> Walker<'_> {
        Walker {
            tree: self,
            mode: Traversal::Tangible,
        }
    }

    /// Walker over every node, markers included.
    pub fn walk_all(&self) -> Walker<'_> {
        Walker {
            tree: self,
            mode: Traversal::All,
        }
    }

    pub fn walk_with(&self, mode: Traversal) -> Walker<'_> {
        Walker { tree: self, mode }
    }

    pub fn first_leaf(&self, id: NodeId) -> NodeId {
        self.walk().first_leaf(id)
    }

    pub fn last_leaf(&self, id: NodeId) -> NodeId {
        self.walk().last_leaf(id)
    }
}

impl<'t> Walker<'t> {
    fn accepts<P>(&self, id: NodeId, predicate: &P) -> bool
    where
        P: Fn(&Tree, NodeId) -> bool,
    {
        self.tree
            .get(id)
            .map_or(false, |data| self.mode.admits(data) && predicate(self.tree, id))
    }

    /// Direct children matching `predicate`.
    pub fn children<P>(&self, id: NodeId, predicate: P) -> Vec<NodeId>
    where
        P: Fn(&Tree, NodeId) -> bool,
    {
        self.tree
            .children(id)
            .iter()
            .copied()
            .filter(|child| self.accepts(*child, &predicate))
            .collect()
    }

    pub fn first_child<P>(&self, id: NodeId, predicate: P) -> Option<NodeId>
    where
        P: Fn(&Tree, NodeId) -> bool,
    {
        self.tree
            .children(id)
            .iter()
            .copied()
            .find(|child| self.accepts(*child, &predicate))
    }

    pub fn last_child<P>(&self, id: NodeId, predicate: P) -> Option<NodeId>
    where
        P: Fn(&Tree, NodeId) -> bool,
    {
        self.tree
            .children(id)
            .iter()
            .rev()
            .copied()
            .find(|child| self.accepts(*child, &predicate))
    }

    pub fn next_sibling<P>(&self, id: NodeId, predicate: P) -> Option<NodeId>
    where
        P: Fn(&Tree, NodeId) -> bool,
    {
        let parent = self.tree.parent(id)?;
        let index = self.tree.index(id)?;
        self.tree.children(parent)[index + 1..]
            .iter()
            .copied()
            .find(|sibling| self.accepts(*sibling, &predicate))
    }

    pub fn previous_sibling<P>(&self, id: NodeId, predicate: P) -> Option<NodeId>
    where
        P: Fn(&Tree, NodeId) -> bool,
    {
        let parent = self.tree.parent(id)?;
        let index = self.tree.index(id)?;
        self.tree.children(parent)[..index]
            .iter()
            .rev()
            .copied()
            .find(|sibling| self.accepts(*sibling, &predicate))
    }

    /// Closest proper ancestor matching `predicate`.
    pub fn ancestor<P>(&self, id: NodeId, predicate: P) -> Option<NodeId>
    where
        P: Fn(&Tree, NodeId) -> bool,
    {
        let mut current = self.tree.parent(id);
        while let Some(ancestor) = current {
            if self.accepts(ancestor, &predicate) {
                return Some(ancestor);
            }
            current = self.tree.parent(ancestor);
        }
        None
    }

    /// Descendants of `id` in depth-first pre-order, `id` excluded.
    pub fn descendants<P>(&self, id: NodeId, predicate: P) -> Vec<NodeId>
    where
        P: Fn(&Tree, NodeId) -> bool,
    {
        let mut found = Vec::new();
        let mut stack: Vec<NodeId> = self.tree.children(id).iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            if self.accepts(current, &predicate) {
                found.push(current);
            }
            stack.extend(self.tree.children(current).iter().rev().copied());
        }
        found
    }

    /// Next node in depth-first pre-order (descendants first) matching `predicate`.
    pub fn next<P>(&self, id: NodeId, predicate: P) -> Option<NodeId>
    where
        P: Fn(&Tree, NodeId) -> bool,
    {
        let mut current = self.successor(id);
        while let Some(candidate) = current {
            if self.accepts(candidate, &predicate) {
                return Some(candidate);
            }
            current = self.successor(candidate);
        }
        None
    }

    /// Previous node in depth-first pre-order matching `predicate`.
    pub fn previous<P>(&self, id: NodeId, predicate: P) -> Option<NodeId>
    where
        P: Fn(&Tree, NodeId) -> bool,
    {
        let mut current = self.predecessor(id);
        while let Some(candidate) = current {
            if self.accepts(candidate, &predicate) {
                return Some(candidate);
            }
            current = self.predecessor(candidate);
        }
        None
    }

    fn successor(&self, id: NodeId) -> Option<NodeId> {
        if let Some(first) = self.tree.children(id).first() {
            return Some(*first);
        }
        let mut current = id;
        loop {
            let parent = self.tree.parent(current)?;
            let index = self.tree.index(current)?;
            if let Some(sibling) = self.tree.children(parent).get(index + 1) {
                return Some(*sibling);
            }
            current = parent;
        }
    }

    fn predecessor(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.tree.parent(id)?;
        let index = self.tree.index(id)?;
        if index == 0 {
            return Some(parent);
        }
        let mut current = self.tree.children(parent)[index - 1];
        while let Some(last) = self.tree.children(current).last() {
            current = *last;
        }
        Some(current)
    }

    /// Deepest first descendant, following admitted children only.
    pub fn first_leaf(&self, id: NodeId) -> NodeId {
        let mut current = id;
        while let Some(child) = self.first_child(current, crate::predicate::any) {
            current = child;
        }
        current
    }

    /// Deepest last descendant, following admitted children only.
    pub fn last_leaf(&self, id: NodeId) -> NodeId {
        let mut current = id;
        while let Some(child) = self.last_child(current, crate::predicate::any) {
            current = child;
        }
        current
    }
}
