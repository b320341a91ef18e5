//! # Range
//!
//! Logical selection over the tree.
//!
//! A [`Position`] names a reference node and where the point sits relative to
//! it. Positions that look different can denote the same point (`After(a)`
//! and `Before(b)` for adjacent siblings), so comparisons go through the
//! resolved [`Gap`]: a parent plus a child index.
//!
//! A [`Range`] stores its anchor and focus as given and caches its shape and
//! direction. Call [`Range::refresh`] after mutating the tree to revalidate
//! both endpoints and recompute the cache.

use crate::error::{RangeError, RangeResult};
use crate::node::{NodeId, NodeTraits};
use crate::predicate;
use crate::Tree;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Placement {
    Before,
    After,
    /// As the first child of the reference container.
    Inside,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub node: NodeId,
    pub placement: Placement,
}

impl Position {
    pub fn new(node: NodeId, placement: Placement) -> Self {
        Self { node, placement }
    }

    pub fn before(node: NodeId) -> Self {
        Self::new(node, Placement::Before)
    }

    pub fn after(node: NodeId) -> Self {
        Self::new(node, Placement::After)
    }

    pub fn inside(node: NodeId) -> Self {
        Self::new(node, Placement::Inside)
    }

    /// Resolve to the slot this position denotes.
    pub fn resolve(&self, tree: &Tree) -> RangeResult<Gap> {
        if !tree.is_attached(self.node) {
            return Err(RangeError::DetachedEndpoint(self.node));
        }
        match self.placement {
            Placement::Inside => {
                let container = tree
                    .get(self.node)
                    .map_or(false, |data| data.traits().contains(NodeTraits::CONTAINER));
                if !container {
                    return Err(RangeError::NotAContainer(self.node));
                }
                Ok(Gap {
                    parent: self.node,
                    index: 0,
                })
            }
            Placement::Before | Placement::After => {
                let parent = tree.parent(self.node).ok_or(RangeError::NoParent(self.node))?;
                let index = tree.index(self.node).ok_or(RangeError::NoParent(self.node))?;
                let index = if self.placement == Placement::After {
                    index + 1
                } else {
                    index
                };
                Ok(Gap { parent, index })
            }
        }
    }
}

/// A slot between two children of a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Gap {
    pub parent: NodeId,
    pub index: usize,
}

impl Gap {
    /// Document-order key: the parent's path followed by the slot index.
    pub fn order_key(&self, tree: &Tree) -> RangeResult<Vec<usize>> {
        let mut key = tree
            .path(self.parent)
            .ok_or(RangeError::DetachedEndpoint(self.parent))?;
        key.push(self.index);
        Ok(key)
    }

    /// Node right after the gap, if any.
    pub fn node_after(&self, tree: &Tree) -> Option<NodeId> {
        tree.children(self.parent).get(self.index).copied()
    }

    /// Node right before the gap, if any.
    pub fn node_before(&self, tree: &Tree) -> Option<NodeId> {
        self.index
            .checked_sub(1)
            .and_then(|i| tree.children(self.parent).get(i).copied())
    }

    /// Canonical position for this gap: after the previous sibling when
    /// there is one, otherwise inside the parent.
    pub fn to_position(&self, tree: &Tree) -> Position {
        match self.node_before(tree) {
            Some(previous) => Position::after(previous),
            None => Position::inside(self.parent),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Forward,
    Backward,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Collapsed,
    Extended,
}

/// Anchor/focus pair over the tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Range {
    anchor: Position,
    focus: Position,
    direction: Direction,
    shape: Shape,
}

impl Range {
    pub fn new(tree: &Tree, anchor: Position, focus: Position) -> RangeResult<Self> {
        let mut range = Self {
            anchor,
            focus,
            direction: Direction::Forward,
            shape: Shape::Collapsed,
        };
        range.refresh(tree)?;
        Ok(range)
    }

    /// Caret at `position`.
    pub fn caret(tree: &Tree, position: Position) -> RangeResult<Self> {
        Self::new(tree, position, position)
    }

    /// Build from ordered bounds and an explicit direction flag.
    pub fn from_bounds(
        tree: &Tree,
        start: Position,
        end: Position,
        direction: Direction,
    ) -> RangeResult<Self> {
        match direction {
            Direction::Forward => Self::new(tree, start, end),
            Direction::Backward => Self::new(tree, end, start),
        }
    }

    /// Caret inside the first leaf container of the document.
    pub fn at_start(tree: &Tree) -> RangeResult<Self> {
        let root = tree.root();
        let first = tree.walk().first_leaf(root);
        let position = if tree.get(first).map_or(false, |d| d.is_container()) {
            Position::inside(first)
        } else {
            Position::before(first)
        };
        Self::caret(tree, position)
    }

    pub fn anchor(&self) -> Position {
        self.anchor
    }

    pub fn focus(&self) -> Position {
        self.focus
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }

    pub fn is_collapsed(&self) -> bool {
        self.shape == Shape::Collapsed
    }

    /// Endpoint that comes first in document order.
    pub fn start(&self) -> Position {
        match self.direction {
            Direction::Forward => self.anchor,
            Direction::Backward => self.focus,
        }
    }

    /// Endpoint that comes last in document order.
    pub fn end(&self) -> Position {
        match self.direction {
            Direction::Forward => self.focus,
            Direction::Backward => self.anchor,
        }
    }

    pub fn set_anchor(&mut self, tree: &Tree, anchor: Position) -> RangeResult<()> {
        anchor.resolve(tree)?;
        self.anchor = anchor;
        self.refresh(tree)
    }

    pub fn set_focus(&mut self, tree: &Tree, focus: Position) -> RangeResult<()> {
        focus.resolve(tree)?;
        self.focus = focus;
        self.refresh(tree)
    }

    /// Collapse both endpoints onto `position`.
    pub fn collapse(&mut self, tree: &Tree, position: Position) -> RangeResult<()> {
        position.resolve(tree)?;
        self.anchor = position;
        self.focus = position;
        self.refresh(tree)
    }

    /// Select `node` from just before it to just after it.
    pub fn select_node(&mut self, tree: &Tree, node: NodeId) -> RangeResult<()> {
        let (before, after) = (Position::before(node), Position::after(node));
        before.resolve(tree)?;
        self.anchor = before;
        self.focus = after;
        self.refresh(tree)
    }

    /// Revalidate both endpoints and recompute shape and direction.
    pub fn refresh(&mut self, tree: &Tree) -> RangeResult<()> {
        let anchor = self.anchor.resolve(tree)?.order_key(tree)?;
        let focus = self.focus.resolve(tree)?.order_key(tree)?;
        match focus.cmp(&anchor) {
            Ordering::Equal => {
                self.shape = Shape::Collapsed;
                self.direction = Direction::Forward;
            }
            Ordering::Greater => {
                self.shape = Shape::Extended;
                self.direction = Direction::Forward;
            }
            Ordering::Less => {
                self.shape = Shape::Extended;
                self.direction = Direction::Backward;
            }
        }
        Ok(())
    }

    /// Both endpoints still resolve against `tree`.
    pub fn validate(&self, tree: &Tree) -> RangeResult<()> {
        self.anchor.resolve(tree)?;
        self.focus.resolve(tree)?;
        Ok(())
    }

    /// Tangible leaves lying entirely between start and end, in document order.
    pub fn selected_leaves(&self, tree: &Tree) -> RangeResult<Vec<NodeId>> {
        if self.is_collapsed() {
            return Ok(Vec::new());
        }
        let start = self.start().resolve(tree)?.order_key(tree)?;
        let end = self.end().resolve(tree)?.order_key(tree)?;

        let mut selected = Vec::new();
        for leaf in tree.walk().descendants(tree.root(), predicate::is_leaf) {
            if predicate::is_container(tree, leaf) {
                continue;
            }
            let before = Position::before(leaf).resolve(tree)?.order_key(tree)?;
            let after = Position::after(leaf).resolve(tree)?.order_key(tree)?;
            if before >= start && after <= end {
                selected.push(leaf);
            }
        }
        Ok(selected)
    }
}
