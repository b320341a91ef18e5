//! Node predicates for traversal and handler dispatch.

use crate::node::{NodeId, NodeKind, NodeTraits};
use crate::Tree;

fn has_traits(tree: &Tree, id: NodeId, traits: NodeTraits) -> bool {
    tree.get(id).map_or(false, |data| data.traits().contains(traits))
}

pub fn any(_tree: &Tree, _id: NodeId) -> bool {
    true
}

pub fn is_container(tree: &Tree, id: NodeId) -> bool {
    has_traits(tree, id, NodeTraits::CONTAINER)
}

pub fn is_inline(tree: &Tree, id: NodeId) -> bool {
    has_traits(tree, id, NodeTraits::INLINE)
}

pub fn is_atomic(tree: &Tree, id: NodeId) -> bool {
    has_traits(tree, id, NodeTraits::ATOMIC)
}

pub fn is_tangible(tree: &Tree, id: NodeId) -> bool {
    has_traits(tree, id, NodeTraits::TANGIBLE)
}

/// No children at all (markers included).
pub fn is_leaf(tree: &Tree, id: NodeId) -> bool {
    tree.contains(id) && tree.children(id).is_empty()
}

pub fn is_char(tree: &Tree, id: NodeId) -> bool {
    matches!(tree.kind(id), Some(NodeKind::Char { .. }))
}

pub fn is_line_break(tree: &Tree, id: NodeId) -> bool {
    matches!(tree.kind(id), Some(NodeKind::LineBreak))
}

/// Node kind name equals `name` (case-insensitive).
pub fn named(name: &str) -> impl Fn(&Tree, NodeId) -> bool + '_ {
    move |tree, id| tree.kind(id).map_or(false, |kind| kind.name().eq_ignore_ascii_case(name))
}

/// Node carries a format modifier called `name`.
pub fn has_format(name: &str) -> impl Fn(&Tree, NodeId) -> bool + '_ {
    move |tree, id| tree.modifiers(id).map_or(false, |mods| mods.has_format(name))
}

pub fn not<P>(predicate: P) -> impl Fn(&Tree, NodeId) -> bool
where
    P: Fn(&Tree, NodeId) -> bool,
{
    move |tree, id| !predicate(tree, id)
}
