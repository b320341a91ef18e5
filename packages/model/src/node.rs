//! Node identity, kinds and capability traits.
//!
//! Dispatch over "what a node is" goes through two things: the kind tag
//! ([`NodeKind`]) for exact matches and the capability set ([`NodeTraits`])
//! for questions like "is this a container". Plugins that need node kinds the
//! core does not know about use [`NodeKind::Custom`] with their own payload.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::any::Any;
use std::fmt;

/// Stable node identity. Ids are never reused within a tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

bitflags! {
    /// Capability set of a node kind.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct NodeTraits: u8 {
        /// Holds children (paragraphs, the document root, ...).
        const CONTAINER = 1 << 0;
        /// Flows inside a line (characters, line breaks, inline objects).
        const INLINE = 1 << 1;
        /// Cannot have meaningful children.
        const ATOMIC = 1 << 2;
        /// Visible to default traversal and rendering.
        const TANGIBLE = 1 << 3;
    }
}

/// Type-erased payload for plugin-defined node kinds.
///
/// Implemented for every `Clone + PartialEq + Debug` type, so plugins only
/// need to derive those on their payload struct.
pub trait NodePayload: Any + fmt::Debug + Send + Sync {
    fn clone_payload(&self) -> Box<dyn NodePayload>;
    fn eq_payload(&self, other: &dyn NodePayload) -> bool;
    fn as_any(&self) -> &dyn Any;
}

impl<T> NodePayload for T
where
    T: Any + fmt::Debug + Clone + PartialEq + Send + Sync,
{
    fn clone_payload(&self) -> Box<dyn NodePayload> {
        Box::new(self.clone())
    }

    fn eq_payload(&self, other: &dyn NodePayload) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .map_or(false, |other| self == other)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A node kind defined outside the core.
#[derive(Debug)]
pub struct CustomKind {
    pub name: SmolStr,
    pub traits: NodeTraits,
    payload: Box<dyn NodePayload>,
}

impl CustomKind {
    pub fn new(name: impl Into<SmolStr>, traits: NodeTraits, payload: impl NodePayload) -> Self {
        Self {
            name: name.into(),
            traits,
            payload: Box::new(payload),
        }
    }

    /// Downcast the payload to the plugin's concrete type.
    pub fn payload<P: Any>(&self) -> Option<&P> {
        self.payload.as_any().downcast_ref::<P>()
    }
}

impl Clone for CustomKind {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            traits: self.traits,
            payload: self.payload.clone_payload(),
        }
    }
}

impl PartialEq for CustomKind {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.traits == other.traits
            && self.payload.eq_payload(other.payload.as_ref())
    }
}

/// Node kind tag.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Generic container; the document root is one.
    Fragment,

    /// Block container such as a paragraph or a heading. Tags are uppercase.
    Block { tag: SmolStr },

    /// A single character of text.
    Char { ch: char },

    /// Hard line break inside a block.
    LineBreak,

    /// Non-tangible bookkeeping node.
    Marker,

    /// Plugin-defined kind.
    Custom(CustomKind),
}

impl NodeKind {
    pub fn block(tag: impl AsRef<str>) -> Self {
        NodeKind::Block {
            tag: SmolStr::new(tag.as_ref().to_ascii_uppercase()),
        }
    }

    pub fn char(ch: char) -> Self {
        NodeKind::Char { ch }
    }

    pub fn custom(name: impl Into<SmolStr>, traits: NodeTraits, payload: impl NodePayload) -> Self {
        NodeKind::Custom(CustomKind::new(name, traits, payload))
    }

    /// Tag used by predicates like [`crate::predicate::named`].
    pub fn name(&self) -> &str {
        match self {
            NodeKind::Fragment => "FRAGMENT",
            NodeKind::Block { tag } => tag.as_str(),
            NodeKind::Char { .. } => "CHAR",
            NodeKind::LineBreak => "BR",
            NodeKind::Marker => "MARKER",
            NodeKind::Custom(custom) => custom.name.as_str(),
        }
    }

    pub fn traits(&self) -> NodeTraits {
        match self {
            NodeKind::Fragment | NodeKind::Block { .. } => {
                NodeTraits::CONTAINER | NodeTraits::TANGIBLE
            }
            NodeKind::Char { .. } => NodeTraits::INLINE | NodeTraits::TANGIBLE,
            NodeKind::LineBreak => NodeTraits::INLINE | NodeTraits::ATOMIC | NodeTraits::TANGIBLE,
            NodeKind::Marker => NodeTraits::INLINE | NodeTraits::ATOMIC,
            NodeKind::Custom(custom) => custom.traits,
        }
    }

    pub fn as_char(&self) -> Option<char> {
        match self {
            NodeKind::Char { ch } => Some(*ch),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Image {
        src: String,
    }

    #[test]
    fn test_block_tags_are_uppercase() {
        assert_eq!(NodeKind::block("h1").name(), "H1");
    }

    #[test]
    fn test_line_break_is_atomic_and_tangible() {
        let traits = NodeKind::LineBreak.traits();
        assert!(traits.contains(NodeTraits::ATOMIC | NodeTraits::TANGIBLE));
        assert!(!NodeKind::Marker.traits().contains(NodeTraits::TANGIBLE));
    }

    #[test]
    fn test_custom_kind_clone_keeps_payload() {
        let kind = NodeKind::custom(
            "IMG",
            NodeTraits::INLINE | NodeTraits::ATOMIC | NodeTraits::TANGIBLE,
            Image {
                src: "cat.png".to_string(),
            },
        );
        let copy = kind.clone();
        assert_eq!(kind, copy);

        let NodeKind::Custom(custom) = copy else {
            panic!("Expected custom kind");
        };
        assert_eq!(custom.payload::<Image>().map(|i| i.src.as_str()), Some("cat.png"));
        assert!(custom.payload::<String>().is_none());
    }
}
