//! The `dom` format's items: a small element/text tree.

use folio_engine::Format;
use folio_model::Attributes;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a DOM item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DomId(u64);

impl DomId {
    pub fn next() -> Self {
        Self(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for DomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "dom#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DomElement {
    pub id: DomId,
    /// Uppercase tag name.
    pub tag: SmolStr,
    pub attributes: Attributes,
    pub children: Vec<DomItem>,
    /// Trailing `<br>` that only keeps a block-final line break visible.
    pub placeholder: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DomText {
    pub id: DomId,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DomItem {
    Element(DomElement),
    Text(DomText),
}

impl DomItem {
    pub fn element(tag: impl AsRef<str>) -> Self {
        DomItem::Element(DomElement {
            id: DomId::next(),
            tag: SmolStr::new(tag.as_ref().to_ascii_uppercase()),
            attributes: Attributes::new(),
            children: Vec::new(),
            placeholder: false,
        })
    }

    pub fn text(text: impl Into<String>) -> Self {
        DomItem::Text(DomText {
            id: DomId::next(),
            text: text.into(),
        })
    }

    /// Builder: set an attribute. No effect on text items.
    pub fn with_attr(mut self, name: &str, value: impl Into<String>) -> Self {
        if let DomItem::Element(element) = &mut self {
            element.attributes.set(name.to_ascii_lowercase(), value);
        }
        self
    }

    /// Builder: append children. No effect on text items.
    pub fn with_children(mut self, children: impl IntoIterator<Item = DomItem>) -> Self {
        if let DomItem::Element(element) = &mut self {
            element.children.extend(children);
        }
        self
    }

    pub fn id(&self) -> DomId {
        match self {
            DomItem::Element(element) => element.id,
            DomItem::Text(text) => text.id,
        }
    }

    pub fn tag(&self) -> Option<&str> {
        match self {
            DomItem::Element(element) => Some(element.tag.as_str()),
            DomItem::Text(_) => None,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, DomItem::Text(_))
    }

    pub fn is_element(&self, tag: &str) -> bool {
        self.tag().map_or(false, |own| own.eq_ignore_ascii_case(tag))
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, DomItem::Element(element) if element.placeholder)
    }

    pub fn children(&self) -> &[DomItem] {
        match self {
            DomItem::Element(element) => &element.children,
            DomItem::Text(_) => &[],
        }
    }

    pub fn attributes(&self) -> Option<&Attributes> {
        match self {
            DomItem::Element(element) => Some(&element.attributes),
            DomItem::Text(_) => None,
        }
    }

    /// Number of offsets a selection point inside this item can take.
    pub fn len(&self) -> usize {
        match self {
            DomItem::Element(element) => element.children.len(),
            DomItem::Text(text) => text.text.chars().count(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn text_content(&self) -> String {
        match self {
            DomItem::Text(text) => text.text.clone(),
            DomItem::Element(element) => element.children.iter().map(DomItem::text_content).collect(),
        }
    }

    /// Find `id` in this item's subtree, itself included.
    pub fn find(&self, id: DomId) -> Option<&DomItem> {
        if self.id() == id {
            return Some(self);
        }
        self.children().iter().find_map(|child| child.find(id))
    }

    /// Tag-and-text shape comparison that ignores identities.
    pub fn same_shape(&self, other: &DomItem) -> bool {
        match (self, other) {
            (DomItem::Text(a), DomItem::Text(b)) => a.text == b.text,
            (DomItem::Element(a), DomItem::Element(b)) => {
                a.tag == b.tag
                    && a.attributes == b.attributes
                    && a.children.len() == b.children.len()
                    && a.children.iter().zip(&b.children).all(|(a, b)| a.same_shape(b))
            }
            _ => false,
        }
    }
}

/// The element/text item tree format.
pub struct DomFormat;

impl Format for DomFormat {
    const ID: &'static str = "dom";
    type Item = DomItem;
    type Key = DomId;

    fn key(item: &DomItem) -> DomId {
        item.id()
    }
}
