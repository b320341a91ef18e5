//! # Surface
//!
//! The editable surface: a root element whose children are the document's
//! DOM items. It is the boundary between flat selections (an item plus an
//! offset, as a browser reports them) and [`Range`]s over the tree.
//!
//! A point inside a text item at offset `k > 0` sits after the `k`-th node
//! mapped from that text. A point between element children sits after the
//! last node of the previous child; placeholder `<br>`s are skipped. With no
//! previous child the point is the start of the container, or, for a format
//! wrapper, the canonical position before its first node.

use crate::error::{DomError, DomResult};
use crate::html::{read_html, write_html, DomRenderOptions};
use crate::item::{DomFormat, DomId, DomItem};
use folio_engine::{Engines, Format, Mapping};
use folio_model::{predicate, Direction, NodeId, Position, Range, Tree};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// A flat selection endpoint: an item and an offset into it (characters for
/// text, children for elements).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomPoint {
    pub item: DomId,
    pub offset: usize,
}

impl DomPoint {
    pub fn new(item: DomId, offset: usize) -> Self {
        Self { item, offset }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomSelection {
    pub anchor: DomPoint,
    pub focus: DomPoint,
    pub direction: Direction,
}

impl DomSelection {
    pub fn caret(point: DomPoint) -> Self {
        Self {
            anchor: point,
            focus: point,
            direction: Direction::Forward,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    root: DomItem,
}

impl Surface {
    pub fn new(children: Vec<DomItem>) -> Self {
        Self {
            root: DomItem::element("DIV").with_children(children),
        }
    }

    pub fn from_html(source: &str) -> DomResult<Self> {
        Ok(Self::new(read_html(source)?))
    }

    pub fn root(&self) -> &DomItem {
        &self.root
    }

    pub fn root_id(&self) -> DomId {
        self.root.id()
    }

    pub fn children(&self) -> &[DomItem] {
        self.root.children()
    }

    pub fn find(&self, id: DomId) -> Option<&DomItem> {
        self.root.find(id)
    }

    pub fn to_html(&self, options: &DomRenderOptions) -> String {
        write_html(self.children(), options)
    }

    /// Parse the surface's children under the tree root. The surface root
    /// itself is mapped to the tree root.
    pub async fn load(&self, engines: &mut Engines, tree: &mut Tree) -> DomResult<Vec<NodeId>> {
        let root = tree.root();
        let nodes = engines
            .parse_into::<DomFormat>(DomFormat::ID, tree, root, self.children())
            .await?;
        engines
            .parsing_engine_mut::<DomFormat>(DomFormat::ID)?
            .mapping_mut()
            .link(self.root_id(), root);
        debug!(nodes = nodes.len(), "Loaded surface");
        Ok(nodes)
    }

    /// Render the tree root's children into a fresh surface.
    pub async fn render(engines: &mut Engines, tree: &Tree) -> DomResult<Self> {
        let root = tree.root();
        let children = tree.walk().children(root, predicate::any);
        let items = engines
            .render::<DomFormat>(DomFormat::ID, tree, &children)
            .await?;
        let surface = Self::new(items);
        engines
            .rendering_engine_mut::<DomFormat>(DomFormat::ID)?
            .mapping_mut()
            .link(surface.root_id(), root);
        Ok(surface)
    }

    /// Convert a flat selection to a range. Each endpoint resolves on its own;
    /// the selection's direction decides which one becomes the anchor.
    pub fn resolve_selection(
        &self,
        tree: &Tree,
        mapping: &Mapping<DomId>,
        selection: &DomSelection,
    ) -> DomResult<Range> {
        let index = self.index();
        let a = resolve_point(&index, tree, mapping, selection.anchor)?;
        let b = resolve_point(&index, tree, mapping, selection.focus)?;
        let key_a = a.resolve(tree)?.order_key(tree)?;
        let key_b = b.resolve(tree)?.order_key(tree)?;
        let (start, end) = if key_a <= key_b { (a, b) } else { (b, a) };
        Ok(Range::from_bounds(tree, start, end, selection.direction)?)
    }

    pub fn resolve_point(&self, tree: &Tree, mapping: &Mapping<DomId>, point: DomPoint) -> DomResult<Position> {
        resolve_point(&self.index(), tree, mapping, point)
    }

    /// Convert a range back to a flat selection.
    pub fn locate_range(&self, tree: &Tree, mapping: &Mapping<DomId>, range: &Range) -> DomResult<DomSelection> {
        let index = self.index();
        let start = locate(&index, tree, mapping, range.start())?;
        let end = locate(&index, tree, mapping, range.end())?;
        let (anchor, focus) = match range.direction() {
            Direction::Forward => (start, end),
            Direction::Backward => (end, start),
        };
        Ok(DomSelection {
            anchor,
            focus,
            direction: range.direction(),
        })
    }

    /// Flat point for one tree position. Text items adjacent to the position
    /// win over their container.
    pub fn locate(&self, tree: &Tree, mapping: &Mapping<DomId>, position: Position) -> DomResult<DomPoint> {
        locate(&self.index(), tree, mapping, position)
    }

    fn index(&self) -> HashMap<DomId, &DomItem> {
        let mut index = HashMap::new();
        let mut stack = vec![&self.root];
        while let Some(item) = stack.pop() {
            index.insert(item.id(), item);
            stack.extend(item.children());
        }
        index
    }
}

type Index<'s> = HashMap<DomId, &'s DomItem>;

/// Position right before `node`, expressed the canonical way.
fn canonical_before(tree: &Tree, node: NodeId) -> DomResult<Position> {
    Ok(Position::before(node).resolve(tree)?.to_position(tree))
}

fn last_node(mapping: &Mapping<DomId>, item: &DomItem) -> DomResult<NodeId> {
    mapping
        .nodes(&DomFormat::key(item))
        .last()
        .copied()
        .ok_or(DomError::UnmappedItem(item.id()))
}

fn resolve_point(index: &Index<'_>, tree: &Tree, mapping: &Mapping<DomId>, point: DomPoint) -> DomResult<Position> {
    let item = index.get(&point.item).ok_or(DomError::UnknownItem(point.item))?;
    let len = item.len();
    if point.offset > len {
        return Err(DomError::OffsetOutOfRange {
            item: point.item,
            offset: point.offset,
            len,
        });
    }

    if item.is_placeholder() {
        // Redirect to the gap before the placeholder in its parent.
        let (parent, slot) = index
            .values()
            .find_map(|candidate| {
                let slot = candidate.children().iter().position(|child| child.id() == point.item)?;
                Some((*candidate, slot))
            })
            .ok_or(DomError::UnmappedItem(point.item))?;
        return resolve_point(index, tree, mapping, DomPoint::new(parent.id(), slot));
    }

    let nodes = mapping.nodes(&point.item);
    match item {
        DomItem::Text(_) => {
            let first = *nodes.first().ok_or(DomError::UnmappedItem(point.item))?;
            if point.offset == 0 {
                return canonical_before(tree, first);
            }
            let node = nodes.get(point.offset - 1).ok_or(DomError::OffsetOutOfRange {
                item: point.item,
                offset: point.offset,
                len: nodes.len(),
            })?;
            Ok(Position::after(*node))
        }
        DomItem::Element(element) => {
            let previous = element.children[..point.offset]
                .iter()
                .rev()
                .find(|child| !child.is_placeholder());
            if let Some(child) = previous {
                return Ok(Position::after(last_node(mapping, child)?));
            }
            match nodes {
                [container] if predicate::is_container(tree, *container) => Ok(Position::inside(*container)),
                [first, ..] => canonical_before(tree, *first),
                [] => Err(DomError::UnmappedItem(point.item)),
            }
        }
    }
}

fn maps_to(mapping: &Mapping<DomId>, item: &DomItem, node: NodeId) -> bool {
    mapping.nodes(&item.id()).contains(&node)
        || item.children().iter().any(|child| maps_to(mapping, child, node))
}

/// Text item holding `node` and the node's index within it.
fn text_slot(index: &Index<'_>, mapping: &Mapping<DomId>, node: NodeId) -> Option<(DomId, usize)> {
    mapping.items(node).iter().find_map(|key| {
        let item = index.get(key)?;
        if !item.is_text() {
            return None;
        }
        let slot = mapping.nodes(key).iter().position(|n| *n == node)?;
        Some((*key, slot))
    })
}

fn locate(index: &Index<'_>, tree: &Tree, mapping: &Mapping<DomId>, position: Position) -> DomResult<DomPoint> {
    let gap = position.resolve(tree)?;
    if let Some(before) = gap.node_before(tree) {
        if let Some((item, slot)) = text_slot(index, mapping, before) {
            return Ok(DomPoint::new(item, slot + 1));
        }
    }
    if let Some(after) = gap.node_after(tree) {
        if let Some((item, slot)) = text_slot(index, mapping, after) {
            return Ok(DomPoint::new(item, slot));
        }
    }

    let container = mapping
        .items(gap.parent)
        .iter()
        .filter_map(|key| index.get(key))
        .find(|item| !item.is_text() && mapping.nodes(&item.id()) == [gap.parent])
        .ok_or(DomError::UnmappedNode(gap.parent))?;

    let offset = match gap.node_before(tree) {
        Some(before) => container
            .children()
            .iter()
            .rposition(|child| maps_to(mapping, child, before))
            .map(|i| i + 1)
            .ok_or(DomError::UnmappedNode(before))?,
        None => 0,
    };
    Ok(DomPoint::new(container.id(), offset))
}
