//! Parsers of the `dom` engine.

use crate::item::{DomFormat, DomItem};
use folio_engine::{async_trait, EngineResult, ParseContext, Parser};
use folio_model::{predicate, Attributes, Modifier, Modifiers, NodeId, NodeKind};

/// Inline elements that become a format modifier on their content.
pub const FORMAT_TAGS: &[&str] = &[
    "A", "ABBR", "B", "CITE", "CODE", "DEL", "EM", "I", "INS", "KBD", "MARK", "Q", "S", "SAMP",
    "SMALL", "SPAN", "STRIKE", "STRONG", "SUB", "SUP", "U", "VAR",
];

/// Elements that become block containers.
pub const BLOCK_TAGS: &[&str] = &[
    "ADDRESS", "ARTICLE", "ASIDE", "BLOCKQUOTE", "DIV", "FOOTER", "H1", "H2", "H3", "H4", "H5", "H6",
    "HEADER", "LI", "MAIN", "NAV", "OL", "P", "PRE", "SECTION", "UL",
];

fn is_format_element(item: &DomItem) -> bool {
    item.tag().map_or(false, |tag| FORMAT_TAGS.contains(&tag)) && !item.children().is_empty()
}

fn is_block_element(item: &DomItem) -> bool {
    item.tag().map_or(false, |tag| BLOCK_TAGS.contains(&tag))
}

fn attributes_of(item: &DomItem) -> Modifiers {
    match item.attributes() {
        Some(attributes) if !attributes.is_empty() => {
            Modifiers::from_iter([Modifier::attributes(attributes.clone())])
        }
        _ => Modifiers::new(),
    }
}

/// Container for `item` with its parsed children appended.
async fn parse_container(
    ctx: &ParseContext<'_, DomFormat>,
    item: &DomItem,
    kind: NodeKind,
) -> EngineResult<Vec<NodeId>> {
    let container = ctx.create_with(kind, attributes_of(item));
    let children = ctx.parse(item.children()).await?;
    ctx.append(container, &children)?;
    Ok(vec![container])
}

/// Text runs become one character node each. An empty text item becomes a
/// marker so it still has a node.
pub struct TextParser;

#[async_trait(?Send)]
impl Parser<DomFormat> for TextParser {
    fn predicate(&self) -> Option<fn(&DomItem) -> bool> {
        Some(DomItem::is_text)
    }

    async fn parse(&self, ctx: &ParseContext<'_, DomFormat>, item: &DomItem) -> EngineResult<Vec<NodeId>> {
        let DomItem::Text(text) = item else {
            return Ok(Vec::new());
        };
        if text.text.is_empty() {
            return Ok(vec![ctx.create(NodeKind::Marker)]);
        }
        Ok(text.text.chars().map(|ch| ctx.create(NodeKind::char(ch))).collect())
    }
}

/// `<br>`, or a marker for a trailing placeholder `<br>`.
pub struct LineBreakParser;

#[async_trait(?Send)]
impl Parser<DomFormat> for LineBreakParser {
    fn predicate(&self) -> Option<fn(&DomItem) -> bool> {
        Some(|item| item.is_element("BR"))
    }

    async fn parse(&self, ctx: &ParseContext<'_, DomFormat>, item: &DomItem) -> EngineResult<Vec<NodeId>> {
        let kind = if item.is_placeholder() {
            NodeKind::Marker
        } else {
            NodeKind::LineBreak
        };
        Ok(vec![ctx.create(kind)])
    }
}

/// Inline format elements with content: the content's inline nodes get the
/// format as their outermost modifier.
pub struct FormatParser;

#[async_trait(?Send)]
impl Parser<DomFormat> for FormatParser {
    fn predicate(&self) -> Option<fn(&DomItem) -> bool> {
        Some(is_format_element)
    }

    async fn parse(&self, ctx: &ParseContext<'_, DomFormat>, item: &DomItem) -> EngineResult<Vec<NodeId>> {
        let tag = item.tag().unwrap_or("SPAN");
        let attributes = item.attributes().cloned().unwrap_or_else(Attributes::new);
        let modifier = if tag == "SPAN" {
            Modifier::attributes(attributes)
        } else {
            Modifier::format_with(tag, attributes)
        };

        let nodes = ctx.parse(item.children()).await?;
        ctx.with_tree(|tree| -> EngineResult<()> {
            let mut targets = Vec::new();
            for node in &nodes {
                if predicate::is_inline(tree, *node) {
                    targets.push(*node);
                } else {
                    targets.extend(tree.walk_all().descendants(*node, predicate::is_inline));
                }
            }
            for target in targets {
                tree.modifiers_mut(target)?.prepend(modifier.clone());
            }
            Ok(())
        })?;
        Ok(nodes)
    }
}

/// Known block elements.
pub struct BlockParser;

#[async_trait(?Send)]
impl Parser<DomFormat> for BlockParser {
    fn predicate(&self) -> Option<fn(&DomItem) -> bool> {
        Some(is_block_element)
    }

    async fn parse(&self, ctx: &ParseContext<'_, DomFormat>, item: &DomItem) -> EngineResult<Vec<NodeId>> {
        let tag = item.tag().unwrap_or("DIV");
        parse_container(ctx, item, NodeKind::block(tag)).await
    }
}

/// Default: any element becomes a container named after its tag, and text
/// becomes characters.
pub struct ElementParser;

#[async_trait(?Send)]
impl Parser<DomFormat> for ElementParser {
    async fn parse(&self, ctx: &ParseContext<'_, DomFormat>, item: &DomItem) -> EngineResult<Vec<NodeId>> {
        match item.tag() {
            Some(tag) => parse_container(ctx, item, NodeKind::block(tag)).await,
            None => TextParser.parse(ctx, item).await,
        }
    }
}
