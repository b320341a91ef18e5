//! The `text` format: plain strings.
//!
//! Parsing maps `\n` to line breaks and every other character to a char
//! node. Rendering joins sibling blocks with `\n`, so a document of
//! paragraphs reads back as one line per paragraph.

use crate::item::DomId;
use folio_engine::{
    async_trait, EngineError, EngineResult, Engines, Format, ParseContext, Parser, ParsingEngine,
    RenderContext, Renderer, RenderingEngine,
};
use folio_model::{predicate, NodeId, NodeKind, Tree};

#[derive(Debug, Clone, PartialEq)]
pub struct TextChunk {
    pub id: DomId,
    pub text: String,
}

impl TextChunk {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: DomId::next(),
            text: text.into(),
        }
    }
}

pub struct TextFormat;

impl Format for TextFormat {
    const ID: &'static str = "text";
    type Item = TextChunk;
    type Key = DomId;

    fn key(item: &TextChunk) -> DomId {
        item.id
    }
}

pub struct PlainTextParser;

#[async_trait(?Send)]
impl Parser<TextFormat> for PlainTextParser {
    async fn parse(&self, ctx: &ParseContext<'_, TextFormat>, item: &TextChunk) -> EngineResult<Vec<NodeId>> {
        if item.text.is_empty() {
            return Ok(vec![ctx.create(NodeKind::Marker)]);
        }
        Ok(item
            .text
            .chars()
            .map(|ch| match ch {
                '\n' => ctx.create(NodeKind::LineBreak),
                ch => ctx.create(NodeKind::char(ch)),
            })
            .collect())
    }
}

pub struct PlainTextRenderer;

#[async_trait(?Send)]
impl Renderer<TextFormat> for PlainTextRenderer {
    async fn render(&self, ctx: &RenderContext<'_, TextFormat>, node: NodeId) -> EngineResult<Vec<TextChunk>> {
        let tree = ctx.tree();
        let kind = tree.kind(node).ok_or(EngineError::UnknownNode(node))?;
        let text = match kind {
            NodeKind::Char { ch } => ch.to_string(),
            NodeKind::LineBreak => "\n".to_string(),
            _ if predicate::is_container(tree, node) => {
                let children = tree.walk().children(node, predicate::any);
                let mut text = String::new();
                let mut previous_block = false;
                for child in children {
                    let block = !predicate::is_inline(tree, child);
                    if !text.is_empty() && (block || previous_block) {
                        text.push('\n');
                    }
                    for chunk in ctx.render(&[child]).await? {
                        text.push_str(&chunk.text);
                    }
                    previous_block = block;
                }
                text
            }
            _ => String::new(),
        };
        Ok(vec![TextChunk::new(text)])
    }
}

pub fn text_parsing_engine() -> EngineResult<ParsingEngine<TextFormat>> {
    ParsingEngine::new(TextFormat::ID, PlainTextParser)
}

pub fn text_rendering_engine() -> EngineResult<RenderingEngine<TextFormat>> {
    RenderingEngine::new(TextFormat::ID, PlainTextRenderer)
}

/// Render the whole document as one string, blocks on their own lines.
pub async fn render_plain_text(engines: &mut Engines, tree: &Tree) -> EngineResult<String> {
    let chunks = engines.render::<TextFormat>(TextFormat::ID, tree, &[tree.root()]).await?;
    Ok(chunks.into_iter().map(|chunk| chunk.text).collect())
}
