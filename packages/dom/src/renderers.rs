//! Renderers of the `dom` engine.

use crate::item::{DomElement, DomFormat, DomId, DomItem, DomText};
use folio_engine::{async_trait, EngineError, EngineResult, ModifierRenderer, RenderContext, Renderer};
use folio_model::{predicate, Attributes, Modifier, NodeId, NodeKind, Tree};
use smol_str::SmolStr;

fn element(tag: &str, attributes: Attributes, children: Vec<DomItem>) -> DomItem {
    DomItem::Element(DomElement {
        id: DomId::next(),
        tag: SmolStr::new(tag.to_ascii_uppercase()),
        attributes,
        children,
        placeholder: false,
    })
}

/// Attribute modifiers of a container merged into one set.
fn container_attributes(tree: &Tree, node: NodeId) -> Attributes {
    let mut attributes = Attributes::new();
    if let Some(modifiers) = tree.modifiers(node) {
        for modifier in modifiers.iter().filter(|modifier| !matches!(modifier, Modifier::Format { .. })) {
            for (name, value) in modifier.attrs().iter() {
                attributes.set(name, value);
            }
        }
    }
    attributes
}

/// Default: containers become elements named after their kind. Fragments
/// render their children without a wrapper.
pub struct ContainerRenderer;

#[async_trait(?Send)]
impl Renderer<DomFormat> for ContainerRenderer {
    async fn render(&self, ctx: &RenderContext<'_, DomFormat>, node: NodeId) -> EngineResult<Vec<DomItem>> {
        let tree = ctx.tree();
        let kind = tree.kind(node).ok_or(EngineError::UnknownNode(node))?;
        let mut children = ctx.render_children(node).await?;
        if matches!(kind, NodeKind::Fragment) {
            return Ok(children);
        }

        // A block-final line break needs a second <br> to show an empty line
        let last = tree.walk().last_child(node, predicate::any);
        if last.map_or(false, |last| predicate::is_line_break(tree, last)) {
            let mut placeholder = element("BR", Attributes::new(), Vec::new());
            if let DomItem::Element(br) = &mut placeholder {
                br.placeholder = true;
            }
            children.push(placeholder);
        }

        Ok(vec![element(kind.name(), container_attributes(tree, node), children)])
    }

    async fn render_batch(
        &self,
        ctx: &RenderContext<'_, DomFormat>,
        nodes: &[NodeId],
    ) -> EngineResult<Vec<DomItem>> {
        let mut items = Vec::new();
        for node in nodes {
            let rendered = self.render(ctx, *node).await?;
            // A fragment's items belong to its children
            if !matches!(ctx.tree().kind(*node), Some(NodeKind::Fragment)) {
                ctx.link(*node, &rendered);
            }
            items.extend(rendered);
        }
        Ok(items)
    }
}

/// Adjacent characters render as one text item.
pub struct CharRenderer;

#[async_trait(?Send)]
impl Renderer<DomFormat> for CharRenderer {
    fn predicate(&self) -> Option<fn(&Tree, NodeId) -> bool> {
        Some(predicate::is_char)
    }

    async fn render(&self, ctx: &RenderContext<'_, DomFormat>, node: NodeId) -> EngineResult<Vec<DomItem>> {
        self.render_batch(ctx, &[node]).await
    }

    async fn render_batch(
        &self,
        ctx: &RenderContext<'_, DomFormat>,
        nodes: &[NodeId],
    ) -> EngineResult<Vec<DomItem>> {
        let tree = ctx.tree();
        let text: String = nodes
            .iter()
            .filter_map(|node| tree.kind(*node).and_then(NodeKind::as_char))
            .collect();
        let items = vec![DomItem::Text(DomText {
            id: DomId::next(),
            text,
        })];
        for node in nodes {
            ctx.link(*node, &items);
        }
        Ok(items)
    }
}

pub struct LineBreakRenderer;

#[async_trait(?Send)]
impl Renderer<DomFormat> for LineBreakRenderer {
    fn predicate(&self) -> Option<fn(&Tree, NodeId) -> bool> {
        Some(predicate::is_line_break)
    }

    async fn render(&self, _ctx: &RenderContext<'_, DomFormat>, _node: NodeId) -> EngineResult<Vec<DomItem>> {
        Ok(vec![element("BR", Attributes::new(), Vec::new())])
    }
}

/// Default modifier wrapper: a format becomes an element of the same name,
/// an attribute bag becomes a `<span>`.
pub struct FormatRenderer;

#[async_trait(?Send)]
impl ModifierRenderer<DomFormat> for FormatRenderer {
    async fn render(
        &self,
        _ctx: &RenderContext<'_, DomFormat>,
        modifier: &Modifier,
        contents: Vec<DomItem>,
        _nodes: &[NodeId],
    ) -> EngineResult<Vec<DomItem>> {
        let tag = modifier.name().unwrap_or("SPAN");
        Ok(vec![element(tag, modifier.attrs().clone(), contents)])
    }
}
