//! # Rendering
//!
//! A [`RenderingEngine`] turns tree nodes into external items. Node handlers
//! ([`Renderer`]) are resolved like parsers: latest registration first, then
//! the default. Inline siblings are rendered as runs: adjacent nodes sharing
//! a structurally equal modifier at the same depth are wrapped once by a
//! [`ModifierRenderer`], so `<b>ab</b>` comes out as one element rather than
//! one per character.

use crate::error::{EngineError, EngineResult};
use crate::format::Format;
use crate::mapping::Mapping;
use async_trait::async_trait;
use folio_model::{predicate, Modifier, NodeId, Tree};
use futures::future::{join_all, LocalBoxFuture};
use futures::FutureExt;
use smol_str::SmolStr;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{debug, trace};

pub type NodePredicate = fn(&Tree, NodeId) -> bool;
pub type ModifierPredicate = fn(&Modifier) -> bool;

/// Converts nodes into external items.
#[async_trait(?Send)]
pub trait Renderer<F: Format> {
    /// Nodes this handler accepts. `None` marks the engine default.
    fn predicate(&self) -> Option<NodePredicate> {
        None
    }

    async fn render(&self, ctx: &RenderContext<'_, F>, node: NodeId) -> EngineResult<Vec<F::Item>>;

    /// Render adjacent siblings that all resolved to this handler.
    ///
    /// Overrides that merge several nodes into one item are responsible for
    /// linking every node to it through [`RenderContext::link`].
    async fn render_batch(
        &self,
        ctx: &RenderContext<'_, F>,
        nodes: &[NodeId],
    ) -> EngineResult<Vec<F::Item>> {
        let rendered = join_all(nodes.iter().map(|node| self.render(ctx, *node))).await;
        let mut items = Vec::new();
        for (node, result) in nodes.iter().zip(rendered) {
            let result = result?;
            ctx.link(*node, &result);
            items.extend(result);
        }
        Ok(items)
    }

    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Wraps the rendering of a run of nodes sharing one modifier.
#[async_trait(?Send)]
pub trait ModifierRenderer<F: Format> {
    fn predicate(&self) -> Option<ModifierPredicate> {
        None
    }

    async fn render(
        &self,
        ctx: &RenderContext<'_, F>,
        modifier: &Modifier,
        contents: Vec<F::Item>,
        nodes: &[NodeId],
    ) -> EngineResult<Vec<F::Item>>;

    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

pub struct RenderingEngine<F: Format> {
    id: SmolStr,
    extends: Option<SmolStr>,
    handlers: Vec<Rc<dyn Renderer<F>>>,
    default: Rc<dyn Renderer<F>>,
    modifier_handlers: Vec<Rc<dyn ModifierRenderer<F>>>,
    modifier_default: Option<Rc<dyn ModifierRenderer<F>>>,
    mapping: Mapping<F::Key>,
}

impl<F: Format> RenderingEngine<F> {
    pub fn new(id: impl Into<SmolStr>, default: impl Renderer<F> + 'static) -> EngineResult<Self> {
        let id = id.into();
        if default.predicate().is_some() {
            return Err(EngineError::DefaultWithPredicate {
                engine: id,
                handler: default.name(),
            });
        }
        Ok(Self {
            id,
            extends: None,
            handlers: Vec::new(),
            default: Rc::new(default),
            modifier_handlers: Vec::new(),
            modifier_default: None,
            mapping: Mapping::new(),
        })
    }

    pub fn extending(
        id: impl Into<SmolStr>,
        base: impl Into<SmolStr>,
        default: impl Renderer<F> + 'static,
    ) -> EngineResult<Self> {
        let mut engine = Self::new(id, default)?;
        engine.extends = Some(base.into());
        Ok(engine)
    }

    /// Catch-all modifier wrapper. Without one, modifiers no handler accepts
    /// are rendered as their bare contents.
    pub fn with_modifier_default(
        mut self,
        default: impl ModifierRenderer<F> + 'static,
    ) -> EngineResult<Self> {
        if default.predicate().is_some() {
            return Err(EngineError::DefaultWithPredicate {
                engine: self.id.clone(),
                handler: default.name(),
            });
        }
        self.modifier_default = Some(Rc::new(default));
        Ok(self)
    }

    pub fn id(&self) -> &SmolStr {
        &self.id
    }

    pub fn extends(&self) -> Option<&SmolStr> {
        self.extends.as_ref()
    }

    pub fn register(&mut self, handler: impl Renderer<F> + 'static) -> EngineResult<()> {
        self.register_rc(Rc::new(handler))
    }

    pub fn register_rc(&mut self, handler: Rc<dyn Renderer<F>>) -> EngineResult<()> {
        if handler.predicate().is_none() {
            return Err(EngineError::MissingPredicate {
                engine: self.id.clone(),
                handler: handler.name(),
            });
        }
        debug!(engine = %self.id, handler = handler.name(), "Registered renderer");
        self.handlers.insert(0, handler);
        Ok(())
    }

    pub fn register_modifier(&mut self, handler: impl ModifierRenderer<F> + 'static) -> EngineResult<()> {
        if handler.predicate().is_none() {
            return Err(EngineError::MissingPredicate {
                engine: self.id.clone(),
                handler: handler.name(),
            });
        }
        debug!(engine = %self.id, handler = handler.name(), "Registered modifier renderer");
        self.modifier_handlers.insert(0, Rc::new(handler));
        Ok(())
    }

    pub fn handlers(&self) -> &[Rc<dyn Renderer<F>>] {
        &self.handlers
    }

    pub fn default_handler(&self) -> &Rc<dyn Renderer<F>> {
        &self.default
    }

    pub fn modifier_handlers(&self) -> &[Rc<dyn ModifierRenderer<F>>] {
        &self.modifier_handlers
    }

    pub fn modifier_default(&self) -> Option<&Rc<dyn ModifierRenderer<F>>> {
        self.modifier_default.as_ref()
    }

    /// Rendered items and the nodes each one came from.
    pub fn mapping(&self) -> &Mapping<F::Key> {
        &self.mapping
    }

    pub fn mapping_mut(&mut self) -> &mut Mapping<F::Key> {
        &mut self.mapping
    }
}

/// Resolved handler chains for one render call.
pub(crate) struct RenderChain<F: Format> {
    pub nodes: Vec<Rc<dyn Renderer<F>>>,
    pub modifiers: Vec<Rc<dyn ModifierRenderer<F>>>,
}

pub struct RenderContext<'a, F: Format> {
    engine: SmolStr,
    tree: &'a Tree,
    chain: &'a RenderChain<F>,
    links: RefCell<Vec<(F::Key, NodeId)>>,
}

impl<'a, F: Format> RenderContext<'a, F> {
    pub(crate) fn new(engine: SmolStr, tree: &'a Tree, chain: &'a RenderChain<F>) -> Self {
        Self {
            engine,
            tree,
            chain,
            links: RefCell::new(Vec::new()),
        }
    }

    pub fn engine(&self) -> &str {
        &self.engine
    }

    pub fn tree(&self) -> &'a Tree {
        self.tree
    }

    /// Record that `items` were rendered from `node`.
    pub fn link(&self, node: NodeId, items: &[F::Item]) {
        let mut links = self.links.borrow_mut();
        for item in items {
            links.push((F::key(item), node));
        }
    }

    /// Render `nodes` as siblings. Runs of inline nodes are grouped by
    /// modifier; everything else renders on its own.
    pub async fn render(&self, nodes: &[NodeId]) -> EngineResult<Vec<F::Item>> {
        let mut segments: Vec<LocalBoxFuture<'_, EngineResult<Vec<F::Item>>>> = Vec::new();
        let mut start = 0;
        while start < nodes.len() {
            let node = nodes[start];
            if !self.tree.contains(node) {
                return Err(EngineError::UnknownNode(node));
            }
            if predicate::is_inline(self.tree, node) {
                let mut end = start + 1;
                while end < nodes.len() && predicate::is_inline(self.tree, nodes[end]) {
                    end += 1;
                }
                segments.push(self.render_run(&nodes[start..end], 0));
                start = end;
            } else {
                segments.push(self.render_node(node).boxed_local());
                start += 1;
            }
        }

        let mut items = Vec::new();
        for result in join_all(segments).await {
            items.extend(result?);
        }
        Ok(items)
    }

    /// Render the tangible children of `node`.
    pub async fn render_children(&self, node: NodeId) -> EngineResult<Vec<F::Item>> {
        let children = self.tree.walk().children(node, predicate::any);
        self.render(&children).await
    }

    pub async fn render_node(&self, node: NodeId) -> EngineResult<Vec<F::Item>> {
        if !self.tree.contains(node) {
            return Err(EngineError::UnknownNode(node));
        }
        let handler = self.resolve(node)?;
        trace!(engine = %self.engine, handler = handler.name(), %node, "Rendering node");
        handler.render_batch(self, &[node]).await
    }

    fn render_run<'s>(
        &'s self,
        nodes: &'s [NodeId],
        depth: usize,
    ) -> LocalBoxFuture<'s, EngineResult<Vec<F::Item>>> {
        async move {
            let mut items = Vec::new();
            let mut start = 0;
            while start < nodes.len() {
                let mut end = start + 1;
                match self.modifier_at(nodes[start], depth) {
                    Some(modifier) => {
                        while end < nodes.len() && self.modifier_at(nodes[end], depth) == Some(modifier)
                        {
                            end += 1;
                        }
                        let run = &nodes[start..end];
                        let contents = self.render_run(run, depth + 1).await?;
                        match self.resolve_modifier(modifier) {
                            Some(handler) => {
                                let wrapped = handler.render(self, modifier, contents, run).await?;
                                for node in run {
                                    self.link(*node, &wrapped);
                                }
                                items.extend(wrapped);
                            }
                            None => items.extend(contents),
                        }
                    }
                    None => {
                        let handler = self.resolve(nodes[start])?;
                        while end < nodes.len()
                            && self.modifier_at(nodes[end], depth).is_none()
                            && Rc::ptr_eq(self.resolve(nodes[end])?, handler)
                        {
                            end += 1;
                        }
                        items.extend(handler.render_batch(self, &nodes[start..end]).await?);
                    }
                }
                start = end;
            }
            Ok(items)
        }
        .boxed_local()
    }

    fn modifier_at(&self, node: NodeId, depth: usize) -> Option<&'a Modifier> {
        self.tree.modifiers(node).and_then(|modifiers| modifiers.get(depth))
    }

    fn resolve(&self, node: NodeId) -> EngineResult<&'a Rc<dyn Renderer<F>>> {
        let tree = self.tree;
        self.chain
            .nodes
            .iter()
            .find(|handler| handler.predicate().map_or(true, |accepts| accepts(tree, node)))
            .ok_or_else(|| EngineError::NoHandler {
                engine: self.engine.clone(),
            })
    }

    fn resolve_modifier(&self, modifier: &Modifier) -> Option<&'a Rc<dyn ModifierRenderer<F>>> {
        self.chain
            .modifiers
            .iter()
            .find(|handler| handler.predicate().map_or(true, |accepts| accepts(modifier)))
    }

    pub(crate) fn into_links(self) -> Vec<(F::Key, NodeId)> {
        self.links.into_inner()
    }
}
