//! # Parsing
//!
//! A [`ParsingEngine`] turns external items into tree nodes. It holds an
//! ordered list of [`Parser`] handlers plus a default one; each item is given
//! to the first handler whose predicate accepts it, latest registration
//! first, falling back to the default.
//!
//! Handlers receive a [`ParseContext`] so they can create nodes and recurse
//! into child items. Sibling items are resolved concurrently and joined back
//! in input order.

use crate::error::{EngineError, EngineResult};
use crate::format::Format;
use crate::mapping::Mapping;
use async_trait::async_trait;
use folio_model::{Modifiers, NodeId, NodeKind, Tree};
use futures::future::join_all;
use smol_str::SmolStr;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{debug, trace};

/// Item selector used by registered handlers.
pub type ItemPredicate<T> = fn(&T) -> bool;

/// Converts one external item into nodes.
#[async_trait(?Send)]
pub trait Parser<F: Format> {
    /// Items this handler accepts. `None` makes it a catch-all, which only an
    /// engine's default handler may be.
    fn predicate(&self) -> Option<ItemPredicate<F::Item>> {
        None
    }

    /// Produce the nodes for `item`. Returned nodes must be detached; the
    /// caller decides where they go.
    async fn parse(&self, ctx: &ParseContext<'_, F>, item: &F::Item) -> EngineResult<Vec<NodeId>>;

    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// An engine id, its optional base, and its handlers.
pub struct ParsingEngine<F: Format> {
    id: SmolStr,
    extends: Option<SmolStr>,
    handlers: Vec<Rc<dyn Parser<F>>>,
    default: Rc<dyn Parser<F>>,
    mapping: Mapping<F::Key>,
}

impl<F: Format> ParsingEngine<F> {
    pub fn new(id: impl Into<SmolStr>, default: impl Parser<F> + 'static) -> EngineResult<Self> {
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
            mapping: Mapping::new(),
        })
    }

    /// An engine that falls back to `base`'s handlers after its own. The base
    /// must be registered first and use the same format.
    pub fn extending(
        id: impl Into<SmolStr>,
        base: impl Into<SmolStr>,
        default: impl Parser<F> + 'static,
    ) -> EngineResult<Self> {
        let mut engine = Self::new(id, default)?;
        engine.extends = Some(base.into());
        Ok(engine)
    }

    pub fn id(&self) -> &SmolStr {
        &self.id
    }

    pub fn extends(&self) -> Option<&SmolStr> {
        self.extends.as_ref()
    }

    /// Register a handler ahead of every earlier one.
    pub fn register(&mut self, handler: impl Parser<F> + 'static) -> EngineResult<()> {
        self.register_rc(Rc::new(handler))
    }

    pub fn register_rc(&mut self, handler: Rc<dyn Parser<F>>) -> EngineResult<()> {
        if handler.predicate().is_none() {
            return Err(EngineError::MissingPredicate {
                engine: self.id.clone(),
                handler: handler.name(),
            });
        }
        debug!(engine = %self.id, handler = handler.name(), "Registered parser");
        self.handlers.insert(0, handler);
        Ok(())
    }

    pub fn handlers(&self) -> &[Rc<dyn Parser<F>>] {
        &self.handlers
    }

    pub fn default_handler(&self) -> &Rc<dyn Parser<F>> {
        &self.default
    }

    /// Items parsed by this engine and the nodes they produced.
    pub fn mapping(&self) -> &Mapping<F::Key> {
        &self.mapping
    }

    pub fn mapping_mut(&mut self) -> &mut Mapping<F::Key> {
        &mut self.mapping
    }
}

/// State shared by the handlers of one parse call.
pub struct ParseContext<'a, F: Format> {
    engine: SmolStr,
    tree: RefCell<&'a mut Tree>,
    chain: &'a [Rc<dyn Parser<F>>],
    created: RefCell<Vec<NodeId>>,
    links: RefCell<Vec<(F::Key, NodeId)>>,
}

impl<'a, F: Format> ParseContext<'a, F> {
    pub(crate) fn new(engine: SmolStr, tree: &'a mut Tree, chain: &'a [Rc<dyn Parser<F>>]) -> Self {
        Self {
            engine,
            tree: RefCell::new(tree),
            chain,
            created: RefCell::new(Vec::new()),
            links: RefCell::new(Vec::new()),
        }
    }

    pub fn engine(&self) -> &str {
        &self.engine
    }

    pub fn create(&self, kind: NodeKind) -> NodeId {
        self.create_with(kind, Modifiers::new())
    }

    pub fn create_with(&self, kind: NodeKind, modifiers: Modifiers) -> NodeId {
        let node = self.tree.borrow_mut().create_with(kind, modifiers);
        self.created.borrow_mut().push(node);
        node
    }

    pub fn append(&self, parent: NodeId, children: &[NodeId]) -> EngineResult<()> {
        self.tree.borrow_mut().append(parent, children)?;
        Ok(())
    }

    /// Run `f` with the tree borrowed. Do not hold the borrow across an
    /// await point.
    pub fn with_tree<R>(&self, f: impl FnOnce(&mut Tree) -> R) -> R {
        let mut tree = self.tree.borrow_mut();
        f(&mut tree)
    }

    /// Parse sibling items concurrently. Nodes come back in input order.
    pub async fn parse(&self, items: &[F::Item]) -> EngineResult<Vec<NodeId>> {
        let results = join_all(items.iter().map(|item| self.parse_item(item))).await;
        let mut nodes = Vec::new();
        for result in results {
            nodes.extend(result?);
        }
        Ok(nodes)
    }

    pub async fn parse_item(&self, item: &F::Item) -> EngineResult<Vec<NodeId>> {
        let handler = self.resolve(item)?;
        trace!(engine = %self.engine, handler = handler.name(), "Parsing item");
        let nodes = handler.parse(self, item).await?;

        let key = F::key(item);
        let mut links = self.links.borrow_mut();
        for node in &nodes {
            links.push((key.clone(), *node));
        }
        Ok(nodes)
    }

    fn resolve(&self, item: &F::Item) -> EngineResult<&Rc<dyn Parser<F>>> {
        self.chain
            .iter()
            .find(|handler| handler.predicate().map_or(true, |accepts| accepts(item)))
            .ok_or_else(|| EngineError::NoHandler {
                engine: self.engine.clone(),
            })
    }

    /// Remove every node this call created.
    pub(crate) fn rollback(self) {
        let created = self.created.into_inner();
        let tree = self.tree.into_inner();
        debug!(nodes = created.len(), "Rolling back parse");
        for node in created {
            tree.remove(node);
        }
    }

    pub(crate) fn into_links(self) -> Vec<(F::Key, NodeId)> {
        self.links.into_inner()
    }
}
