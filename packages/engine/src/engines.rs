//! Registry of parsing and rendering engines, keyed by engine id.
//!
//! Engines of different formats live side by side; typed access goes through
//! a downcast, so asking for an engine with the wrong format is an error
//! rather than a panic.

use crate::error::{EngineError, EngineResult};
use crate::format::Format;
use crate::mapping::Mapping;
use crate::parsing::{ParseContext, Parser, ParsingEngine};
use crate::rendering::{ModifierRenderer, RenderChain, RenderContext, Renderer, RenderingEngine};
use folio_model::{NodeId, Tree};
use smol_str::SmolStr;
use std::any::{type_name, Any};
use std::collections::HashMap;
use std::rc::Rc;
use tracing::{debug, instrument, warn};

/// A stored engine of any format.
trait EngineSlot {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn save_mapping(&self) -> Box<dyn Any>;
    fn restore_mapping(&mut self, saved: Box<dyn Any>);
}

impl<F: Format> EngineSlot for ParsingEngine<F> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn save_mapping(&self) -> Box<dyn Any> {
        Box::new(self.mapping().clone())
    }

    fn restore_mapping(&mut self, saved: Box<dyn Any>) {
        if let Ok(mapping) = saved.downcast::<Mapping<F::Key>>() {
            *self.mapping_mut() = *mapping;
        }
    }
}

impl<F: Format> EngineSlot for RenderingEngine<F> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn save_mapping(&self) -> Box<dyn Any> {
        Box::new(self.mapping().clone())
    }

    fn restore_mapping(&mut self, saved: Box<dyn Any>) {
        if let Ok(mapping) = saved.downcast::<Mapping<F::Key>>() {
            *self.mapping_mut() = *mapping;
        }
    }
}

/// Copy of every engine's mapping table, taken by [`Engines::save_mappings`].
pub struct SavedMappings {
    parsing: Vec<(SmolStr, Box<dyn Any>)>,
    rendering: Vec<(SmolStr, Box<dyn Any>)>,
}

#[derive(Default)]
pub struct Engines {
    parsing: HashMap<SmolStr, Box<dyn EngineSlot>>,
    rendering: HashMap<SmolStr, Box<dyn EngineSlot>>,
}

impl Engines {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_parsing_engine<F: Format>(&mut self, engine: ParsingEngine<F>) -> EngineResult<()> {
        let id = engine.id().clone();
        if self.parsing.contains_key(&id) {
            return Err(EngineError::DuplicateEngine(id));
        }
        if let Some(base) = engine.extends() {
            self.parsing_engine::<F>(base)?;
        }
        debug!(engine = %id, extends = ?engine.extends(), "Added parsing engine");
        self.parsing.insert(id, Box::new(engine));
        Ok(())
    }

    pub fn add_rendering_engine<F: Format>(&mut self, engine: RenderingEngine<F>) -> EngineResult<()> {
        let id = engine.id().clone();
        if self.rendering.contains_key(&id) {
            return Err(EngineError::DuplicateEngine(id));
        }
        if let Some(base) = engine.extends() {
            self.rendering_engine::<F>(base)?;
        }
        debug!(engine = %id, extends = ?engine.extends(), "Added rendering engine");
        self.rendering.insert(id, Box::new(engine));
        Ok(())
    }

    pub fn has_parsing_engine(&self, id: &str) -> bool {
        self.parsing.contains_key(id)
    }

    pub fn has_rendering_engine(&self, id: &str) -> bool {
        self.rendering.contains_key(id)
    }

    pub fn parsing_engine<F: Format>(&self, id: &str) -> EngineResult<&ParsingEngine<F>> {
        self.parsing
            .get(id)
            .ok_or_else(|| EngineError::UnknownEngine(SmolStr::new(id)))?
            .as_any()
            .downcast_ref::<ParsingEngine<F>>()
            .ok_or_else(|| mismatch::<F>(id))
    }

    pub fn parsing_engine_mut<F: Format>(&mut self, id: &str) -> EngineResult<&mut ParsingEngine<F>> {
        self.parsing
            .get_mut(id)
            .ok_or_else(|| EngineError::UnknownEngine(SmolStr::new(id)))?
            .as_any_mut()
            .downcast_mut::<ParsingEngine<F>>()
            .ok_or_else(|| mismatch::<F>(id))
    }

    pub fn rendering_engine<F: Format>(&self, id: &str) -> EngineResult<&RenderingEngine<F>> {
        self.rendering
            .get(id)
            .ok_or_else(|| EngineError::UnknownEngine(SmolStr::new(id)))?
            .as_any()
            .downcast_ref::<RenderingEngine<F>>()
            .ok_or_else(|| mismatch::<F>(id))
    }

    pub fn rendering_engine_mut<F: Format>(&mut self, id: &str) -> EngineResult<&mut RenderingEngine<F>> {
        self.rendering
            .get_mut(id)
            .ok_or_else(|| EngineError::UnknownEngine(SmolStr::new(id)))?
            .as_any_mut()
            .downcast_mut::<RenderingEngine<F>>()
            .ok_or_else(|| mismatch::<F>(id))
    }

    pub fn save_mappings(&self) -> SavedMappings {
        let save = |slots: &HashMap<SmolStr, Box<dyn EngineSlot>>| -> Vec<(SmolStr, Box<dyn Any>)> {
            slots
                .iter()
                .map(|(id, engine)| (id.clone(), engine.save_mapping()))
                .collect()
        };
        SavedMappings {
            parsing: save(&self.parsing),
            rendering: save(&self.rendering),
        }
    }

    /// Put back the mappings of `saved`. Engines added since keep theirs.
    pub fn restore_mappings(&mut self, saved: SavedMappings) {
        for (id, mapping) in saved.parsing {
            if let Some(engine) = self.parsing.get_mut(&id) {
                engine.restore_mapping(mapping);
            }
        }
        for (id, mapping) in saved.rendering {
            if let Some(engine) = self.rendering.get_mut(&id) {
                engine.restore_mapping(mapping);
            }
        }
    }

    /// Own handlers, then each base's handlers, then the engine's default.
    fn parser_chain<F: Format>(&self, id: &str) -> EngineResult<Vec<Rc<dyn Parser<F>>>> {
        let engine = self.parsing_engine::<F>(id)?;
        let default = engine.default_handler().clone();
        let mut chain = Vec::new();
        let mut current = Some(engine);
        while let Some(engine) = current {
            chain.extend(engine.handlers().iter().cloned());
            current = match engine.extends() {
                Some(base) => Some(self.parsing_engine::<F>(base)?),
                None => None,
            };
        }
        chain.push(default);
        Ok(chain)
    }

    fn render_chain<F: Format>(&self, id: &str) -> EngineResult<RenderChain<F>> {
        let engine = self.rendering_engine::<F>(id)?;
        let default = engine.default_handler().clone();
        let mut modifier_default = engine.modifier_default().cloned();
        let mut chain = RenderChain {
            nodes: Vec::new(),
            modifiers: Vec::new(),
        };
        let mut current = Some(engine);
        while let Some(engine) = current {
            chain.nodes.extend(engine.handlers().iter().cloned());
            chain.modifiers.extend(engine.modifier_handlers().iter().cloned());
            if modifier_default.is_none() {
                modifier_default = engine.modifier_default().cloned();
            }
            current = match engine.extends() {
                Some(base) => Some(self.rendering_engine::<F>(base)?),
                None => None,
            };
        }
        chain.nodes.push(default);
        chain.modifiers.extend(modifier_default);
        Ok(chain)
    }

    /// Parse `items` into detached nodes and record the item ↔ node links on
    /// the engine. On failure every node created by the call is removed.
    #[instrument(level = "debug", skip(self, tree, items), fields(items = items.len()))]
    pub async fn parse<F: Format>(
        &mut self,
        engine: &str,
        tree: &mut Tree,
        items: &[F::Item],
    ) -> EngineResult<Vec<NodeId>> {
        let chain = self.parser_chain::<F>(engine)?;
        let ctx = ParseContext::new(SmolStr::new(engine), tree, &chain);
        let result = ctx.parse(items).await;
        match result {
            Ok(nodes) => {
                let links = ctx.into_links();
                let mapping = self.parsing_engine_mut::<F>(engine)?.mapping_mut();
                for (key, node) in links {
                    mapping.link(key, node);
                }
                debug!(nodes = nodes.len(), "Parsed");
                Ok(nodes)
            }
            Err(err) => {
                warn!(error = %err, "Parse failed");
                ctx.rollback();
                Err(err)
            }
        }
    }

    /// Parse `items` and append the resulting nodes to `parent`.
    pub async fn parse_into<F: Format>(
        &mut self,
        engine: &str,
        tree: &mut Tree,
        parent: NodeId,
        items: &[F::Item],
    ) -> EngineResult<Vec<NodeId>> {
        let nodes = self.parse::<F>(engine, tree, items).await?;
        if let Err(err) = tree.append(parent, &nodes) {
            for node in &nodes {
                tree.remove(*node);
            }
            return Err(err.into());
        }
        Ok(nodes)
    }

    /// Render `nodes` as siblings and refresh the engine's mapping for them.
    #[instrument(level = "debug", skip(self, tree, nodes), fields(nodes = nodes.len()))]
    pub async fn render<F: Format>(
        &mut self,
        engine: &str,
        tree: &Tree,
        nodes: &[NodeId],
    ) -> EngineResult<Vec<F::Item>> {
        let chain = self.render_chain::<F>(engine)?;
        let ctx = RenderContext::new(SmolStr::new(engine), tree, &chain);
        let items = ctx.render(nodes).await?;
        let links = ctx.into_links();

        let mapping = self.rendering_engine_mut::<F>(engine)?.mapping_mut();
        mapping.retain_live(tree);
        for (_, node) in &links {
            mapping.forget_node(*node);
        }
        for (key, node) in links {
            mapping.link(key, node);
        }
        Ok(items)
    }

    pub fn register_parser<F: Format>(
        &mut self,
        engine: &str,
        handler: impl Parser<F> + 'static,
    ) -> EngineResult<()> {
        self.parsing_engine_mut::<F>(engine)?.register(handler)
    }

    pub fn register_renderer<F: Format>(
        &mut self,
        engine: &str,
        handler: impl Renderer<F> + 'static,
    ) -> EngineResult<()> {
        self.rendering_engine_mut::<F>(engine)?.register(handler)
    }

    pub fn register_modifier_renderer<F: Format>(
        &mut self,
        engine: &str,
        handler: impl ModifierRenderer<F> + 'static,
    ) -> EngineResult<()> {
        self.rendering_engine_mut::<F>(engine)?.register_modifier(handler)
    }
}

fn mismatch<F: Format>(id: &str) -> EngineError {
    EngineError::FormatMismatch {
        id: SmolStr::new(id),
        expected: type_name::<F>(),
    }
}

/// A deferred change to an [`Engines`] registry: adding an engine or a
/// handler. Plugins hand these out as loadables.
pub struct Registration {
    engine: SmolStr,
    description: &'static str,
    apply: Box<dyn FnOnce(&mut Engines) -> EngineResult<()>>,
}

impl Registration {
    pub fn parsing_engine<F: Format>(engine: ParsingEngine<F>) -> Self {
        Self {
            engine: engine.id().clone(),
            description: "parsing engine",
            apply: Box::new(move |engines| engines.add_parsing_engine(engine)),
        }
    }

    pub fn rendering_engine<F: Format>(engine: RenderingEngine<F>) -> Self {
        Self {
            engine: engine.id().clone(),
            description: "rendering engine",
            apply: Box::new(move |engines| engines.add_rendering_engine(engine)),
        }
    }

    pub fn parser<F: Format>(engine: impl Into<SmolStr>, handler: impl Parser<F> + 'static) -> Self {
        let engine = engine.into();
        let id = engine.clone();
        Self {
            engine,
            description: "parser",
            apply: Box::new(move |engines| engines.register_parser(&id, handler)),
        }
    }

    pub fn renderer<F: Format>(engine: impl Into<SmolStr>, handler: impl Renderer<F> + 'static) -> Self {
        let engine = engine.into();
        let id = engine.clone();
        Self {
            engine,
            description: "renderer",
            apply: Box::new(move |engines| engines.register_renderer(&id, handler)),
        }
    }

    pub fn modifier_renderer<F: Format>(
        engine: impl Into<SmolStr>,
        handler: impl ModifierRenderer<F> + 'static,
    ) -> Self {
        let engine = engine.into();
        let id = engine.clone();
        Self {
            engine,
            description: "modifier renderer",
            apply: Box::new(move |engines| engines.register_modifier_renderer(&id, handler)),
        }
    }

    pub fn engine(&self) -> &str {
        &self.engine
    }

    pub fn description(&self) -> &'static str {
        self.description
    }

    pub fn apply(self, engines: &mut Engines) -> EngineResult<()> {
        (self.apply)(engines)
    }
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("engine", &self.engine)
            .field("description", &self.description)
            .finish()
    }
}
