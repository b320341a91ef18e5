//! Editor integration: registers the `dom` and `text` engines and keeps the
//! last loaded or rendered surface in the session, so flat selections can be
//! mapped back and a failed command puts the previous surface back.

use crate::engines::{dom_parsing_engine, dom_rendering_engine};
use crate::error::DomResult;
use crate::html::DomRenderOptions;
use crate::item::{DomFormat, DomId};
use crate::surface::{DomSelection, Surface};
use crate::text::{render_plain_text, text_parsing_engine, text_rendering_engine};
use folio_engine::{async_trait, Format, Mapping, Registration};
use folio_model::{predicate, Range};
use folio_runtime::builtin::{CorePlugin, ENGINES};
use folio_runtime::{
    Command, CommandContext, CommandError, CommandHandler, CommandResult, EditorState, Loadables, Plugin,
    PluginConfig, PluginDefinition, PluginType, RuntimeResult,
};
use serde::Deserialize;
use serde_json::Value;
use std::rc::Rc;
use tracing::debug;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DomConfig {
    pub render: DomRenderOptions,
}

/// Which engine's mapping the current surface was produced with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Origin {
    Parsed,
    Rendered,
}

/// Session extension holding the surface selections are mapped against.
#[derive(Debug, Clone)]
struct CurrentSurface {
    surface: Rc<Surface>,
    origin: Origin,
}

impl CurrentSurface {
    fn store(state: &mut EditorState, surface: Surface, origin: Origin) {
        state.extensions.insert(CurrentSurface {
            surface: Rc::new(surface),
            origin,
        });
    }

    fn resolve<'s>(&'s self, state: &'s EditorState) -> DomResult<(&'s Surface, &'s Mapping<DomId>)> {
        let mapping = match self.origin {
            Origin::Parsed => state.engines.parsing_engine::<DomFormat>(DomFormat::ID)?.mapping(),
            Origin::Rendered => state.engines.rendering_engine::<DomFormat>(DomFormat::ID)?.mapping(),
        };
        Ok((&self.surface, mapping))
    }
}

pub struct DomPlugin {
    config: DomConfig,
}

impl PluginDefinition for DomPlugin {
    const ID: &'static str = "dom";

    fn dependencies() -> Vec<PluginType> {
        vec![PluginType::of::<CorePlugin>()]
    }

    fn create(config: &PluginConfig) -> RuntimeResult<Self> {
        Ok(Self {
            config: config.parse()?,
        })
    }
}

impl Plugin for DomPlugin {
    fn commands(&self) -> Vec<Command> {
        vec![
            Command::new("loadHtml", LoadHtml).with_title("Load HTML"),
            Command::new("selectDom", SelectDom).with_title("Select surface range"),
        ]
    }

    fn loadables(&self) -> RuntimeResult<Loadables> {
        Ok(Loadables::new()
            .with(ENGINES, Registration::parsing_engine(dom_parsing_engine()?))
            .with(ENGINES, Registration::rendering_engine(dom_rendering_engine()?))
            .with(ENGINES, Registration::parsing_engine(text_parsing_engine()?))
            .with(ENGINES, Registration::rendering_engine(text_rendering_engine()?)))
    }
}

impl DomPlugin {
    pub fn options(&self) -> &DomRenderOptions {
        &self.config.render
    }

    /// Replace the document with `html`.
    pub async fn load_html(&self, state: &mut EditorState, html: &str) -> DomResult<()> {
        load_document(state, html).await
    }

    /// Render the document and remember the surface for selection mapping.
    pub async fn render_html(&self, state: &mut EditorState) -> DomResult<String> {
        let surface = Surface::render(&mut state.engines, &state.tree).await?;
        let html = surface.to_html(&self.config.render);
        CurrentSurface::store(state, surface, Origin::Rendered);
        Ok(html)
    }

    pub async fn render_text(&self, state: &mut EditorState) -> DomResult<String> {
        Ok(render_plain_text(&mut state.engines, &state.tree).await?)
    }

    /// Flat selection of the session selection on the current surface.
    pub fn selection(&self, state: &EditorState) -> DomResult<Option<DomSelection>> {
        let Some(current) = state.extensions.get::<CurrentSurface>() else {
            return Ok(None);
        };
        let (surface, mapping) = current.resolve(state)?;
        Ok(Some(surface.locate_range(&state.tree, mapping, &state.selection)?))
    }
}

async fn load_document(state: &mut EditorState, html: &str) -> DomResult<()> {
    let surface = Surface::from_html(html)?;
    let root = state.tree.root();
    let previous = state.tree.walk_all().children(root, predicate::any);
    for child in previous {
        state.tree.remove(child);
    }
    state
        .engines
        .parsing_engine_mut::<DomFormat>(DomFormat::ID)?
        .mapping_mut()
        .retain_live(&state.tree);

    let nodes = surface.load(&mut state.engines, &mut state.tree).await?;
    state.selection = Range::at_start(&state.tree)?;
    CurrentSurface::store(state, surface, Origin::Parsed);
    debug!(nodes = nodes.len(), "Loaded document from HTML");
    Ok(())
}

#[derive(Deserialize)]
struct LoadHtmlArgs {
    html: String,
}

/// `loadHtml { html }`
struct LoadHtml;

#[async_trait(?Send)]
impl CommandHandler for LoadHtml {
    async fn execute(&self, ctx: &mut CommandContext<'_>, args: &Value) -> CommandResult<()> {
        let args: LoadHtmlArgs = ctx.args(args)?;
        let command = ctx.command.clone();
        load_document(ctx.state, &args.html)
            .await
            .map_err(|err| CommandError::rejected(command, err.to_string()))
    }
}

/// `selectDom { anchor, focus, direction }`: map a flat selection on the
/// current surface to the session selection.
struct SelectDom;

#[async_trait(?Send)]
impl CommandHandler for SelectDom {
    async fn execute(&self, ctx: &mut CommandContext<'_>, args: &Value) -> CommandResult<()> {
        let selection: DomSelection = ctx.args(args)?;
        let current = ctx
            .state
            .extensions
            .get::<CurrentSurface>()
            .cloned()
            .ok_or_else(|| ctx.reject("no surface has been loaded or rendered"))?;

        let range = current
            .resolve(ctx.state)
            .and_then(|(surface, mapping)| surface.resolve_selection(&ctx.state.tree, mapping, &selection))
            .map_err(|err| CommandError::rejected(ctx.command.clone(), err.to_string()))?;
        ctx.state.selection = range;
        Ok(())
    }
}
