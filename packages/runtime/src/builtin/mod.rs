//! The core plugin: always loaded first. It owns the engine registration
//! categories and provides the basic editing commands.

mod edit;

use crate::command::{Command, CommandContext};
use crate::editor::EditorState;
use crate::error::{CommandResult, RuntimeError, RuntimeResult};
use crate::loadables::Loadable;
use crate::plugin::{Plugin, PluginConfig, PluginDefinition};
use folio_engine::Registration;
use folio_model::{Position, Range};
use serde::Deserialize;
use serde_json::Value;
use smol_str::SmolStr;
use tracing::{debug, info};

/// Engine definitions (`Registration::parsing_engine` / `rendering_engine`).
pub const ENGINES: &str = "engines";
/// Extra parsers for already defined engines.
pub const PARSERS: &str = "parsers";
/// Extra renderers and modifier renderers.
pub const RENDERERS: &str = "renderers";

#[derive(Debug, Default)]
pub struct CorePlugin;

impl PluginDefinition for CorePlugin {
    const ID: &'static str = "core";

    fn create(_config: &PluginConfig) -> RuntimeResult<Self> {
        Ok(CorePlugin)
    }
}

impl Plugin for CorePlugin {
    fn commands(&self) -> Vec<Command> {
        vec![
            Command::sync("setSelection", set_selection).with_title("Set selection"),
            Command::sync("insertText", edit::insert_text).with_title("Insert text"),
            Command::sync("insertLineBreak", edit::insert_line_break).with_title("Insert line break"),
            Command::sync("insertParagraphBreak", edit::insert_paragraph_break)
                .with_title("Insert paragraph break"),
            Command::sync("deleteBackward", edit::delete_backward).with_title("Delete backward"),
            Command::sync("deleteForward", edit::delete_forward).with_title("Delete forward"),
            Command::sync("toggleFormat", edit::toggle_format).with_title("Toggle format"),
        ]
    }

    fn loaders(&self) -> Vec<&'static str> {
        vec![ENGINES, PARSERS, RENDERERS]
    }

    fn load(&mut self, category: &str, entries: Vec<Loadable>, state: &mut EditorState) -> RuntimeResult<()> {
        for entry in entries {
            let source = SmolStr::new(entry.source());
            let registration = entry.downcast::<Registration>().map_err(|entry| RuntimeError::InvalidLoadable {
                category: SmolStr::new(category),
                message: format!("expected an engine registration from {}, got {}", source, entry.type_name()),
            })?;
            debug!(
                %category,
                %source,
                engine = registration.engine(),
                kind = registration.description(),
                "Applying registration"
            );
            if category == ENGINES {
                info!(engine = registration.engine(), kind = registration.description(), "Defining engine");
            }
            registration.apply(&mut state.engines)?;
        }
        Ok(())
    }
}

#[derive(Deserialize)]
struct SelectionArgs {
    anchor: Option<Position>,
    focus: Option<Position>,
}

/// `setSelection { anchor?, focus? }`: missing endpoints come from the
/// acting range. A lone anchor collapses onto it.
fn set_selection(ctx: &mut CommandContext<'_>, args: &Value) -> CommandResult<()> {
    let args: SelectionArgs = ctx.args(args)?;
    let anchor = args.anchor.unwrap_or_else(|| ctx.range.anchor());
    let focus = match (args.anchor, args.focus) {
        (_, Some(focus)) => focus,
        (Some(anchor), None) => anchor,
        (None, None) => ctx.range.focus(),
    };
    let selection = Range::new(&ctx.state.tree, anchor, focus)?;
    ctx.state.selection = selection;
    Ok(())
}
