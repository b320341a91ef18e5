//! # Editor session
//!
//! The [`Editor`] owns the plugins, the command table and the session state
//! (tree, selection, engines). Construction resolves the plugin order,
//! instantiates every plugin, delivers loadables to their owners and runs
//! the start hooks.
//!
//! Commands go through a FIFO queue: the state lives behind a
//! `tokio::sync::Mutex`, so a command issued while another is pending waits
//! for it to settle. A failing command restores everything it started from:
//! tree, selection, engine mappings and plugin extensions. Node ids it
//! handed out stay retired.

use crate::builtin::CorePlugin;
use crate::command::{Command, CommandContext, Hook, HookStage};
use crate::config::{EditorConfig, PluginSpec};
use crate::error::{CommandError, CommandResult, RuntimeError, RuntimeResult};
use crate::extensions::Extensions;
use crate::loadables::Loadable;
use crate::order::resolve_order;
use crate::plugin::{Plugin, PluginDefinition};
use folio_engine::Engines;
use folio_model::{Range, Tree};
use serde_json::Value;
use smol_str::SmolStr;
use std::collections::HashMap;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info, instrument, warn};

/// Mutable session state handed to commands, loaders and start hooks.
pub struct EditorState {
    pub tree: Tree,
    pub selection: Range,
    pub engines: Engines,
    /// Session values owned by plugins.
    pub extensions: Extensions,
}

impl EditorState {
    pub fn new() -> RuntimeResult<Self> {
        let tree = Tree::new();
        let selection = Range::at_start(&tree)?;
        Ok(Self {
            tree,
            selection,
            engines: Engines::new(),
            extensions: Extensions::new(),
        })
    }
}

struct LoadedPlugin {
    id: &'static str,
    plugin: Box<dyn Plugin>,
}

struct RegisteredCommand {
    command: Command,
    plugin: &'static str,
}

pub struct Editor {
    plugins: Vec<LoadedPlugin>,
    commands: HashMap<SmolStr, RegisteredCommand>,
    hooks: Vec<Hook>,
    state: Mutex<EditorState>,
}

impl Editor {
    /// Build a session from `config`. The core plugin is always loaded
    /// first.
    pub async fn new(config: EditorConfig) -> RuntimeResult<Self> {
        let mut specs = vec![PluginSpec::of::<CorePlugin>()];
        specs.extend(config.plugins);
        let order = resolve_order(&specs)?;

        let mut state = EditorState::new()?;
        let mut plugins: Vec<LoadedPlugin> = Vec::new();
        let mut commands: HashMap<SmolStr, RegisteredCommand> = HashMap::new();
        let mut hooks = Vec::new();
        let mut owners: Vec<(SmolStr, usize)> = Vec::new();
        let mut pending: Vec<(SmolStr, Loadable)> = Vec::new();

        for (plugin_type, plugin_config) in order {
            let plugin = (plugin_type.create)(&plugin_config)?;

            for command in plugin.commands() {
                if let Some(previous) = commands.get(&command.id) {
                    debug!(
                        command = %command.id,
                        previous = previous.plugin,
                        plugin = plugin_type.id,
                        "Overriding command"
                    );
                }
                commands.insert(
                    command.id.clone(),
                    RegisteredCommand {
                        command,
                        plugin: plugin_type.id,
                    },
                );
            }
            hooks.extend(plugin.hooks());

            for category in plugin.loaders() {
                if let Some((_, first)) = owners.iter().find(|(owned, _)| owned == category) {
                    return Err(RuntimeError::DuplicateLoader {
                        category: SmolStr::new(category),
                        first: SmolStr::new(plugins[*first].id),
                        second: SmolStr::new(plugin_type.id),
                    });
                }
                owners.push((SmolStr::new(category), plugins.len()));
            }

            for (category, loadable) in plugin.loadables()? {
                pending.push((category, loadable.with_source(plugin_type.id)));
            }

            debug!(plugin = plugin_type.id, "Instantiated plugin");
            plugins.push(LoadedPlugin {
                id: plugin_type.id,
                plugin,
            });
        }

        for (category, loadable) in &pending {
            if !owners.iter().any(|(owned, _)| owned == category) {
                return Err(RuntimeError::MissingLoader {
                    category: category.clone(),
                    plugin: SmolStr::new(loadable.source()),
                });
            }
        }

        owners.sort_by_key(|(_, owner)| *owner);
        for (category, owner) in owners {
            let (entries, rest): (Vec<_>, Vec<_>) =
                pending.into_iter().partition(|(pending_category, _)| *pending_category == category);
            pending = rest;
            if entries.is_empty() {
                continue;
            }
            let entries: Vec<Loadable> = entries.into_iter().map(|(_, loadable)| loadable).collect();
            debug!(%category, owner = plugins[owner].id, count = entries.len(), "Delivering loadables");
            plugins[owner].plugin.load(&category, entries, &mut state)?;
        }

        for loaded in &plugins {
            loaded.plugin.start(&mut state).await?;
        }
        state.selection = Range::at_start(&state.tree)?;

        info!(
            plugins = ?plugins.iter().map(|loaded| loaded.id).collect::<Vec<_>>(),
            commands = commands.len(),
            "Editor ready"
        );
        Ok(Self {
            plugins,
            commands,
            hooks,
            state: Mutex::new(state),
        })
    }

    /// The loaded instance of plugin type `P`.
    pub fn plugin<P: PluginDefinition>(&self) -> Option<&P> {
        self.plugins
            .iter()
            .find(|loaded| loaded.id == P::ID)
            .and_then(|loaded| loaded.plugin.as_ref().as_any().downcast_ref::<P>())
    }

    /// Plugin ids in load order.
    pub fn plugin_ids(&self) -> Vec<&'static str> {
        self.plugins.iter().map(|loaded| loaded.id).collect()
    }

    pub fn has_command(&self, id: &str) -> bool {
        self.commands.contains_key(id)
    }

    pub fn commands(&self) -> impl Iterator<Item = &Command> {
        self.commands.values().map(|registered| &registered.command)
    }

    /// Wait for pending commands and lock the session state.
    pub async fn state(&self) -> MutexGuard<'_, EditorState> {
        self.state.lock().await
    }

    /// Run command `id` against the current selection.
    #[instrument(level = "debug", skip(self, args))]
    pub async fn exec_command(&self, id: &str, args: Value) -> CommandResult<()> {
        let mut state = self.state.lock().await;
        let range = state.selection.clone();
        self.run(&mut state, id, range, &args).await
    }

    /// Run command `id` against `range` instead of the session selection.
    #[instrument(level = "debug", skip(self, range, args))]
    pub async fn exec_command_with_range(&self, id: &str, range: Range, args: Value) -> CommandResult<()> {
        let mut state = self.state.lock().await;
        range.validate(&state.tree)?;
        self.run(&mut state, id, range, &args).await
    }

    async fn run(&self, state: &mut EditorState, id: &str, range: Range, args: &Value) -> CommandResult<()> {
        let registered = self
            .commands
            .get(id)
            .ok_or_else(|| CommandError::UnknownCommand(SmolStr::new(id)))?;

        let tree = state.tree.clone();
        let selection = state.selection.clone();
        let mappings = state.engines.save_mappings();
        let extensions = state.extensions.clone();
        match self.dispatch(state, &registered.command, range, args).await {
            Ok(()) => {
                debug!(command = id, plugin = registered.plugin, "Executed command");
                Ok(())
            }
            Err(err) => {
                warn!(command = id, error = %err, "Command failed, restoring state");
                state.tree.restore(tree);
                state.selection = selection;
                state.engines.restore_mappings(mappings);
                state.extensions = extensions;
                Err(err)
            }
        }
    }

    async fn dispatch(
        &self,
        state: &mut EditorState,
        command: &Command,
        range: Range,
        args: &Value,
    ) -> CommandResult<()> {
        let mut ctx = CommandContext {
            command: command.id.clone(),
            range,
            state,
        };

        for hook in self.hooks_for(&command.id, HookStage::Before) {
            hook.handler.execute(&mut ctx, args).await?;
        }
        command.handler.execute(&mut ctx, args).await?;
        for hook in self.hooks_for(&command.id, HookStage::After) {
            hook.handler.execute(&mut ctx, args).await?;
        }

        let EditorState { tree, selection, .. } = ctx.state;
        selection.refresh(tree)?;
        Ok(())
    }

    fn hooks_for<'a>(&'a self, command: &'a str, stage: HookStage) -> impl Iterator<Item = &'a Hook> + 'a {
        self.hooks
            .iter()
            .filter(move |hook| hook.stage == stage && hook.target.matches(command))
    }
}
