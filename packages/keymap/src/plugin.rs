use crate::error::{KeymapError, KeymapResult};
use crate::keymap::{Invocation, Keymap, Layer, ShortcutSpec};
use crate::shortcut::KeyEvent;
use folio_runtime::builtin::CorePlugin;
use folio_runtime::{
    Editor, EditorState, Loadable, Loadables, Plugin, PluginConfig, PluginDefinition, PluginType, RuntimeError,
    RuntimeResult,
};
use serde::Deserialize;
use serde_json::json;
use smol_str::SmolStr;
use tracing::{debug, info};

/// Loadable category holding [`ShortcutSpec`] entries for the default layer.
pub const SHORTCUTS: &str = "shortcuts";

/// User-layer bindings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct KeymapConfig {
    pub shortcuts: Vec<ShortcutSpec>,
}

pub struct KeymapPlugin {
    keymap: Keymap,
}

impl PluginDefinition for KeymapPlugin {
    const ID: &'static str = "keymap";

    fn dependencies() -> Vec<PluginType> {
        vec![PluginType::of::<CorePlugin>()]
    }

    fn create(config: &PluginConfig) -> RuntimeResult<Self> {
        let config: KeymapConfig = config.parse()?;
        let mut keymap = Keymap::new();
        for spec in &config.shortcuts {
            keymap
                .bind_spec(Layer::User, spec)
                .map_err(|err| RuntimeError::InvalidConfig {
                    plugin: SmolStr::new(Self::ID),
                    message: err.to_string(),
                })?;
        }
        Ok(Self { keymap })
    }
}

impl Plugin for KeymapPlugin {
    fn loaders(&self) -> Vec<&'static str> {
        vec![SHORTCUTS]
    }

    fn loadables(&self) -> RuntimeResult<Loadables> {
        Ok(default_shortcuts()
            .into_iter()
            .fold(Loadables::new(), |loadables, spec| loadables.with(SHORTCUTS, spec)))
    }

    fn load(&mut self, category: &str, entries: Vec<Loadable>, _state: &mut EditorState) -> RuntimeResult<()> {
        let invalid = |message: String| RuntimeError::InvalidLoadable {
            category: SmolStr::new(category),
            message,
        };
        for entry in entries {
            let source = SmolStr::new(entry.source());
            let spec = entry
                .downcast::<ShortcutSpec>()
                .map_err(|entry| invalid(format!("expected a shortcut from {}, got {}", source, entry.type_name())))?;
            self.keymap
                .bind_spec(Layer::Default, &spec)
                .map_err(|err| invalid(format!("{} (from {})", err, source)))?;
        }
        info!(
            default = self.keymap.bindings(Layer::Default).len(),
            user = self.keymap.bindings(Layer::User).len(),
            "Keymap loaded"
        );
        Ok(())
    }
}

impl KeymapPlugin {
    pub fn keymap(&self) -> &Keymap {
        &self.keymap
    }
}

fn default_shortcuts() -> Vec<ShortcutSpec> {
    vec![
        ShortcutSpec::new("ENTER", "insertParagraphBreak"),
        ShortcutSpec::new("SHIFT+ENTER", "insertLineBreak"),
        ShortcutSpec::new("BACKSPACE", "deleteBackward"),
        ShortcutSpec::new("DELETE", "deleteForward"),
        ShortcutSpec::new("CTRL+B", "toggleFormat").with_args(json!({ "format": "b" })),
        ShortcutSpec::new("META+B", "toggleFormat").with_args(json!({ "format": "b" })),
        ShortcutSpec::new("CTRL+I", "toggleFormat").with_args(json!({ "format": "i" })),
        ShortcutSpec::new("META+I", "toggleFormat").with_args(json!({ "format": "i" })),
        ShortcutSpec::new("CTRL+U", "toggleFormat").with_args(json!({ "format": "u" })),
        ShortcutSpec::new("META+U", "toggleFormat").with_args(json!({ "format": "u" })),
    ]
}

/// Run every command bound to `event`, in order. Returns what ran; an empty
/// list means the key was not handled. Stops at the first failing command.
pub async fn dispatch_key(editor: &Editor, event: &KeyEvent) -> KeymapResult<Vec<Invocation>> {
    let plugin = editor.plugin::<KeymapPlugin>().ok_or(KeymapError::NotLoaded)?;
    let invocations = plugin.keymap().matches(event);
    if invocations.is_empty() {
        debug!(key = %event.key, code = %event.code, "No shortcut matched");
    }
    for invocation in &invocations {
        debug!(command = %invocation.command, key = %event.key, "Dispatching shortcut");
        editor.exec_command(&invocation.command, invocation.args.clone()).await?;
    }
    Ok(invocations)
}
