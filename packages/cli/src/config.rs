use folio_dom::DomPlugin;
use folio_keymap::KeymapPlugin;
use folio_runtime::{EditorConfig, PluginDefinition, PluginSpec, PluginType};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_NAME: &str = "folio.config.json";

/// Plugins the CLI can name in a config file.
pub fn catalog() -> Vec<PluginType> {
    vec![PluginType::of::<DomPlugin>(), PluginType::of::<KeymapPlugin>()]
}

/// Editor config for a CLI run: the dom and keymap plugins, then whatever
/// the config file lists. `explicit` must exist; otherwise
/// `folio.config.json` in `cwd` is used when present.
pub fn load(explicit: Option<&Path>, cwd: &Path) -> anyhow::Result<EditorConfig> {
    let path = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => Some(cwd.join(DEFAULT_CONFIG_NAME)).filter(|path| path.exists()),
    };
    let file = match path {
        Some(path) => read(&path)?,
        None => EditorConfig::new(),
    };

    let mut config = EditorConfig::new()
        .with(PluginSpec::of::<DomPlugin>())
        .with(PluginSpec::of::<KeymapPlugin>());
    config.plugins.extend(file.plugins);
    Ok(config)
}

fn read(path: &PathBuf) -> anyhow::Result<EditorConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|err| anyhow::anyhow!("Cannot read config {}: {}", path.display(), err))?;
    let value: Value = serde_json::from_str(&content)?;
    Ok(EditorConfig::from_json(value, &catalog())?)
}

/// Turn on pretty printing in the effective dom plugin config.
pub fn force_pretty(config: &mut EditorConfig) {
    let Some(spec) = config.plugins.iter_mut().rev().find(|spec| spec.plugin.id == DomPlugin::ID) else {
        return;
    };
    if !spec.config.is_object() {
        spec.config = json!({});
    }
    if let Some(object) = spec.config.as_object_mut() {
        let render = object.entry("render").or_insert_with(|| json!({}));
        if let Some(render) = render.as_object_mut() {
            render.insert("pretty".to_string(), Value::Bool(true));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_file() {
        let config = load(None, Path::new("/nonexistent")).unwrap();
        let ids: Vec<_> = config.plugins.iter().map(|spec| spec.plugin.id).collect();
        assert_eq!(ids, ["dom", "keymap"]);
    }

    #[test]
    fn test_force_pretty_keeps_other_options() {
        let mut config = EditorConfig::new()
            .with(PluginSpec::of::<DomPlugin>())
            .with(PluginSpec::of::<DomPlugin>().with_config(json!({ "render": { "indent": "\t" } })));
        force_pretty(&mut config);
        assert_eq!(config.plugins[0].config, Value::Null);
        assert_eq!(config.plugins[1].config, json!({ "render": { "indent": "\t", "pretty": true } }));
    }

    #[test]
    fn test_file_plugins_come_last() {
        let file = EditorConfig::from_json(
            json!({ "plugins": [{ "id": "keymap", "config": { "shortcuts": [] } }] }),
            &catalog(),
        )
        .unwrap();
        assert_eq!(file.plugins.len(), 1);
        assert!(EditorConfig::from_json(json!({ "plugins": [{ "id": "vision" }] }), &catalog()).is_err());
    }
}
