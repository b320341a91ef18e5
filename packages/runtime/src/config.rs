//! Editor configuration.

use crate::error::{RuntimeError, RuntimeResult};
use crate::plugin::{PluginDefinition, PluginType};
use serde::Deserialize;
use serde_json::Value;

/// A configured plugin: its type and raw configuration.
#[derive(Debug, Clone)]
pub struct PluginSpec {
    pub plugin: PluginType,
    pub config: Value,
}

impl PluginSpec {
    pub fn new(plugin: PluginType) -> Self {
        Self {
            plugin,
            config: Value::Null,
        }
    }

    pub fn of<P: PluginDefinition>() -> Self {
        Self::new(PluginType::of::<P>())
    }

    pub fn with_config(mut self, config: Value) -> Self {
        self.config = config;
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct EditorConfig {
    pub plugins: Vec<PluginSpec>,
}

#[derive(Deserialize)]
struct RawConfig {
    #[serde(default)]
    plugins: Vec<RawPluginSpec>,
}

#[derive(Deserialize)]
struct RawPluginSpec {
    id: String,
    #[serde(default)]
    config: Value,
}

impl EditorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, spec: PluginSpec) -> Self {
        self.plugins.push(spec);
        self
    }

    /// Read `{ "plugins": [{ "id": ..., "config": ... }] }`, resolving ids
    /// against `catalog`.
    pub fn from_json(value: Value, catalog: &[PluginType]) -> RuntimeResult<Self> {
        let raw: RawConfig = serde_json::from_value(value).map_err(|err| RuntimeError::InvalidConfig {
            plugin: "editor".into(),
            message: err.to_string(),
        })?;

        let mut config = Self::new();
        for spec in raw.plugins {
            let plugin = catalog
                .iter()
                .find(|plugin| plugin.id == spec.id)
                .copied()
                .ok_or(RuntimeError::UnknownPlugin(spec.id))?;
            config.plugins.push(PluginSpec {
                plugin,
                config: spec.config,
            });
        }
        Ok(config)
    }
}
