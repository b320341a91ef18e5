//! # Plugins
//!
//! A plugin bundles commands, hooks and loadables. Plugin types are
//! described by a [`PluginType`] (id, dependencies, constructor) so the
//! runtime can order and instantiate them without knowing the concrete
//! types. Implement [`PluginDefinition`] and use [`PluginType::of`].

use crate::command::{Command, Hook};
use crate::editor::EditorState;
use crate::error::{RuntimeError, RuntimeResult};
use crate::loadables::{Loadable, Loadables};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use smol_str::SmolStr;
use std::any::Any;
use std::fmt;

pub trait AsAny {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[async_trait(?Send)]
pub trait Plugin: AsAny {
    fn commands(&self) -> Vec<Command> {
        Vec::new()
    }

    fn hooks(&self) -> Vec<Hook> {
        Vec::new()
    }

    /// Loadable categories this plugin owns.
    fn loaders(&self) -> Vec<&'static str> {
        Vec::new()
    }

    fn loadables(&self) -> RuntimeResult<Loadables> {
        Ok(Loadables::new())
    }

    /// Receive every entry of an owned category, in plugin load order.
    fn load(
        &mut self,
        category: &str,
        _entries: Vec<Loadable>,
        _state: &mut EditorState,
    ) -> RuntimeResult<()> {
        Err(RuntimeError::InvalidLoadable {
            category: SmolStr::new(category),
            message: "plugin declares the category but does not load it".to_string(),
        })
    }

    /// Runs once after all loadables are delivered.
    async fn start(&self, _state: &mut EditorState) -> RuntimeResult<()> {
        Ok(())
    }
}

/// Static description of a plugin type.
pub trait PluginDefinition: Plugin + Sized + 'static {
    const ID: &'static str;

    fn dependencies() -> Vec<PluginType> {
        Vec::new()
    }

    fn create(config: &PluginConfig) -> RuntimeResult<Self>;
}

#[derive(Clone, Copy)]
pub struct PluginType {
    pub id: &'static str,
    pub dependencies: fn() -> Vec<PluginType>,
    pub create: fn(&PluginConfig) -> RuntimeResult<Box<dyn Plugin>>,
}

impl PluginType {
    pub fn of<P: PluginDefinition>() -> Self {
        Self {
            id: P::ID,
            dependencies: P::dependencies,
            create: create_boxed::<P>,
        }
    }
}

fn create_boxed<P: PluginDefinition>(config: &PluginConfig) -> RuntimeResult<Box<dyn Plugin>> {
    Ok(Box::new(P::create(config)?))
}

impl fmt::Debug for PluginType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginType").field("id", &self.id).finish()
    }
}

impl PartialEq for PluginType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

/// Raw configuration handed to a plugin constructor.
#[derive(Debug, Clone, Default)]
pub struct PluginConfig {
    plugin: SmolStr,
    value: Value,
}

impl PluginConfig {
    pub fn new(plugin: impl Into<SmolStr>, value: Value) -> Self {
        Self {
            plugin: plugin.into(),
            value,
        }
    }

    pub fn plugin(&self) -> &str {
        &self.plugin
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Deserialize the typed configuration. A missing config yields the
    /// type's default.
    pub fn parse<T: DeserializeOwned + Default>(&self) -> RuntimeResult<T> {
        if self.value.is_null() {
            return Ok(T::default());
        }
        serde_json::from_value(self.value.clone()).map_err(|err| RuntimeError::InvalidConfig {
            plugin: self.plugin.clone(),
            message: err.to_string(),
        })
    }
}
