//! Layered bindings.

use crate::error::KeymapResult;
use crate::shortcut::{KeyEvent, Shortcut};
use serde::Deserialize;
use serde_json::Value;
use smol_str::SmolStr;
use tracing::debug;

/// Binding priority. `User` is scanned first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layer {
    Default,
    User,
}

/// A command to run with its arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub command: SmolStr,
    pub args: Value,
}

impl Invocation {
    pub fn new(command: impl Into<SmolStr>, args: Value) -> Self {
        Self {
            command: command.into(),
            args,
        }
    }
}

/// Serialized form of a binding. A spec without a command unbinds the
/// shortcut on its layer.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ShortcutSpec {
    pub shortcut: String,
    #[serde(default)]
    pub command: Option<SmolStr>,
    #[serde(default)]
    pub args: Value,
}

impl ShortcutSpec {
    pub fn new(shortcut: impl Into<String>, command: impl Into<SmolStr>) -> Self {
        Self {
            shortcut: shortcut.into(),
            command: Some(command.into()),
            args: Value::Null,
        }
    }

    pub fn unbind(shortcut: impl Into<String>) -> Self {
        Self {
            shortcut: shortcut.into(),
            command: None,
            args: Value::Null,
        }
    }

    pub fn with_args(mut self, args: Value) -> Self {
        self.args = args;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub shortcut: Shortcut,
    /// `None` is an unbinding: it matches but runs nothing.
    pub invocation: Option<Invocation>,
}

#[derive(Debug, Clone, Default)]
pub struct Keymap {
    default: Vec<Binding>,
    user: Vec<Binding>,
}

impl Keymap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bindings(&self, layer: Layer) -> &[Binding] {
        match layer {
            Layer::Default => &self.default,
            Layer::User => &self.user,
        }
    }

    fn layer_mut(&mut self, layer: Layer) -> &mut Vec<Binding> {
        match layer {
            Layer::Default => &mut self.default,
            Layer::User => &mut self.user,
        }
    }

    /// Append a binding. Binding `None` drops every earlier binding of the
    /// same shortcut on `layer` and leaves an unbinding in their place.
    ///
    /// Unbinding is per pattern, not per physical key: a key pattern and a
    /// code pattern are different shortcuts even when one keystroke matches
    /// both, so unbinding `CTRL+A` leaves `CTRL+<KeyA>` bound.
    pub fn bind(&mut self, layer: Layer, shortcut: Shortcut, invocation: Option<Invocation>) {
        let bindings = self.layer_mut(layer);
        if invocation.is_none() {
            bindings.retain(|binding| binding.shortcut != shortcut);
            debug!(%shortcut, ?layer, "Unbinding shortcut");
        }
        bindings.push(Binding { shortcut, invocation });
    }

    pub fn bind_spec(&mut self, layer: Layer, spec: &ShortcutSpec) -> KeymapResult<()> {
        let shortcut = Shortcut::parse(&spec.shortcut)?;
        let invocation = spec
            .command
            .as_ref()
            .map(|command| Invocation::new(command.clone(), spec.args.clone()));
        self.bind(layer, shortcut, invocation);
        Ok(())
    }

    /// Commands bound to `event`, in binding order. The default layer is
    /// only consulted when no user binding (unbindings included) matches.
    pub fn matches(&self, event: &KeyEvent) -> Vec<Invocation> {
        for layer in [Layer::User, Layer::Default] {
            let matched: Vec<&Binding> = self
                .bindings(layer)
                .iter()
                .filter(|binding| binding.shortcut.matches(event))
                .collect();
            if !matched.is_empty() {
                debug!(?layer, count = matched.len(), "Matched shortcut");
                return matched
                    .into_iter()
                    .filter_map(|binding| binding.invocation.clone())
                    .collect();
            }
        }
        Vec::new()
    }
}
