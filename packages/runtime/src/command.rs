//! Commands and hooks.

use crate::editor::EditorState;
use crate::error::{CommandError, CommandResult};
use async_trait::async_trait;
use folio_model::Range;
use serde::de::DeserializeOwned;
use serde_json::Value;
use smol_str::SmolStr;
use std::fmt;
use std::rc::Rc;

/// What a command handler or hook sees.
pub struct CommandContext<'s> {
    /// Id of the command being executed.
    pub command: SmolStr,
    /// The range the command acts on: the session selection, or the range
    /// given to `exec_command_with_range`.
    pub range: Range,
    pub state: &'s mut EditorState,
}

impl<'s> CommandContext<'s> {
    /// Deserialize the command arguments. `null` reads as an empty object.
    pub fn args<T: DeserializeOwned>(&self, args: &Value) -> CommandResult<T> {
        let value = match args {
            Value::Null => Value::Object(Default::default()),
            other => other.clone(),
        };
        serde_json::from_value(value)
            .map_err(|err| CommandError::invalid_args(self.command.clone(), err.to_string()))
    }

    pub fn reject(&self, message: impl Into<String>) -> CommandError {
        CommandError::rejected(self.command.clone(), message)
    }
}

#[async_trait(?Send)]
pub trait CommandHandler {
    async fn execute(&self, ctx: &mut CommandContext<'_>, args: &Value) -> CommandResult<()>;
}

/// Adapter for synchronous closures.
pub struct FnHandler<F>(pub F);

impl<F> FnHandler<F>
where
    F: Fn(&mut CommandContext<'_>, &Value) -> CommandResult<()>,
{
    pub fn new(handler: F) -> Self {
        Self(handler)
    }
}

#[async_trait(?Send)]
impl<F> CommandHandler for FnHandler<F>
where
    F: Fn(&mut CommandContext<'_>, &Value) -> CommandResult<()>,
{
    async fn execute(&self, ctx: &mut CommandContext<'_>, args: &Value) -> CommandResult<()> {
        (self.0)(ctx, args)
    }
}

#[derive(Clone)]
pub struct Command {
    pub id: SmolStr,
    pub title: Option<String>,
    pub handler: Rc<dyn CommandHandler>,
}

impl Command {
    pub fn new(id: impl Into<SmolStr>, handler: impl CommandHandler + 'static) -> Self {
        Self {
            id: id.into(),
            title: None,
            handler: Rc::new(handler),
        }
    }

    /// Command backed by a synchronous closure.
    pub fn sync<F>(id: impl Into<SmolStr>, handler: F) -> Self
    where
        F: Fn(&mut CommandContext<'_>, &Value) -> CommandResult<()> + 'static,
    {
        Self::new(id, FnHandler::new(handler))
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("id", &self.id)
            .field("title", &self.title)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookStage {
    Before,
    After,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookTarget {
    Command(SmolStr),
    /// `*`: every command.
    Any,
}

impl HookTarget {
    pub fn parse(target: &str) -> Self {
        match target {
            "*" => HookTarget::Any,
            id => HookTarget::Command(SmolStr::new(id)),
        }
    }

    pub fn matches(&self, command: &str) -> bool {
        match self {
            HookTarget::Any => true,
            HookTarget::Command(id) => id == command,
        }
    }
}

#[derive(Clone)]
pub struct Hook {
    pub target: HookTarget,
    pub stage: HookStage,
    pub handler: Rc<dyn CommandHandler>,
}

impl Hook {
    pub fn before(target: &str, handler: impl CommandHandler + 'static) -> Self {
        Self {
            target: HookTarget::parse(target),
            stage: HookStage::Before,
            handler: Rc::new(handler),
        }
    }

    pub fn after(target: &str, handler: impl CommandHandler + 'static) -> Self {
        Self {
            target: HookTarget::parse(target),
            stage: HookStage::After,
            handler: Rc::new(handler),
        }
    }
}

impl fmt::Debug for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hook")
            .field("target", &self.target)
            .field("stage", &self.stage)
            .finish()
    }
}
