//! Error types for the runtime

use folio_engine::EngineError;
use folio_model::{RangeError, TreeError};
use smol_str::SmolStr;
use thiserror::Error;

pub type RuntimeResult<T> = Result<T, RuntimeError>;
pub type CommandResult<T> = Result<T, CommandError>;

/// Configuration and startup failures. These abort editor construction.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuntimeError {
    #[error("Plugin dependency cycle: {0}")]
    DependencyCycle(String),

    #[error("Unknown plugin: {0}")]
    UnknownPlugin(String),

    #[error("Invalid configuration for plugin {plugin}: {message}")]
    InvalidConfig { plugin: SmolStr, message: String },

    #[error("No plugin loads the '{category}' loadables declared by {plugin}")]
    MissingLoader { category: SmolStr, plugin: SmolStr },

    #[error("Loadable category '{category}' is owned by both {first} and {second}")]
    DuplicateLoader {
        category: SmolStr,
        first: SmolStr,
        second: SmolStr,
    },

    #[error("Loader for '{category}' rejected an entry: {message}")]
    InvalidLoadable { category: SmolStr, message: String },

    #[error("Plugin {plugin} failed to start: {message}")]
    Start { plugin: SmolStr, message: String },

    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("Range error: {0}")]
    Range(#[from] RangeError),
}

/// Failures of a single command. The session state is restored before one
/// of these is returned.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CommandError {
    #[error("Unknown command: {0}")]
    UnknownCommand(SmolStr),

    #[error("Invalid arguments for {command}: {message}")]
    InvalidArgs { command: SmolStr, message: String },

    #[error("Command {command} rejected: {message}")]
    Rejected { command: SmolStr, message: String },

    #[error("Tree error: {0}")]
    Tree(#[from] TreeError),

    #[error("Range error: {0}")]
    Range(#[from] RangeError),

    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),
}

impl CommandError {
    pub fn rejected(command: impl Into<SmolStr>, message: impl Into<String>) -> Self {
        Self::Rejected {
            command: command.into(),
            message: message.into(),
        }
    }

    pub fn invalid_args(command: impl Into<SmolStr>, message: impl Into<String>) -> Self {
        Self::InvalidArgs {
            command: command.into(),
            message: message.into(),
        }
    }
}
