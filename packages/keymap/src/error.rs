use folio_runtime::CommandError;
use thiserror::Error;

pub type KeymapResult<T> = Result<T, KeymapError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum KeymapError {
    #[error("Shortcut '{0}' has no key or code")]
    MissingKey(String),

    #[error("Unknown modifier '{modifier}' in shortcut '{pattern}'")]
    UnknownModifier { pattern: String, modifier: String },

    #[error("Empty code in shortcut '{0}'")]
    EmptyCode(String),

    #[error("The keymap plugin is not loaded")]
    NotLoaded,

    #[error("Command error: {0}")]
    Command(#[from] CommandError),
}
