use folio_model::{NodeId, TreeError};
use smol_str::SmolStr;
use thiserror::Error;

pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Unknown engine: {0}")]
    UnknownEngine(SmolStr),

    #[error("Engine already defined: {0}")]
    DuplicateEngine(SmolStr),

    #[error("Engine {id} does not handle format {expected}")]
    FormatMismatch { id: SmolStr, expected: &'static str },

    #[error("Default handler {handler} of engine {engine} must not declare a predicate")]
    DefaultWithPredicate {
        engine: SmolStr,
        handler: &'static str,
    },

    #[error("Handler {handler} registered on engine {engine} has no predicate")]
    MissingPredicate {
        engine: SmolStr,
        handler: &'static str,
    },

    #[error("No handler of engine {engine} accepts the item")]
    NoHandler { engine: SmolStr },

    #[error("Node {0} cannot be rendered: it is not in the tree")]
    UnknownNode(NodeId),

    #[error("Tree error: {0}")]
    Tree(#[from] TreeError),

    #[error("Handler failed: {0}")]
    Handler(String),
}

impl EngineError {
    pub fn handler(message: impl Into<String>) -> Self {
        Self::Handler(message.into())
    }
}
