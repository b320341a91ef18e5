use crate::item::DomId;
use folio_engine::EngineError;
use folio_model::{NodeId, RangeError};
use thiserror::Error;

pub type DomResult<T> = Result<T, DomError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomError {
    #[error("Unexpected closing tag </{tag}> at {pos}")]
    UnexpectedClose { pos: usize, tag: String },

    #[error("Malformed tag at {pos}: {message}")]
    MalformedTag { pos: usize, message: String },

    #[error("Unknown item: {0}")]
    UnknownItem(DomId),

    #[error("Item {0} has no corresponding node")]
    UnmappedItem(DomId),

    #[error("Node {0} has no corresponding item")]
    UnmappedNode(NodeId),

    #[error("Offset {offset} is out of range for item {item} (length {len})")]
    OffsetOutOfRange { item: DomId, offset: usize, len: usize },

    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("Range error: {0}")]
    Range(#[from] RangeError),
}

impl DomError {
    pub fn malformed(pos: usize, message: impl Into<String>) -> Self {
        Self::MalformedTag {
            pos,
            message: message.into(),
        }
    }
}
