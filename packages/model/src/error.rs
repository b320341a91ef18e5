use crate::NodeId;
use thiserror::Error;

pub type TreeResult<T> = Result<T, TreeError>;
pub type RangeResult<T> = Result<T, RangeError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("Node {0} is atomic and cannot hold children")]
    AtomicParent(NodeId),

    #[error("Attaching {node} under {parent} would create a cycle")]
    CycleDetected { node: NodeId, parent: NodeId },

    #[error("The root node cannot be moved")]
    RootImmovable,

    #[error("Node {0} has no parent")]
    Orphan(NodeId),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RangeError {
    #[error("Range endpoint {0} is not in the tree")]
    DetachedEndpoint(NodeId),

    #[error("Cannot place a position inside {0}: not a container")]
    NotAContainer(NodeId),

    #[error("Cannot place a position before or after {0}: it has no parent")]
    NoParent(NodeId),
}
