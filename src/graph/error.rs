//! Graph-specific error types.

use thiserror::Error;

/// Errors raised by graph mutations and command construction.
///
/// Every variant signals a precondition violation by the caller. Nothing here
/// is transient, so callers should never retry on these.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error("Unknown node: {0}")]
    UnknownNode(String),

    #[error("Unknown plug: {0}")]
    UnknownPlug(String),

    #[error("Invalid plug reference: {0}")]
    InvalidPlugReference(String),

    #[error("Duplicate node name: {0}")]
    DuplicateName(String),

    #[error("Invalid node name: {0:?}")]
    InvalidNodeName(String),

    #[error("Invalid connection: {0}")]
    InvalidConnection(String),

    #[error("Plug {0} has no attached cable")]
    MissingAttachment(String),

    #[error("Unknown node type: {0}")]
    UnknownNodeType(String),

    #[error("Node {node} has no parameter {param}")]
    UnknownParameter { node: String, param: String },

    #[error("Macro error: {0}")]
    Macro(String),
}

pub type GraphResult<T> = std::result::Result<T, GraphError>;
