//! Error handling for nodetree-rs
//!
//! This module defines the crate-level error type and a Result alias used by
//! everything above the graph layer (editor, config, file I/O).

use crate::graph::GraphError;
use thiserror::Error;

/// Main error type for nodetree-rs operations
#[derive(Error, Debug)]
pub enum NodeTreeError {
    /// Graph precondition violations
    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    /// Errors related to configuration loading/saving
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed script or type registry
    #[error("Script error: {0}")]
    Script(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<NodeTreeError>,
    },
}

impl NodeTreeError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        NodeTreeError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// The graph error at the bottom of any context chain, if there is one.
    pub fn graph_error(&self) -> Option<&GraphError> {
        match self {
            NodeTreeError::Graph(e) => Some(e),
            NodeTreeError::WithContext { source, .. } => source.graph_error(),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for NodeTreeError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_data() || err.is_syntax() || err.is_eof() {
            NodeTreeError::Script(err.to_string())
        } else {
            NodeTreeError::Serialization(err.to_string())
        }
    }
}

/// Result type alias for nodetree-rs operations
pub type Result<T> = std::result::Result<T, NodeTreeError>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context lazily to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.with_context(f()))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, GraphError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| NodeTreeError::from(e).with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| NodeTreeError::from(e).with_context(f()))
    }
}
