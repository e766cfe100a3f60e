//! Error types for the node map engine
//!
//! Most failures inside the engine are local and self-healing (dropped edges,
//! clamped settings, recovered non-finite nodes) and never surface here. The
//! variants below cover direct graph manipulation and the loading edge.

use thiserror::Error;

/// Errors that can occur while building, mutating or loading a node map
#[derive(Error, Debug)]
pub enum NodeMapError {
    /// A node with this id already exists in the graph
    #[error("duplicate node id: {0}")]
    DuplicateNode(String),

    /// No node with this id exists in the graph
    #[error("unknown node id: {0}")]
    UnknownNode(String),

    /// A color string could not be parsed as `#RRGGBB` or `#RRGGBBAA`
    #[error("invalid color: {0}")]
    InvalidColor(String),

    /// A physics parameter name was not recognized
    #[error("unknown physics parameter: {0}")]
    UnknownParam(String),

    /// A node kind filter name was not recognized
    #[error("unknown node filter: {0}")]
    UnknownFilter(String),

    /// The file extension could not be mapped to a supported format
    #[error("could not determine file format from path: {0}")]
    UnknownExtension(String),

    /// An I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A parsing error occurred
    #[error("parse error: {0}")]
    Parse(String),
}

impl From<serde_json::Error> for NodeMapError {
    fn from(err: serde_json::Error) -> Self {
        NodeMapError::Parse(err.to_string())
    }
}

impl From<serde_yaml::Error> for NodeMapError {
    fn from(err: serde_yaml::Error) -> Self {
        NodeMapError::Parse(err.to_string())
    }
}

/// Result type for node map operations
pub type Result<T> = std::result::Result<T, NodeMapError>;
