//! Error types for butterfly-search
//!
//! Configuration and mode problems are raised before any search work starts.
//! Edge data problems abort only the query that reads the offending edge.
//! Unreachable targets and exhausted search budgets are not errors.

use crate::graph::{EdgeId, NodeId};

/// Errors raised while composing weightings or running a query
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A weighting needs an attribute store that was not supplied, or a
    /// parameter is outside its legal range
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The algorithm cannot run in the requested traversal mode
    #[error("unsupported traversal mode: {0}")]
    UnsupportedMode(String),

    /// An edge carries attribute data no weighting branch can map to a cost
    #[error("unhandled data on edge {edge}: {reason}")]
    UnhandledEdgeData { edge: EdgeId, reason: String },

    /// A source or target id does not exist in the graph
    #[error("node {node} is out of range (graph has {node_count} nodes)")]
    InvalidNode { node: NodeId, node_count: usize },

    /// `calc_paths` was called on a hierarchy search without `prepare`
    #[error("search was not prepared for this query")]
    NotPrepared,

    /// Configuration file could not be read
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file could not be parsed
    #[error("invalid configuration file: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

impl Error {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        Error::Configuration(msg.into())
    }

    pub(crate) fn edge_data(edge: EdgeId, reason: impl Into<String>) -> Self {
        Error::UnhandledEdgeData {
            edge,
            reason: reason.into(),
        }
    }
}

/// Convenience result type for butterfly-search operations
pub type Result<T> = std::result::Result<T, Error>;
