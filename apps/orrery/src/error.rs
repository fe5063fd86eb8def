//! # CLI Errors
//!
//! Everything a command can fail with. Graph errors pass through untouched;
//! file system, configuration and JSON failures carry the offending path or
//! a short context.

use orrery_core::GraphError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(String),

    /// Degree counters disagree with the adjacency index.
    #[error("Integrity check failed for {0} node(s)")]
    Integrity(usize),
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e.to_string())
    }
}
