//! Error types for the core layer.

use crate::path::{Path, PathError};

/// Errors produced by stores, handlers and the dispatcher.
///
/// Inside a result stream an error item is terminal: combined streams stop
/// after yielding it.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// Path validation error.
    #[error("path error: {0}")]
    Path(#[from] PathError),

    /// Invalid path for an operation.
    #[error("invalid path: {message}")]
    InvalidPath { message: String },

    /// A handler pattern could not be built.
    #[error("invalid pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    /// A value carried a reference marker whose payload is not a path.
    #[error("invalid reference at '{path}': {message}")]
    InvalidReference { path: Path, message: String },

    /// Following references went deeper than the configured limit.
    #[error("reference depth limit {limit} exceeded while resolving '{path}'")]
    ReferenceDepthExceeded { path: Path, limit: usize },

    /// A handler action failed.
    #[error("handler failed at '{path}': {message}")]
    Handler { path: Path, message: String },

    /// Configuration could not be loaded.
    #[error("configuration error: {message}")]
    Config { message: String },

    /// Generic error with message.
    #[error("{message}")]
    Other { message: String },
}

impl Error {
    /// Shorthand for a handler failure at `path`.
    pub fn handler(path: &Path, message: impl Into<String>) -> Self {
        Error::Handler {
            path: path.clone(),
            message: message.into(),
        }
    }

    /// Shorthand for a generic error.
    pub fn other(message: impl Into<String>) -> Self {
        Error::Other {
            message: message.into(),
        }
    }
}
