//! Error types for reqpin operations.
//!
//! This module defines [`ReqpinError`], the primary error type used by the
//! file driver and the local registry, and a [`Result`] type alias.
//!
//! # Error Handling Strategy
//!
//! - Use `ReqpinError` for failures that end a run or that callers report
//! - Use `anyhow::Error` (via `ReqpinError::Other`) for unexpected errors
//! - Lookup failures are logged by the resolver and never end a run

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for reqpin operations.
#[derive(Debug, Error)]
pub enum ReqpinError {
    /// The requirements file could not be read.
    #[error("Failed to read requirements file {path}: {source}")]
    ReadRequirements {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The rewritten requirements could not be persisted.
    #[error("Failed to write requirements file {path}: {source}")]
    WriteRequirements {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The Python interpreter failed to answer a metadata query.
    #[error("Interpreter '{python}' failed: {message}")]
    Interpreter { python: String, message: String },

    /// The HTTP client could not be constructed.
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for reqpin operations.
pub type Result<T> = std::result::Result<T, ReqpinError>;
