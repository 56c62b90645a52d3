//! Error types shared across the line-editing engine.
//!
//! Interactive paths never surface these to the user: a failing terminal write
//! is logged and dropped, an unwritable history file degrades to memory-only
//! history, and a failing completion provider is treated as "no candidates".
//! They only reach callers through explicit operations such as
//! [`HistoryStore::open`](crate::history::HistoryStore::open).

use std::io;
use thiserror::Error;

/// Errors raised by console input/output sinks.
#[derive(Debug, Error)]
pub enum ConsoleError {
    /// Underlying I/O failure.
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),

    /// The terminal refused a mode change or query.
    #[error("Terminal error: {0}")]
    TerminalError(String),

    /// The operation is not available on this platform.
    #[error("Unsupported feature: {0}")]
    UnsupportedFeature(String),

    /// The sink was already closed.
    #[error("Console closed")]
    Closed,
}

/// Result type for console operations
pub type ConsoleResult<T> = Result<T, ConsoleError>;

/// Errors raised by the history backing store.
#[derive(Debug, Error)]
pub enum HistoryError {
    /// Opening, reading or appending to the history file failed.
    #[error("history file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    /// No backing file is configured.
    #[error("history is not persisted")]
    NotPersisted,
}

impl HistoryError {
    pub(crate) fn io(path: &str, source: io::Error) -> Self {
        HistoryError::Io {
            path: path.to_string(),
            source,
        }
    }
}

/// Result type for history operations
pub type HistoryResult<T> = Result<T, HistoryError>;

/// Errors a completion provider may report.
#[derive(Debug, Error)]
pub enum CompletionError {
    /// The provider could not compute candidates.
    #[error("completion failed: {0}")]
    Failed(String),

    /// Provider-specific failure.
    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// Result type for completion providers
pub type CompletionResult<T> = Result<T, CompletionError>;
