//! Error types for HoopsRAG

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for HoopsRAG operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in HoopsRAG operations
#[derive(Error, Debug)]
pub enum Error {
    /// The statistics file is missing or unreadable
    #[error("cannot read {}: {source}", path.display())]
    FileAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A single row could not be turned into a document.
    ///
    /// Rows are skipped, so this only ever describes a skip.
    #[error("row {row} skipped: {reason}")]
    RowParse { row: usize, reason: String },

    /// Failed to load or run the embedding backend
    #[error("embedding error: {0}")]
    Embedding(String),

    /// The language model call failed
    #[error("generation error: {0}")]
    Generation(String),

    /// Invalid or unreadable configuration
    #[error("config error: {0}")]
    Config(String),

    /// Failed to read or write the on-disk index cache
    #[error("cache error: {0}")]
    Cache(String),

    /// Invalid input provided
    #[error("invalid input: {0}")]
    InvalidInput(String),
}
