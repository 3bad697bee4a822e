//! Error types for the ingestion pipeline.

use std::path::PathBuf;

use sociachat_search::StoreError;
use thiserror::Error;

/// Errors that can occur while reading and indexing a corpus.
#[derive(Debug, Error)]
pub enum EtlError {
    /// The corpus directory or one of its files could not be accessed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A CSV file is malformed.
    #[error("parse error in {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    /// A table lacks the column holding the document text.
    #[error("{origin} has no {column:?} column")]
    MissingColumn { origin: String, column: String },

    /// The configuration cannot drive a load or a query.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// An error propagated from the vector store.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl EtlError {
    /// Returns `true` when an input file, rather than the environment, is at
    /// fault.
    pub fn is_parse_error(&self) -> bool {
        matches!(self, Self::Parse { .. } | Self::MissingColumn { .. })
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Convenience alias for pipeline results.
pub type EtlResult<T> = std::result::Result<T, EtlError>;
