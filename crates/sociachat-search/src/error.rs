//! Error types for the vector store.

use thiserror::Error;

/// Errors raised by collections and the client that opens them.
#[derive(Debug, Error)]
pub enum StoreError {
    /// `create_collection` was called with a name already in use.
    #[error("collection already exists: {name}")]
    CollectionExists { name: String },

    /// `get_collection` was called with an unknown name.
    #[error("collection not found: {name}")]
    CollectionNotFound { name: String },

    /// The documents, metadatas and ids of a batch differ in length.
    #[error(
        "mismatched batch: {documents} documents, {metadatas} metadatas, {ids} ids"
    )]
    MismatchedBatch {
        documents: usize,
        metadatas: usize,
        ids: usize,
    },

    /// The same id appears twice in one batch.
    #[error("duplicate id in batch: {id}")]
    DuplicateId { id: String },

    /// The batch exceeds the per-call item limit.
    #[error("batch of {size} items exceeds the maximum of {limit}")]
    BatchTooLarge { size: usize, limit: usize },

    /// The embedder's output does not fit the collection.
    #[error(
        "embedding dimension mismatch: collection {collection} expects {expected}, \
         embedder produces {actual}"
    )]
    DimensionMismatch {
        collection: String,
        expected: usize,
        actual: usize,
    },

    /// The collection was built by a different embedder than the client's.
    #[error("collection {collection} was built with embedder {expected}, not {actual}")]
    EmbedderMismatch {
        collection: String,
        expected: String,
        actual: String,
    },

    /// The embedding model could not be loaded or failed on an input.
    #[error("embedding error: {0}")]
    Embedding(String),

    /// An error propagated from the storage layer.
    #[error("database error: {0}")]
    Database(#[from] sociachat_core::Error),
}

/// Convenience alias for store results.
pub type StoreResult<T> = std::result::Result<T, StoreError>;
