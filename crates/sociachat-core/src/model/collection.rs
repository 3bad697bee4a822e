use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ids::CollectionId;
use crate::model::space::DistanceSpace;

/// A named container of documents and their embeddings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionInfo {
    pub id: CollectionId,

    /// Unique, human-chosen name (e.g. "politik2").
    pub name: String,

    /// Distance function used by similarity queries.
    pub space: DistanceSpace,

    /// Length of every embedding stored in this collection.
    pub dimensions: usize,

    /// Name of the embedder that produced the stored vectors.
    pub embedder: String,

    pub created_at: DateTime<Utc>,
}

impl CollectionInfo {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        space: DistanceSpace,
        dimensions: usize,
        embedder: impl Into<String>,
    ) -> Self {
        Self {
            id: CollectionId::new(),
            name: name.into(),
            space,
            dimensions,
            embedder: embedder.into(),
            created_at: Utc::now(),
        }
    }
}
