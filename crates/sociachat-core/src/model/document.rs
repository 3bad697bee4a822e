use serde::{Deserialize, Serialize};

/// Flat key/value metadata attached to a document.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// A document as persisted in a collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDocument {
    /// Caller-supplied identifier, unique within its collection.
    pub id: String,

    /// The document text.
    pub document: String,

    pub metadata: Metadata,

    /// Embedding of `document`, computed when it was added.
    pub embedding: Vec<f32>,
}

impl StoredDocument {
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        document: impl Into<String>,
        metadata: Metadata,
        embedding: Vec<f32>,
    ) -> Self {
        Self {
            id: id.into(),
            document: document.into(),
            metadata,
            embedding,
        }
    }
}

/// Encode an embedding as little-endian `f32` bytes for BLOB storage.
#[must_use]
pub fn encode_embedding(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// Decode a BLOB written by [`encode_embedding`].
///
/// Returns `None` when the byte length is not a multiple of four.
#[must_use]
pub fn decode_embedding(bytes: &[u8]) -> Option<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return None;
    }
    Some(
        bytes
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect(),
    )
}
