//! Text embedding for collections.
//!
//! - `Embedder` is the interface both backends implement.
//! - [`OnnxEmbedder`](crate::onnx::OnnxEmbedder) runs a sentence-transformer
//!   model and is the production backend.
//! - `HashEmbedder` is a signed feature-hashing bag-of-words model with no
//!   model files. It only matches shared words; tests and explicit
//!   `embedder = "hash"` configurations use it.

use std::fmt;

use sha2::{Digest, Sha256};

use crate::error::StoreResult;

/// Dimensionality of [`HashEmbedder`] vectors unless configured otherwise.
pub const DEFAULT_DIMENSIONS: usize = 384;

/// Name recorded on collections built by [`HashEmbedder`].
pub const HASH_EMBEDDER_NAME: &str = "hash";

/// Service for turning text into fixed-length vectors.
///
/// Used both when documents are added to a collection and when a query is
/// issued against it, so the two sides always live in the same space.
pub trait Embedder: Send + Sync + fmt::Debug {
    /// Generate an embedding vector for the given text.
    fn embed(&self, text: &str) -> StoreResult<Vec<f32>>;

    /// Return the dimensionality of vectors produced by this embedder.
    fn dimensions(&self) -> usize;

    /// Stable identifier recorded on every collection this embedder builds.
    fn name(&self) -> &str;
}

/// Feature-hashing embedder.
///
/// Each lowercase alphanumeric token is hashed with SHA-256 into one of
/// `dimensions` buckets and adds `+1` or `-1` there. The result is
/// L2-normalized. Texts sharing words land close together; empty text maps
/// to the zero vector.
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dimensions: usize,
}

impl HashEmbedder {
    #[must_use]
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
        text.split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .map(|t| t.to_lowercase())
    }

    fn bucket(&self, token: &str) -> (usize, f32) {
        let digest = Sha256::digest(token.as_bytes());
        let mut index_bytes = [0u8; 8];
        index_bytes.copy_from_slice(&digest[..8]);
        let index = (u64::from_le_bytes(index_bytes) % self.dimensions as u64) as usize;
        let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
        (index, sign)
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_DIMENSIONS)
    }
}

impl Embedder for HashEmbedder {
    fn embed(&self, text: &str) -> StoreResult<Vec<f32>> {
        let mut vector = vec![0.0f32; self.dimensions];
        for token in Self::tokens(text) {
            let (index, sign) = self.bucket(&token);
            vector[index] += sign;
        }

        let norm: f32 = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for val in &mut vector {
                *val /= norm;
            }
        }

        Ok(vector)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        HASH_EMBEDDER_NAME
    }
}
