//! Vector search for sociachat.
//!
//! Persistent named collections of embedded documents, queried by
//! distance, plus the ranking step that turns a query's candidates into the
//! text block handed to downstream prompts.

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod client;
pub mod collection;
pub mod distance;
pub mod embedding;
pub mod error;
pub mod onnx;
pub mod retrieve;

pub use client::Client;
pub use collection::{Candidate, Collection, QueryResult};
pub use embedding::{Embedder, HashEmbedder};
pub use error::{StoreError, StoreResult};
pub use onnx::OnnxEmbedder;
pub use retrieve::{rank_candidates, render_summary, retrieve, RetrieveOptions};

/// Maximum number of documents a single `add`/`upsert` call accepts.
pub const MAX_BATCH_SIZE: usize = 5461;
