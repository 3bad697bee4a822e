//! Core data model for sociachat.
//!
//! This crate defines the collection and document types, the distance
//! spaces a collection can be searched in, and the SQLite schema that
//! persists collections and their embeddings.

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod error;
pub mod model;
pub mod schema;

pub use error::{Error, Result};
