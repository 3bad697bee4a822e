//! # Sociachat
//!
//! Retrieval backend for a social-media analysis assistant.
//!
//! Sociachat ingests tweet exports from CSV files, deduplicates them, and
//! stores them in a persistent vector collection. Retrieval queries return
//! the closest tweets as a single ranked text block, ready to be placed in a
//! language-model prompt as context.
