//! ETL pipeline for sociachat.
//!
//! Reads tweet exports from a directory of CSV files, deduplicates them and
//! indexes them into a vector collection. The indexing run is exposed both
//! as a plain function ([`load_and_index`]) and as a treadle `Stage`.

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod batch;
pub mod config;
pub mod error;
pub mod loader;
pub mod pipeline;
pub mod scan;
pub mod stage;
pub mod table;
pub mod work_item;

pub use batch::DocumentBatch;
pub use config::{Config, EmbedderKind};
pub use error::{EtlError, EtlResult};
pub use loader::{load_and_index, IndexReport};
pub use pipeline::build_pipeline;
pub use stage::IndexStage;
pub use table::Table;
pub use work_item::LoadJob;

/// Printed once every batch of a load has been added.
pub const INDEX_COMPLETE_MESSAGE: &str = "---- Data telah berhasil ditambahkan ke Chroma! ----";
