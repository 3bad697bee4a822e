use std::path::Path;

use sociachat_search::{Client, Collection};

use crate::batch::DocumentBatch;
use crate::config::Config;
use crate::error::EtlResult;
use crate::scan::{discover_csv_files, read_table};
use crate::table::Table;

/// Counts gathered during one indexing run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexReport {
    /// CSV files read.
    pub files: usize,
    /// Rows in the combined table before deduplication.
    pub rows: usize,
    /// Rows equal to an earlier row, dropped before indexing.
    pub duplicates: usize,
    /// Documents handed to the collection.
    pub documents: usize,
    /// `add` calls made.
    pub batches: usize,
    /// Documents the collection actually stored; less than `documents`
    /// when some ids were already present.
    pub inserted: usize,
}

/// Read every CSV file directly inside `dir` into one combined table.
///
/// Returns the table and the number of files read.
pub fn read_corpus(dir: &Path, text_column: &str) -> EtlResult<(Table, usize)> {
    let files = discover_csv_files(dir)?;
    let mut tables = Vec::with_capacity(files.len());
    for path in &files {
        log::debug!("Reading {}", path.display());
        tables.push(read_table(path, text_column)?);
    }
    Ok((Table::concat(tables), files.len()))
}

/// Load the corpus under `config.data_dir` and add it to the configured
/// collection, creating the collection on first use.
pub fn load_and_index<'c>(
    client: &'c Client,
    config: &Config,
) -> EtlResult<(Collection<'c>, IndexReport)> {
    config.validate_load()?;

    let collection = client.get_or_create_collection(&config.collection_name, config.distance)?;

    let (mut table, files) = read_corpus(&config.data_dir, &config.text_column)?;
    let rows = table.len();
    let duplicates = table.drop_duplicates();
    log::info!(
        "Read {} rows from {} files in {}; {} duplicates dropped",
        rows,
        files,
        config.data_dir.display(),
        duplicates
    );

    let batch = DocumentBatch::from_table(&table, &config.text_column, &config.topic)?;

    let mut report = IndexReport {
        files,
        rows,
        duplicates,
        documents: batch.len(),
        ..IndexReport::default()
    };

    for chunk in batch.chunks(config.batch_size) {
        report.inserted += collection.add(chunk.documents, chunk.metadatas, chunk.ids)?;
        report.batches += 1;
        log::debug!(
            "Batch {}: {} documents added to {}",
            report.batches,
            chunk.documents.len(),
            collection.name()
        );
    }

    log::info!(
        "Indexed {} documents into {} in {} batches",
        report.documents,
        collection.name(),
        report.batches
    );

    Ok((collection, report))
}
