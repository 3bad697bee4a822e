//! Discovery and parsing of the CSV files in a corpus directory.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{EtlError, EtlResult};
use crate::table::{Row, Table};

/// Field values read as missing, in addition to the empty string.
pub const MISSING_MARKERS: &[&str] = &[
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// List the `.csv` files directly inside `dir`, sorted by file name.
///
/// Subdirectories are not descended into. A missing or unreadable
/// directory is an I/O error; a directory without CSV files yields an empty
/// list.
pub fn discover_csv_files(dir: &Path) -> EtlResult<Vec<PathBuf>> {
    let metadata = std::fs::metadata(dir).map_err(|e| EtlError::io(dir, e))?;
    if !metadata.is_dir() {
        return Err(EtlError::io(
            dir,
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "not a directory"),
        ));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(false)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| EtlError::io(dir, e.into()))?;
        let path = entry.path();
        if path.is_file() && is_csv_file(path) {
            files.push(path.to_path_buf());
        }
    }

    Ok(files)
}

fn is_csv_file(path: &Path) -> bool {
    path.file_name()
        .is_some_and(|name| name.to_string_lossy().ends_with(".csv"))
}

fn is_missing(value: &str) -> bool {
    value.is_empty() || MISSING_MARKERS.contains(&value)
}

/// Rename repeated header names `x, x` to `x, x.1`, `x.2`, ...
fn dedupe_headers(headers: &csv::StringRecord) -> Vec<String> {
    let mut columns: Vec<String> = Vec::with_capacity(headers.len());
    for name in headers {
        let mut candidate = name.to_string();
        let mut suffix = 1;
        while columns.contains(&candidate) {
            candidate = format!("{name}.{suffix}");
            suffix += 1;
        }
        columns.push(candidate);
    }
    columns
}

/// Parse one CSV file into a table and blank out missing text.
///
/// The first line is the header. Missing values in `text_column` become
/// the empty string. Rows with more fields than the header, invalid UTF-8
/// or a header without `text_column` are parse errors.
pub fn read_table(path: &Path, text_column: &str) -> EtlResult<Table> {
    let parse_error = |message: String| EtlError::Parse {
        path: path.to_path_buf(),
        message,
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .map_err(|e| match e.into_kind() {
            csv::ErrorKind::Io(io) => EtlError::io(path, io),
            other => parse_error(format!("{other:?}")),
        })?;

    let headers = reader
        .headers()
        .map_err(|e| parse_error(e.to_string()))?
        .clone();
    let mut table = Table::new(dedupe_headers(&headers));

    if table.column_position(text_column).is_none() {
        return Err(EtlError::MissingColumn {
            origin: path.display().to_string(),
            column: text_column.to_string(),
        });
    }

    for (line, record) in reader.records().enumerate() {
        let record = record.map_err(|e| parse_error(e.to_string()))?;
        if record.len() > headers.len() {
            return Err(parse_error(format!(
                "expected {} fields in record {}, saw {}",
                headers.len(),
                line + 1,
                record.len()
            )));
        }

        let row: Row = record
            .iter()
            .map(|field| (!is_missing(field)).then(|| field.to_string()))
            .collect();
        table.push_row(row);
    }

    table.fill_missing(text_column, "");
    log::debug!("Read {} rows from {}", table.len(), path.display());
    Ok(table)
}
