//! A minimal string table with a row index, enough to concatenate CSV
//! files and drop duplicate rows the way a dataframe would.

use std::collections::HashSet;

/// One row: a value per column, `None` where the value is missing.
pub type Row = Vec<Option<String>>;

/// Rows of optional strings under named columns.
///
/// Every row carries an index label. [`Table::concat`] assigns labels
/// `0..n`; [`Table::drop_duplicates`] removes rows without relabelling the
/// survivors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    columns: Vec<String>,
    index: Vec<usize>,
    rows: Vec<Row>,
}

impl Table {
    #[must_use]
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            index: Vec::new(),
            rows: Vec::new(),
        }
    }

    /// Append a row, padding short rows with missing values.
    ///
    /// Values beyond the last column are dropped.
    pub fn push_row(&mut self, mut row: Row) {
        row.resize(self.columns.len(), None);
        self.index.push(self.rows.len());
        self.rows.push(row);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Index labels, parallel to [`Table::rows`].
    pub fn index(&self) -> &[usize] {
        &self.index
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Values of one column, in row order.
    pub fn column(&self, name: &str) -> Option<Vec<Option<&str>>> {
        let pos = self.column_position(name)?;
        Some(self.rows.iter().map(|row| row[pos].as_deref()).collect())
    }

    /// Replace missing values in `column` with `value`.
    ///
    /// Returns `false` if the column does not exist.
    pub fn fill_missing(&mut self, column: &str, value: &str) -> bool {
        let Some(pos) = self.column_position(column) else {
            return false;
        };
        for row in &mut self.rows {
            if row[pos].is_none() {
                row[pos] = Some(value.to_string());
            }
        }
        true
    }

    /// Stack tables vertically.
    ///
    /// The result's columns are the union of the inputs' columns in
    /// first-seen order; a row gets a missing value for every column its
    /// source table lacked. Rows keep table order then row order and are
    /// relabelled `0..n`.
    #[must_use]
    pub fn concat(tables: Vec<Table>) -> Table {
        let mut columns: Vec<String> = Vec::new();
        for table in &tables {
            for column in &table.columns {
                if !columns.contains(column) {
                    columns.push(column.clone());
                }
            }
        }

        let mut combined = Table::new(columns);
        for table in tables {
            let positions: Vec<usize> = table
                .columns
                .iter()
                .filter_map(|c| combined.column_position(c))
                .collect();
            for row in table.rows {
                let mut out: Row = vec![None; combined.columns.len()];
                for (value, &pos) in row.into_iter().zip(&positions) {
                    out[pos] = value;
                }
                combined.push_row(out);
            }
        }
        combined
    }

    /// Flag every row that equals an earlier row in all columns.
    ///
    /// Missing values compare equal to each other.
    pub fn duplicated(&self) -> Vec<bool> {
        let mut seen: HashSet<&Row> = HashSet::with_capacity(self.rows.len());
        self.rows.iter().map(|row| !seen.insert(row)).collect()
    }

    /// Remove duplicate rows, keeping the first occurrence of each.
    ///
    /// Surviving rows keep their index labels. Returns how many rows were
    /// removed.
    pub fn drop_duplicates(&mut self) -> usize {
        let flags = self.duplicated();
        let removed = flags.iter().filter(|d| **d).count();
        if removed == 0 {
            return 0;
        }

        let rows = std::mem::take(&mut self.rows);
        let index = std::mem::take(&mut self.index);
        for ((row, label), dup) in rows.into_iter().zip(index).zip(flags) {
            if !dup {
                self.rows.push(row);
                self.index.push(label);
            }
        }
        removed
    }
}
