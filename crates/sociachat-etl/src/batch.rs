use serde_json::Value;
use sociachat_core::model::Metadata;

use crate::error::{EtlError, EtlResult};
use crate::table::Table;

/// Metadata key under which every document's topic is stored.
pub const TOPIC_KEY: &str = "keyword";

/// Parallel documents, metadatas and ids ready to be added to a collection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentBatch {
    pub documents: Vec<String>,
    pub metadatas: Vec<Metadata>,
    pub ids: Vec<String>,
}

/// A borrowed slice of a [`DocumentBatch`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatchChunk<'a> {
    pub documents: &'a [String],
    pub metadatas: &'a [Metadata],
    pub ids: &'a [String],
}

impl DocumentBatch {
    /// Build documents from `text_column`, tagging each with `topic` and
    /// identifying it by its table index label.
    ///
    /// A table with no rows yields an empty batch even when it has no
    /// columns at all.
    pub fn from_table(table: &Table, text_column: &str, topic: &str) -> EtlResult<Self> {
        if table.is_empty() {
            return Ok(Self::default());
        }

        let documents: Vec<String> = table
            .column(text_column)
            .ok_or_else(|| EtlError::MissingColumn {
                origin: "combined table".to_string(),
                column: text_column.to_string(),
            })?
            .into_iter()
            .map(|value| value.unwrap_or_default().to_string())
            .collect();

        let mut metadata = Metadata::new();
        metadata.insert(TOPIC_KEY.to_string(), Value::String(topic.to_string()));
        let metadatas = vec![metadata; documents.len()];

        let ids = table.index().iter().map(|i| i.to_string()).collect();

        Ok(Self {
            documents,
            metadatas,
            ids,
        })
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Consecutive chunks of at most `size` items; the last may be shorter.
    ///
    /// # Panics
    /// Panics if `size` is zero.
    pub fn chunks(&self, size: usize) -> impl Iterator<Item = BatchChunk<'_>> {
        self.documents
            .chunks(size)
            .zip(self.metadatas.chunks(size))
            .zip(self.ids.chunks(size))
            .map(|((documents, metadatas), ids)| BatchChunk {
                documents,
                metadatas,
                ids,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(values: &[Option<&str>]) -> Table {
        let mut table = Table::new(vec!["tweet".to_string()]);
        for v in values {
            table.push_row(vec![v.map(str::to_string)]);
        }
        table
    }

    #[test]
    fn test_from_table() {
        let mut t = table(&[Some("a"), Some("b"), Some("a"), Some("c")]);
        t.drop_duplicates();

        let batch = DocumentBatch::from_table(&t, "tweet", "politik").unwrap();
        assert_eq!(batch.documents, vec!["a", "b", "c"]);
        assert_eq!(batch.ids, vec!["0", "1", "3"]);
        assert_eq!(batch.metadatas.len(), 3);
        assert!(batch
            .metadatas
            .iter()
            .all(|m| m.get(TOPIC_KEY) == Some(&Value::String("politik".into()))));
    }

    #[test]
    fn test_from_empty_table() {
        let batch = DocumentBatch::from_table(&Table::default(), "tweet", "politik").unwrap();
        assert!(batch.is_empty());
    }

    #[test]
    fn test_from_table_missing_column() {
        let mut t = Table::new(vec!["text".to_string()]);
        t.push_row(vec![Some("a".to_string())]);
        let err = DocumentBatch::from_table(&t, "tweet", "politik").unwrap_err();
        assert!(matches!(err, EtlError::MissingColumn { .. }));
    }

    #[test]
    fn test_chunks_cover_batch_in_order() {
        let values: Vec<String> = (0..12).map(|i| format!("t{i}")).collect();
        let t = table(&values.iter().map(|v| Some(v.as_str())).collect::<Vec<_>>());
        let batch = DocumentBatch::from_table(&t, "tweet", "politik").unwrap();

        let chunks: Vec<BatchChunk<'_>> = batch.chunks(5).collect();
        let sizes: Vec<usize> = chunks.iter().map(|c| c.documents.len()).collect();
        assert_eq!(sizes, vec![5, 5, 2]);
        assert!(chunks
            .iter()
            .all(|c| c.documents.len() == c.ids.len() && c.ids.len() == c.metadatas.len()));

        let rebuilt: Vec<String> = chunks.iter().flat_map(|c| c.documents.to_vec()).collect();
        assert_eq!(rebuilt, batch.documents);
    }

    #[test]
    fn test_chunks_of_empty_batch() {
        assert_eq!(DocumentBatch::default().chunks(5000).count(), 0);
    }
}
