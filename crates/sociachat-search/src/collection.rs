//! Collection handles: batch writes and similarity queries.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};

use serde::{Deserialize, Serialize};
use sociachat_core::model::{CollectionInfo, Metadata, StoredDocument};
use sociachat_core::schema::Database;

use crate::distance::distance;
use crate::embedding::Embedder;
use crate::error::{StoreError, StoreResult};
use crate::MAX_BATCH_SIZE;

/// Batch-shaped query output: one inner list per query text, each ordered
/// by ascending distance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub ids: Vec<Vec<String>>,
    pub documents: Vec<Vec<String>>,
    pub metadatas: Vec<Vec<Metadata>>,
    pub distances: Vec<Vec<f32>>,
}

impl QueryResult {
    /// Number of query texts this result answers.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Zip the parallel lists into per-query candidate lists.
    #[must_use]
    pub fn into_candidates(self) -> Vec<Vec<Candidate>> {
        self.ids
            .into_iter()
            .zip(self.documents)
            .zip(self.metadatas)
            .zip(self.distances)
            .map(|(((ids, documents), metadatas), distances)| {
                ids.into_iter()
                    .zip(documents)
                    .zip(metadatas)
                    .zip(distances)
                    .map(|(((id, document), metadata), distance)| Candidate {
                        id,
                        document,
                        metadata,
                        distance,
                    })
                    .collect()
            })
            .collect()
    }
}

/// A single document returned by a similarity query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: String,
    pub document: String,
    pub metadata: Metadata,
    /// Dissimilarity to the query; lower is more similar.
    pub distance: f32,
}

/// An open collection.
#[derive(Debug)]
pub struct Collection<'c> {
    info: CollectionInfo,
    db: &'c Database,
    embedder: &'c dyn Embedder,
}

impl<'c> Collection<'c> {
    pub(crate) fn new(info: CollectionInfo, db: &'c Database, embedder: &'c dyn Embedder) -> Self {
        Self { info, db, embedder }
    }

    pub fn name(&self) -> &str {
        &self.info.name
    }

    pub fn info(&self) -> &CollectionInfo {
        &self.info
    }

    /// Number of documents stored in the collection.
    pub fn count(&self) -> StoreResult<usize> {
        Ok(self.db.count_documents(&self.info.id)?)
    }

    /// Add a batch of documents.
    ///
    /// The collection is append-only through this call: ids that already
    /// exist are left untouched and skipped with a warning. Returns the
    /// number of documents actually inserted.
    pub fn add(
        &self,
        documents: &[String],
        metadatas: &[Metadata],
        ids: &[String],
    ) -> StoreResult<usize> {
        let batch = self.prepare_batch(documents, metadatas, ids)?;
        let inserted = self.db.insert_documents(&self.info.id, &batch)?;

        let skipped = batch.len() - inserted;
        if skipped > 0 {
            log::warn!(
                "Skipped {} ids already present in collection {}",
                skipped,
                self.info.name
            );
        }
        log::debug!("Added {} documents to {}", inserted, self.info.name);
        Ok(inserted)
    }

    /// Add a batch of documents, replacing any whose id already exists.
    pub fn upsert(
        &self,
        documents: &[String],
        metadatas: &[Metadata],
        ids: &[String],
    ) -> StoreResult<usize> {
        let batch = self.prepare_batch(documents, metadatas, ids)?;
        let written = self.db.upsert_documents(&self.info.id, &batch)?;
        log::debug!("Upserted {} documents into {}", written, self.info.name);
        Ok(written)
    }

    fn prepare_batch(
        &self,
        documents: &[String],
        metadatas: &[Metadata],
        ids: &[String],
    ) -> StoreResult<Vec<StoredDocument>> {
        if documents.len() != metadatas.len() || documents.len() != ids.len() {
            return Err(StoreError::MismatchedBatch {
                documents: documents.len(),
                metadatas: metadatas.len(),
                ids: ids.len(),
            });
        }
        if ids.len() > MAX_BATCH_SIZE {
            return Err(StoreError::BatchTooLarge {
                size: ids.len(),
                limit: MAX_BATCH_SIZE,
            });
        }

        let mut seen = HashSet::with_capacity(ids.len());
        if let Some(dup) = ids.iter().find(|id| !seen.insert(id.as_str())) {
            return Err(StoreError::DuplicateId { id: dup.clone() });
        }

        documents
            .iter()
            .zip(metadatas)
            .zip(ids)
            .map(|((document, metadata), id)| {
                let embedding = self.embedder.embed(document)?;
                Ok(StoredDocument::new(
                    id.as_str(),
                    document.as_str(),
                    metadata.clone(),
                    embedding,
                ))
            })
            .collect()
    }

    /// Find the `n_results` nearest documents for each query text.
    ///
    /// Stored rows are streamed once; each query keeps only its current
    /// best `n_results`. Equal distances keep insertion order.
    pub fn query<S: AsRef<str>>(
        &self,
        query_texts: &[S],
        n_results: usize,
    ) -> StoreResult<QueryResult> {
        let queries = query_texts
            .iter()
            .map(|text| self.embedder.embed(text.as_ref()))
            .collect::<StoreResult<Vec<_>>>()?;
        let mut nearest: Vec<BinaryHeap<RankedDocument>> = queries
            .iter()
            .map(|_| BinaryHeap::with_capacity(n_results.saturating_add(1)))
            .collect();

        if n_results > 0 {
            let mut position = 0;
            self.db.for_each_document(&self.info.id, |doc| {
                for (query, heap) in queries.iter().zip(nearest.iter_mut()) {
                    let candidate = Ranked {
                        distance: distance(self.info.space, query, &doc.embedding),
                        position,
                    };
                    if heap.len() < n_results {
                        heap.push(candidate.with_document(&doc));
                    } else if heap.peek().is_some_and(|worst| candidate < worst.key) {
                        heap.pop();
                        heap.push(candidate.with_document(&doc));
                    }
                }
                position += 1;
            })?;
        }

        let mut result = QueryResult::default();
        for heap in nearest {
            let ranked = heap.into_sorted_vec();
            result.ids.push(ranked.iter().map(|r| r.id.clone()).collect());
            result
                .documents
                .push(ranked.iter().map(|r| r.document.clone()).collect());
            result
                .metadatas
                .push(ranked.iter().map(|r| r.metadata.clone()).collect());
            result.distances.push(ranked.iter().map(|r| r.key.distance).collect());
        }

        log::debug!(
            "Queried {} with {} texts for {} results each",
            self.info.name,
            query_texts.len(),
            n_results
        );
        Ok(result)
    }

    /// Single-text convenience wrapper around [`Collection::query`].
    pub fn query_one(&self, query_text: &str, n_results: usize) -> StoreResult<Vec<Candidate>> {
        Ok(self
            .query(&[query_text], n_results)?
            .into_candidates()
            .into_iter()
            .next()
            .unwrap_or_default())
    }
}

/// Sort key of a scored row: distance, then insertion position.
#[derive(Debug, Clone, Copy)]
struct Ranked {
    distance: f32,
    position: usize,
}

impl Ranked {
    fn with_document(self, doc: &StoredDocument) -> RankedDocument {
        RankedDocument {
            key: self,
            id: doc.id.clone(),
            document: doc.document.clone(),
            metadata: doc.metadata.clone(),
        }
    }
}

impl Ord for Ranked {
    fn cmp(&self, other: &Self) -> Ordering {
        compare_distance(self.distance, other.distance).then(self.position.cmp(&other.position))
    }
}

impl PartialOrd for Ranked {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Ranked {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Ranked {}

/// A row kept in a query's nearest set, ordered by its [`Ranked`] key.
#[derive(Debug)]
struct RankedDocument {
    key: Ranked,
    id: String,
    document: String,
    metadata: Metadata,
}

impl Ord for RankedDocument {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key)
    }
}

impl PartialOrd for RankedDocument {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for RankedDocument {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for RankedDocument {}

/// Ascending order with NaN after every number.
pub(crate) fn compare_distance(a: f32, b: f32) -> Ordering {
    a.partial_cmp(&b)
        .unwrap_or_else(|| a.is_nan().cmp(&b.is_nan()))
}
