//! Query/rank: turn a similarity query into a ranked text summary.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::collection::{compare_distance, Collection};
use crate::error::StoreResult;

/// How many candidates to fetch and how many to keep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrieveOptions {
    /// Number of ranked entries rendered into the summary.
    pub top_k: usize,
    /// Number of nearest candidates requested from the collection.
    pub candidate_limit: usize,
}

impl Default for RetrieveOptions {
    fn default() -> Self {
        Self {
            top_k: 10,
            candidate_limit: 1000,
        }
    }
}

/// Query `collection` for `query_text` and render the best matches.
///
/// The collection's own result order is not trusted: candidates are
/// re-sorted by ascending distance before the top `top_k` are taken.
/// An empty collection yields an empty string.
pub fn retrieve(
    collection: &Collection<'_>,
    query_text: impl fmt::Display,
    options: &RetrieveOptions,
) -> StoreResult<String> {
    let query_text = query_text.to_string();
    let candidates = collection.query_one(&query_text, options.candidate_limit)?;

    log::debug!(
        "Ranking {} candidates from {} for {:?}",
        candidates.len(),
        collection.name(),
        query_text
    );

    let pairs = candidates
        .into_iter()
        .map(|c| (c.document, c.distance))
        .collect();
    let ranked = rank_candidates(pairs, options.top_k);
    Ok(render_summary(&ranked))
}

/// Stable sort by ascending distance, then keep the first `top_k`.
///
/// Ties keep their input order; NaN distances sort last.
#[must_use]
pub fn rank_candidates<D>(mut pairs: Vec<(D, f32)>, top_k: usize) -> Vec<(D, f32)> {
    pairs.sort_by(|a, b| compare_distance(a.1, b.1));
    pairs.truncate(top_k);
    pairs
}

/// Render ranked documents as `- Informasi {rank}: {document} | ` segments.
#[must_use]
pub fn render_summary<D: fmt::Display>(ranked: &[(D, f32)]) -> String {
    ranked
        .iter()
        .enumerate()
        .map(|(i, (document, _))| format!("- Informasi {}: {} | ", i + 1, document))
        .collect()
}
