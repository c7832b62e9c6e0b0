//! Top-K similarity ranking.
//!
//! Ranking runs either over an in-memory candidate set (brute-force cosine
//! similarity) or through a [`NeighborSource`] such as a remote vector
//! index. In both cases [`top_k`] owns the output contract:
//!
//! 1. At most `k` results.
//! 2. Sorted by descending score.
//! 3. No unrankable (non-finite) scores.
//! 4. Fewer than `k` results when the source has fewer entries; not an error.

use async_trait::async_trait;
use std::cmp::Ordering;

use crate::error::PipelineError;
use crate::models::{IndexEntry, RankedCandidate};
use crate::similarity::{cosine_similarity, is_rankable};

/// A nearest-neighbor search capability.
///
/// Implementations return candidates ordered by descending similarity as
/// they define it. They may return fewer than `k` entries.
#[async_trait]
pub trait NeighborSource: Send + Sync {
    /// Find up to `k` entries most similar to `query`.
    async fn nearest(&self, query: &[f32], k: usize) -> Result<Vec<RankedCandidate>, PipelineError>;
}

/// Score every entry against `query` and keep the best `k`.
///
/// Ties are broken by document path (ascending) so the output is
/// deterministic regardless of input order.
///
/// # Errors
///
/// [`PipelineError::DimensionMismatch`] if any entry's vector length
/// differs from the query's.
pub fn top_k_in_memory(
    k: usize,
    query: &[f32],
    entries: &[IndexEntry],
) -> Result<Vec<RankedCandidate>, PipelineError> {
    if k == 0 {
        return Ok(Vec::new());
    }

    let mut scored = Vec::with_capacity(entries.len());
    for entry in entries {
        let score = cosine_similarity(query, &entry.vector)?;
        if is_rankable(score) {
            scored.push(RankedCandidate {
                reference: entry.reference.clone(),
                score,
            });
        }
    }

    scored.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.reference.path.cmp(&b.reference.path))
    });
    scored.truncate(k);
    Ok(scored)
}

/// Retrieve the top `k` documents for `query` from `source`.
///
/// The source's ordering is kept for equal scores (stable sort).
pub async fn top_k<S: NeighborSource + ?Sized>(
    k: usize,
    query: &[f32],
    source: &S,
) -> Result<Vec<RankedCandidate>, PipelineError> {
    if k == 0 {
        return Ok(Vec::new());
    }

    let mut candidates = source.nearest(query, k).await?;
    candidates.retain(|c| is_rankable(c.score));
    candidates.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    candidates.truncate(k);
    Ok(candidates)
}

/// Pick the single most similar entry.
///
/// Returns `None` when there are no rankable entries. Equal best scores
/// resolve to the lowest path.
pub fn best_match(
    query: &[f32],
    entries: &[IndexEntry],
) -> Result<Option<RankedCandidate>, PipelineError> {
    Ok(top_k_in_memory(1, query, entries)?.into_iter().next())
}

/// An in-memory candidate set usable wherever a [`NeighborSource`] is expected.
#[derive(Debug, Clone, Default)]
pub struct CandidateSet {
    entries: Vec<IndexEntry>,
}

impl CandidateSet {
    pub fn new(entries: Vec<IndexEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl NeighborSource for CandidateSet {
    async fn nearest(&self, query: &[f32], k: usize) -> Result<Vec<RankedCandidate>, PipelineError> {
        top_k_in_memory(k, query, &self.entries)
    }
}
