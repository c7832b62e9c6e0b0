//! Vector similarity.
//!
//! Embeddings from the upstream service have a fixed dimensionality, so a
//! length mismatch between two vectors is a pipeline fault rather than a
//! score of zero.

use crate::error::PipelineError;

/// Compute cosine similarity between two embedding vectors.
///
/// Returns a value in `[-1.0, 1.0]`:
/// - `1.0` = identical direction
/// - `0.0` = orthogonal (unrelated)
/// - `-1.0` = opposite direction
///
/// A zero-magnitude vector has no direction; its score is
/// `f32::NEG_INFINITY`, which ranks below every real score and is filtered
/// out by [`is_rankable`]. Non-finite inputs end up there too.
///
/// # Formula
///
/// ```text
///            a · b
/// cos(θ) = ─────────
///          ‖a‖ × ‖b‖
/// ```
///
/// # Errors
///
/// [`PipelineError::DimensionMismatch`] when the lengths differ.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32, PipelineError> {
    if a.len() != b.len() {
        return Err(PipelineError::DimensionMismatch {
            query: a.len(),
            candidate: b.len(),
        });
    }

    // Accumulate in f64: 1536-dim f32 sums drift enough to push v·v past 1.0.
    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;

    for (&x, &y) in a.iter().zip(b.iter()) {
        let (x, y) = (x as f64, y as f64);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 || !denom.is_finite() {
        return Ok(f32::NEG_INFINITY);
    }

    let score = (dot / denom).clamp(-1.0, 1.0) as f32;
    if score.is_nan() {
        return Ok(f32::NEG_INFINITY);
    }
    Ok(score)
}

/// Whether a score may appear in a ranking.
pub fn is_rankable(score: f32) -> bool {
    score.is_finite()
}
