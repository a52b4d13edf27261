//! Cosine similarity and ranking.
//!
//! Zero-norm policy: a zero vector has no direction, so its similarity to
//! anything is reported as [`RoomError::ZeroNorm`] rather than NaN. NaN or
//! infinite components are [`RoomError::NonFinite`]. Callers
//! validate node embeddings once at insertion via [`validate`]; after that the
//! only vector that can fail at plan time is the query.

use rayon::prelude::*;

use crate::error::{Result, RoomError};
use crate::fast_math::{dot, norm_squared};

/// Below this many nodes the rayon fan-out costs more than it saves.
const PARALLEL_THRESHOLD: usize = 256;

/// Cosine similarity `dot(a,b) / (|a|·|b|)`, clamped to [-1, 1].
///
/// Fails on empty input, mismatched lengths, a non-finite component, or a
/// zero-norm operand.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    validate(a, None)?;
    validate(b, Some(a.len()))?;
    let na = norm_squared(a);
    let nb = norm_squared(b);
    Ok(cosine_unchecked(a, b, na.sqrt() * nb.sqrt()))
}

/// Similarity with the norm product precomputed. Inputs already validated.
#[inline]
fn cosine_unchecked(a: &[f32], b: &[f32], norm_product: f64) -> f32 {
    (dot(a, b) / norm_product).clamp(-1.0, 1.0) as f32
}

/// Check that `v` is usable as an embedding of dimensionality `dim`
/// (or any dimensionality when `dim` is `None`).
pub fn validate(v: &[f32], dim: Option<usize>) -> Result<()> {
    if v.is_empty() {
        return Err(RoomError::EmptyVector);
    }
    if let Some(expected) = dim {
        if v.len() != expected {
            return Err(RoomError::DimensionMismatch {
                expected,
                actual: v.len(),
            });
        }
    }
    if v.iter().any(|x| !x.is_finite()) {
        return Err(RoomError::NonFinite);
    }
    if norm_squared(v) == 0.0 {
        return Err(RoomError::ZeroNorm);
    }
    Ok(())
}

/// One scored entry: index into the caller's node slice plus its similarity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scored {
    pub index: usize,
    pub similarity: f32,
}

/// Score every embedding against `query` and sort descending.
///
/// The sort is stable, so equal similarities keep insertion order. Every
/// embedding must share the query's dimensionality.
pub fn rank<E>(query: &[f32], embeddings: &[E]) -> Result<Vec<Scored>>
where
    E: AsRef<[f32]> + Sync,
{
    validate(query, None)?;
    let qn = norm_squared(query).sqrt();

    let score = |(index, e): (usize, &E)| -> Result<Scored> {
        let e = e.as_ref();
        validate(e, Some(query.len()))?;
        let en = norm_squared(e);
        Ok(Scored {
            index,
            similarity: cosine_unchecked(e, query, en.sqrt() * qn),
        })
    };

    let mut scored: Vec<Scored> = if embeddings.len() >= PARALLEL_THRESHOLD {
        embeddings
            .par_iter()
            .enumerate()
            .map(score)
            .collect::<Result<Vec<_>>>()?
    } else {
        embeddings
            .iter()
            .enumerate()
            .map(score)
            .collect::<Result<Vec<_>>>()?
    };

    scored.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
    Ok(scored)
}
