//! Small dense-vector helpers. All similarity in this workspace is the inner
//! product of L2-normalized vectors.

use crate::error::{Error, Result};
use crate::traits::Embedder;

/// Stored and query vectors must be within this distance of unit norm.
pub const NORM_TOLERANCE: f32 = 1e-5;

pub fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

pub fn is_normalized(v: &[f32]) -> bool {
    (l2_norm(v) - 1.0).abs() <= NORM_TOLERANCE
}

/// Scale `v` to unit length in place.
pub fn normalize(v: &mut [f32]) -> Result<()> {
    if v.is_empty() {
        return Err(Error::InvalidVector("vector is empty".to_string()));
    }
    if v.iter().any(|x| !x.is_finite()) {
        return Err(Error::InvalidVector("vector contains non-finite values".to_string()));
    }
    // Accumulate in f64 so long vectors land inside the tolerance.
    let norm = v.iter().map(|x| f64::from(*x) * f64::from(*x)).sum::<f64>().sqrt();
    if norm <= f64::from(f32::EPSILON) {
        return Err(Error::InvalidVector("vector has zero norm".to_string()));
    }
    for x in v.iter_mut() {
        *x = (f64::from(*x) / norm) as f32;
    }
    Ok(())
}

pub fn normalized(mut v: Vec<f32>) -> Result<Vec<f32>> {
    normalize(&mut v)?;
    Ok(v)
}

/// Inner product. Callers guarantee equal lengths.
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Embed a single query through the provider and normalize it.
///
/// Provider failures become `Error::EmbeddingProvider`; a vector whose length
/// disagrees with the provider's declared dimension is a `DimensionMismatch`.
pub fn embed_query(embedder: &dyn Embedder, text: &str) -> Result<Vec<f32>> {
    let v = embedder.embed_text(text).map_err(Error::EmbeddingProvider)?;
    if v.len() != embedder.dim() {
        return Err(Error::DimensionMismatch { expected: embedder.dim(), actual: v.len() });
    }
    normalized(v)
}
