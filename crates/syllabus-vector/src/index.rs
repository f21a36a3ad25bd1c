use std::cmp::Ordering;

use syllabus_core::error::{Error, Result};
use syllabus_core::vector::{dot, normalize};

/// Exact inner-product index over L2-normalized rows.
///
/// Rows are stored contiguously; a row's position is its passage id. The index
/// is append-only: there is no update or delete.
#[derive(Debug, Clone)]
pub struct FlatIndex {
    dim: usize,
    data: Vec<f32>,
}

impl FlatIndex {
    pub fn new(dim: usize) -> Self {
        Self { dim, data: Vec::new() }
    }

    pub(crate) fn from_raw(dim: usize, data: Vec<f32>) -> Result<Self> {
        if dim == 0 || data.len() % dim != 0 {
            return Err(Error::Corrupt(format!("{} floats do not form rows of dimension {dim}", data.len())));
        }
        Ok(Self { dim, data })
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn len(&self) -> usize {
        if self.dim == 0 { 0 } else { self.data.len() / self.dim }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub(crate) fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn vector(&self, id: usize) -> Option<&[f32]> {
        let start = id.checked_mul(self.dim)?;
        self.data.get(start..start + self.dim)
    }

    /// Normalize and append `vectors`, assigning ids in insertion order.
    /// Returns the first assigned id. Nothing is appended unless every vector
    /// is valid.
    pub fn add(&mut self, vectors: &[Vec<f32>]) -> Result<usize> {
        let first_id = self.len();
        let mut rows = Vec::with_capacity(vectors.len() * self.dim);
        for v in vectors {
            if v.len() != self.dim {
                return Err(Error::DimensionMismatch { expected: self.dim, actual: v.len() });
            }
            let start = rows.len();
            rows.extend_from_slice(v);
            normalize(&mut rows[start..])?;
        }
        self.data.extend(rows);
        Ok(first_id)
    }

    /// Top-`k` ids by inner product with `query`, best first; equal scores
    /// are ordered by ascending id. `query` must already be normalized.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<(usize, f32)>> {
        if query.len() != self.dim {
            return Err(Error::DimensionMismatch { expected: self.dim, actual: query.len() });
        }
        if k == 0 || self.is_empty() {
            return Ok(Vec::new());
        }
        // `+ 0.0` folds -0.0 into 0.0 so total_cmp treats them as a tie.
        let mut scored: Vec<(usize, f32)> =
            self.data.chunks_exact(self.dim).map(|row| dot(row, query) + 0.0).enumerate().collect();
        if k < scored.len() {
            scored.select_nth_unstable_by(k - 1, rank);
            scored.truncate(k);
        }
        scored.sort_by(rank);
        Ok(scored)
    }
}

fn rank(a: &(usize, f32), b: &(usize, f32)) -> Ordering {
    b.1.total_cmp(&a.1).then(a.0.cmp(&b.0))
}
