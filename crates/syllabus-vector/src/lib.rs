//! syllabus-vector
//!
//! Exact vector search over the passage corpus: the flat inner-product index,
//! the passage metadata store, persistence, the offline builder and the
//! query-side `Retriever`.

use syllabus_core::error::{Error, Result};
use syllabus_core::RetrievalResult;

pub mod enhance;
pub mod index;
pub mod persist;
pub mod search;
pub mod store;
pub mod writer;

pub use enhance::QueryEnhancer;
pub use index::FlatIndex;
pub use search::Retriever;
pub use store::{CoverageStats, PassageStore};
pub use writer::build_corpus_index;

/// A vector index and its passage store, kept in lock-step by id.
#[derive(Debug, Clone)]
pub struct CorpusIndex {
    vectors: FlatIndex,
    passages: PassageStore,
    embedder_id: String,
}

impl CorpusIndex {
    pub fn new(vectors: FlatIndex, passages: PassageStore, embedder_id: impl Into<String>) -> Result<Self> {
        if vectors.len() != passages.len() {
            return Err(Error::Corrupt(format!(
                "index holds {} vectors but store holds {} passages",
                vectors.len(),
                passages.len()
            )));
        }
        Ok(Self { vectors, passages, embedder_id: embedder_id.into() })
    }

    pub fn empty(dim: usize, embedder_id: impl Into<String>) -> Self {
        Self { vectors: FlatIndex::new(dim), passages: PassageStore::default(), embedder_id: embedder_id.into() }
    }

    pub fn len(&self) -> usize {
        self.passages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passages.is_empty()
    }

    pub fn dim(&self) -> usize {
        self.vectors.dim()
    }

    pub fn embedder_id(&self) -> &str {
        &self.embedder_id
    }

    pub fn vectors(&self) -> &FlatIndex {
        &self.vectors
    }

    pub fn passages(&self) -> &PassageStore {
        &self.passages
    }

    /// Nearest passages to a normalized query vector, best first.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<RetrievalResult>> {
        let hits = self.vectors.search(query, k)?;
        hits.into_iter()
            .map(|(id, score)| {
                let passage = self
                    .passages
                    .get(id)
                    .ok_or_else(|| Error::Corrupt(format!("vector {id} has no passage")))?;
                Ok(RetrievalResult::new(passage.clone(), score))
            })
            .collect()
    }
}
