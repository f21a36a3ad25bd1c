use std::sync::Arc;

use tracing::debug;

use syllabus_core::config::RetrievalSettings;
use syllabus_core::error::{Error, Result};
use syllabus_core::traits::Embedder;
use syllabus_core::vector::embed_query;
use syllabus_core::{RetrievalResult, Source, Unit};

use crate::enhance::QueryEnhancer;
use crate::CorpusIndex;

/// Query-side view of a loaded corpus. Holds only shared, read-only state, so
/// one instance serves concurrent queries.
pub struct Retriever {
    embedder: Arc<dyn Embedder>,
    index: Arc<CorpusIndex>,
    enhancer: QueryEnhancer,
    settings: RetrievalSettings,
}

impl Retriever {
    pub fn new(embedder: Arc<dyn Embedder>, index: Arc<CorpusIndex>, settings: &RetrievalSettings) -> Result<Self> {
        if !index.is_empty() && index.dim() != embedder.dim() {
            return Err(Error::DimensionMismatch { expected: index.dim(), actual: embedder.dim() });
        }
        let enhancer = QueryEnhancer::new(&settings.expansions)?;
        Ok(Self { embedder, index, enhancer, settings: settings.clone() })
    }

    pub fn index(&self) -> &CorpusIndex {
        &self.index
    }

    pub fn settings(&self) -> &RetrievalSettings {
        &self.settings
    }

    /// Up to `k` passages scoring at least `min_score`, best first.
    ///
    /// An empty index yields an empty result without calling the embedder.
    pub fn search(&self, query: &str, k: usize, min_score: f32) -> Result<Vec<RetrievalResult>> {
        if k == 0 || self.index.is_empty() {
            return Ok(Vec::new());
        }
        let enhanced = self.enhancer.enhance(query);
        let query_vec = embed_query(self.embedder.as_ref(), &enhanced)?;
        let mut results = self.index.search(&query_vec, k)?;
        results.retain(|r| r.score >= min_score);
        debug!(query, enhanced = %enhanced, hits = results.len(), "search");
        Ok(results)
    }

    /// Passages of one unit. Over-fetches before filtering so a unit that is
    /// not dominant in the global ranking still gets candidates.
    pub fn search_by_unit(&self, query: &str, unit: Unit, k: usize) -> Result<Vec<RetrievalResult>> {
        let candidates = k
            .saturating_mul(self.settings.unit_overfetch)
            .max(self.settings.min_unit_candidates);
        let mut results = self.search(query, candidates, self.settings.min_score)?;
        results.retain(|r| r.passage.unit == unit);
        results.truncate(k);
        Ok(results)
    }

    /// Primary-source passages first, then secondary.
    ///
    /// Fetches `k * source_overfetch` candidates, then takes up to `floor(k/2)`
    /// primary results followed by up to `floor(k/2)` secondary results, each
    /// partition keeping its score order. An odd `k` leaves its spare slot
    /// empty, except that `k = 1` takes one primary result.
    pub fn search_with_source_priority(&self, query: &str, k: usize) -> Result<Vec<RetrievalResult>> {
        let candidates = k.saturating_mul(self.settings.source_overfetch);
        let results = self.search(query, candidates, self.settings.min_score)?;
        let (primary, secondary): (Vec<_>, Vec<_>) =
            results.into_iter().partition(|r| r.passage.source == Source::Primary);
        let secondary_quota = k / 2;
        let primary_quota = secondary_quota.max(usize::from(k > 0));
        Ok(primary
            .into_iter()
            .take(primary_quota)
            .chain(secondary.into_iter().take(secondary_quota))
            .collect())
    }
}
