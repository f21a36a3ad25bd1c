use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use syllabus_core::config::UnitKeywords;
use syllabus_core::error::{Error, Result};
use syllabus_core::traits::Embedder;
use syllabus_core::vector::{is_normalized, normalized};
use syllabus_core::Unit;

/// A unit's curated keywords and the embedding of their concatenation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicProfile {
    pub unit: Unit,
    pub keywords: Vec<String>,
    pub reference: Vec<f32>,
}

impl TopicProfile {
    /// The text that is embedded into `reference`.
    pub fn text(&self) -> String {
        self.keywords.join(" ")
    }
}

/// One reference vector per unit, ordered by unit. Built once, read-only after.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicProfileStore {
    embedder_id: String,
    dim: usize,
    profiles: Vec<TopicProfile>,
}

impl TopicProfileStore {
    pub fn build(embedder: &dyn Embedder, topics: &[UnitKeywords]) -> Result<Self> {
        let texts: Vec<String> = topics.iter().map(|t| t.keywords.join(" ")).collect();
        let vectors = embedder.embed_batch(&texts).map_err(Error::EmbeddingProvider)?;
        if vectors.len() != topics.len() {
            return Err(Error::EmbeddingProvider(anyhow::anyhow!(
                "embedder returned {} vectors for {} topic profiles",
                vectors.len(),
                topics.len()
            )));
        }
        let mut profiles = Vec::with_capacity(topics.len());
        for (topic, vector) in topics.iter().zip(vectors) {
            if vector.len() != embedder.dim() {
                return Err(Error::DimensionMismatch { expected: embedder.dim(), actual: vector.len() });
            }
            profiles.push(TopicProfile {
                unit: topic.unit,
                keywords: topic.keywords.clone(),
                reference: normalized(vector)?,
            });
        }
        let store = Self::from_profiles(embedder.embedder_id(), profiles)?;
        info!(units = store.len(), embedder_id = %store.embedder_id, "Built topic profiles");
        Ok(store)
    }

    /// Adopt precomputed profiles. Units must be distinct, keyword lists
    /// non-empty, and references normalized and of one dimension.
    pub fn from_profiles(embedder_id: impl Into<String>, mut profiles: Vec<TopicProfile>) -> Result<Self> {
        if profiles.is_empty() {
            return Err(Error::InvalidConfig("at least one topic profile is required".to_string()));
        }
        profiles.sort_by_key(|p| p.unit);
        let dim = profiles[0].reference.len();
        let mut seen = BTreeSet::new();
        for p in &profiles {
            if !seen.insert(p.unit) {
                return Err(Error::InvalidConfig(format!("duplicate topic profile for {}", p.unit)));
            }
            if p.keywords.is_empty() {
                return Err(Error::InvalidConfig(format!("topic profile for {} has no keywords", p.unit)));
            }
            if p.reference.len() != dim {
                return Err(Error::DimensionMismatch { expected: dim, actual: p.reference.len() });
            }
            if !is_normalized(&p.reference) {
                return Err(Error::InvalidVector(format!("reference vector for {} is not normalized", p.unit)));
            }
        }
        Ok(Self { embedder_id: embedder_id.into(), dim, profiles })
    }

    pub fn embedder_id(&self) -> &str {
        &self.embedder_id
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    pub fn get(&self, unit: Unit) -> Option<&TopicProfile> {
        self.profiles.iter().find(|p| p.unit == unit)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TopicProfile> {
        self.profiles.iter()
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_vec_pretty(self)?)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw: Self = serde_json::from_slice(&fs::read(path)?)?;
        Self::from_profiles(raw.embedder_id, raw.profiles)
    }

    /// Reuse the cached profiles at `path` when they were built by the same
    /// embedder from the same keyword lists; otherwise rebuild and rewrite.
    pub fn load_or_build(path: &Path, embedder: &dyn Embedder, topics: &[UnitKeywords]) -> Result<Self> {
        if path.is_file() {
            match Self::load(path) {
                Ok(cached) if cached.matches(embedder, topics) => {
                    info!(path = %path.display(), "Loaded cached topic profiles");
                    return Ok(cached);
                }
                Ok(_) => info!(path = %path.display(), "Cached topic profiles are stale; rebuilding"),
                Err(e) => warn!(path = %path.display(), error = %e, "Unreadable topic profile cache; rebuilding"),
            }
        }
        let store = Self::build(embedder, topics)?;
        store.save(path)?;
        Ok(store)
    }

    fn matches(&self, embedder: &dyn Embedder, topics: &[UnitKeywords]) -> bool {
        self.embedder_id == embedder.embedder_id()
            && self.dim == embedder.dim()
            && self.profiles.len() == topics.len()
            && topics.iter().all(|t| self.get(t.unit).is_some_and(|p| p.keywords == t.keywords))
    }
}
