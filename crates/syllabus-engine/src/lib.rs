//! syllabus-engine
//!
//! `ScopeEngine` is the one object a caller holds: it owns the embedding
//! provider, the loaded corpus index (if one has been built), the topic
//! profiles and the correction rules, and answers retrieval and scope
//! questions against them.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

use syllabus_core::config::Settings;
use syllabus_core::corpus::load_corpus_dir;
use syllabus_core::error::{Error, Result};
use syllabus_core::traits::Embedder;
use syllabus_core::{RetrievalResult, Unit};
use syllabus_relevance::evaluation::{self, EvaluationSummary, LabelledQuestion, QuestionReport};
use syllabus_relevance::{ClassificationResult, Correction, RelevanceClassifier, Tier, TopicProfileStore, UnitCorrector};
use syllabus_vector::persist::{self, Manifest};
use syllabus_vector::{build_corpus_index, CorpusIndex, CoverageStats, Retriever};

/// Classification of a question plus the corrected unit assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScopeDecision {
    pub classification: ClassificationResult,
    pub correction: Correction,
}

impl ScopeDecision {
    pub fn tier(&self) -> Tier {
        self.classification.tier
    }

    pub fn in_scope(&self) -> bool {
        self.classification.tier != Tier::Irrelevant
    }

    /// The unit after correction; `None` for excluded questions.
    pub fn unit(&self) -> Option<Unit> {
        self.correction.final_unit
    }
}

/// Share of labelled questions whose top retrieved passage has the expected unit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RetrievalEvaluation {
    pub total: usize,
    pub hits: usize,
    pub misses: Vec<String>,
}

impl RetrievalEvaluation {
    pub fn hit_rate(&self) -> f64 {
        if self.total == 0 { 0.0 } else { self.hits as f64 / self.total as f64 }
    }
}

pub struct ScopeEngine {
    settings: Settings,
    retriever: Option<Retriever>,
    classifier: RelevanceClassifier,
    corrector: UnitCorrector,
}

impl ScopeEngine {
    /// Load the persisted index (if any) from `data.index_dir` and the topic
    /// profiles from `data.profiles_path`, building the profiles when the
    /// cache is missing or was made by another embedder.
    pub fn open(settings: Settings, base_dir: &Path, embedder: Arc<dyn Embedder>) -> Result<Self> {
        settings.validate()?;
        let index_dir = settings.data.index_dir(base_dir);
        let index = persist::try_load(&index_dir)?;
        match &index {
            Some(idx) if idx.embedder_id() != embedder.embedder_id() => warn!(
                index_embedder = idx.embedder_id(),
                embedder = embedder.embedder_id(),
                "Corpus index was built with a different embedder"
            ),
            Some(_) => {}
            None => info!(dir = %index_dir.display(), "No corpus index built; retrieval disabled"),
        }
        let profiles = TopicProfileStore::load_or_build(
            &settings.data.profiles_path(base_dir),
            embedder.as_ref(),
            &settings.classifier.topics,
        )?;
        Self::from_parts(settings, embedder, index.map(Arc::new), Arc::new(profiles))
    }

    /// Assemble an engine from already-loaded parts.
    pub fn from_parts(
        settings: Settings,
        embedder: Arc<dyn Embedder>,
        index: Option<Arc<CorpusIndex>>,
        profiles: Arc<TopicProfileStore>,
    ) -> Result<Self> {
        let retriever = index
            .map(|idx| Retriever::new(Arc::clone(&embedder), idx, &settings.retrieval))
            .transpose()?;
        let classifier = RelevanceClassifier::new(embedder, profiles, &settings.classifier)?;
        let corrector = UnitCorrector::new(&settings.corrector)?;
        Ok(Self { settings, retriever, classifier, corrector })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn has_index(&self) -> bool {
        self.retriever.is_some()
    }

    pub fn coverage(&self) -> Option<CoverageStats> {
        self.retriever.as_ref().map(|r| r.index().passages().coverage())
    }

    fn retriever(&self) -> Result<&Retriever> {
        self.retriever.as_ref().ok_or_else(|| Error::IndexNotBuilt(self.settings.data.index_dir.clone()))
    }

    /// Top-`k` passages scoring at least `retrieval.min_score`.
    pub fn retrieve(&self, query: &str, k: usize) -> Result<Vec<RetrievalResult>> {
        self.retriever()?.search(query, k, self.settings.retrieval.min_score)
    }

    pub fn retrieve_by_unit(&self, query: &str, unit: Unit, k: usize) -> Result<Vec<RetrievalResult>> {
        self.retriever()?.search_by_unit(query, unit, k)
    }

    pub fn retrieve_prioritized(&self, query: &str, k: usize) -> Result<Vec<RetrievalResult>> {
        self.retriever()?.search_with_source_priority(query, k)
    }

    pub fn check(&self, question: &str) -> Result<ScopeDecision> {
        let classification = self.classifier.classify(question)?;
        let correction = self.corrector.correct(question, &classification);
        Ok(ScopeDecision { classification, correction })
    }

    pub fn check_batch<S: AsRef<str>>(&self, questions: &[S]) -> Result<Vec<ScopeDecision>> {
        questions.iter().map(|q| self.check(q.as_ref())).collect()
    }

    pub fn evaluate(&self, dataset: &[LabelledQuestion]) -> Result<(Vec<QuestionReport>, EvaluationSummary)> {
        evaluation::evaluate(&self.classifier, &self.corrector, dataset)
    }

    pub fn retrieval_hit_rate(&self, dataset: &[LabelledQuestion]) -> Result<RetrievalEvaluation> {
        let retriever = self.retriever()?;
        let mut report = RetrievalEvaluation { total: dataset.len(), ..RetrievalEvaluation::default() };
        for item in dataset {
            let top = retriever.search(&item.question, 1, f32::NEG_INFINITY)?;
            if top.first().is_some_and(|r| r.passage.unit == item.unit) {
                report.hits += 1;
            } else {
                report.misses.push(item.id.clone());
            }
        }
        info!(total = report.total, hit_rate = report.hit_rate(), "Retrieval evaluation finished");
        Ok(report)
    }
}

/// Offline step: load every chunk file under `data.corpus_dir`, embed it and
/// write the index to `data.index_dir`.
pub fn build_index(settings: &Settings, base_dir: &Path, embedder: &dyn Embedder, batch_size: usize) -> Result<Manifest> {
    let records = load_corpus_dir(&settings.data.corpus_dir(base_dir))?;
    let index = build_corpus_index(embedder, records, batch_size)?;
    persist::save(&index, &settings.data.index_dir(base_dir))
}
