use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use syllabus_core::config::ClassifierSettings;
use syllabus_core::error::{Error, Result};
use syllabus_core::keywords::KeywordMatcher;
use syllabus_core::traits::Embedder;
use syllabus_core::vector::{dot, embed_query};
use syllabus_core::Unit;

use crate::profiles::TopicProfileStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Tier {
    Relevant,
    Partial,
    Irrelevant,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Tier::Relevant => "RELEVANT",
            Tier::Partial => "PARTIAL",
            Tier::Irrelevant => "IRRELEVANT",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
}

impl fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConfidenceLevel::High => "high",
            ConfidenceLevel::Medium => "medium",
            ConfidenceLevel::Low => "low",
        })
    }
}

/// Why a classification was flagged as ambiguous.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Ambiguity {
    /// Best score below the partial threshold.
    LowConfidence,
    /// Best and runner-up closer than the configured gap.
    CloseScores { gap: f32 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub question: String,
    /// Every unit's final score; all zero when the question was excluded.
    pub unit_scores: BTreeMap<Unit, f32>,
    /// `None` only when the exclusion gate fired.
    pub best_unit: Option<Unit>,
    pub best_score: f32,
    pub second_best_score: f32,
    pub tier: Tier,
    pub confidence: ConfidenceLevel,
    pub ambiguous: bool,
    pub ambiguity: Option<Ambiguity>,
    /// Additive lexical boost applied to every unit.
    pub keyword_boost: f32,
    /// Denylist keyword that short-circuited scoring.
    pub excluded_by: Option<String>,
}

impl ClassificationResult {
    /// False when the exclusion gate fired and no similarity was computed.
    pub fn is_scored(&self) -> bool {
        self.excluded_by.is_none()
    }

    pub fn score_gap(&self) -> f32 {
        self.best_score - self.second_best_score
    }

    pub fn score(&self, unit: Unit) -> f32 {
        self.unit_scores.get(&unit).copied().unwrap_or(0.0)
    }
}

/// Scores questions against per-unit topic profiles.
///
/// Holds only read-only state after construction; `classify` takes `&self`
/// and is safe to call from many threads.
pub struct RelevanceClassifier {
    embedder: Arc<dyn Embedder>,
    profiles: Arc<TopicProfileStore>,
    exclusions: KeywordMatcher,
    boost_keywords: KeywordMatcher,
    boosts: Vec<f32>,
    settings: ClassifierSettings,
}

impl RelevanceClassifier {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        profiles: Arc<TopicProfileStore>,
        settings: &ClassifierSettings,
    ) -> Result<Self> {
        if profiles.dim() != embedder.dim() {
            return Err(Error::DimensionMismatch { expected: profiles.dim(), actual: embedder.dim() });
        }
        let exclusions = KeywordMatcher::new(&settings.exclusions)?;
        let boost_keywords = KeywordMatcher::new(settings.boosts.iter().map(|b| b.keyword.as_str()))?;
        let boosts = settings.boosts.iter().map(|b| b.boost).collect();
        Ok(Self { embedder, profiles, exclusions, boost_keywords, boosts, settings: settings.clone() })
    }

    pub fn settings(&self) -> &ClassifierSettings {
        &self.settings
    }

    pub fn profiles(&self) -> &TopicProfileStore {
        &self.profiles
    }

    pub fn classify(&self, question: &str) -> Result<ClassificationResult> {
        if let Some(keyword) = self.exclusions.first_match(question) {
            debug!(question, keyword, "Excluded by denylist");
            return Ok(self.excluded(question, keyword));
        }

        let boost = self.keyword_boost(question);
        let query = embed_query(self.embedder.as_ref(), question)?;
        let unit_scores: BTreeMap<Unit, f32> = self
            .profiles
            .iter()
            .map(|p| (p.unit, (dot(&query, &p.reference) + boost).min(1.0)))
            .collect();

        // Ascending unit order with a strict comparison: ties keep the lower label.
        let mut best: Option<(Unit, f32)> = None;
        for (&unit, &score) in &unit_scores {
            if best.map_or(true, |(_, b)| score > b) {
                best = Some((unit, score));
            }
        }
        let (best_unit, best_score) = best.ok_or_else(|| Error::InvalidConfig("no topic profiles".to_string()))?;
        let second_best_score = unit_scores
            .iter()
            .filter(|(u, _)| **u != best_unit)
            .map(|(_, s)| *s)
            .fold(f32::NEG_INFINITY, f32::max);
        let second_best_score = if second_best_score.is_finite() { second_best_score } else { 0.0 };

        let ambiguity = self.ambiguity(best_score, best_score - second_best_score);
        let result = ClassificationResult {
            question: question.to_string(),
            unit_scores,
            best_unit: Some(best_unit),
            best_score,
            second_best_score,
            tier: self.tier(best_score),
            confidence: self.confidence(best_score),
            ambiguous: ambiguity.is_some(),
            ambiguity,
            keyword_boost: boost,
            excluded_by: None,
        };
        debug!(question, unit = %best_unit, score = best_score, tier = %result.tier, "Classified");
        Ok(result)
    }

    /// Classify each question in order. Stops at the first provider failure.
    pub fn classify_batch<S: AsRef<str>>(&self, questions: &[S]) -> Result<Vec<ClassificationResult>> {
        questions.iter().map(|q| self.classify(q.as_ref())).collect()
    }

    pub fn tier(&self, score: f32) -> Tier {
        if score >= self.settings.relevant_threshold {
            Tier::Relevant
        } else if score >= self.settings.partial_threshold {
            Tier::Partial
        } else {
            Tier::Irrelevant
        }
    }

    pub fn confidence(&self, score: f32) -> ConfidenceLevel {
        if score >= self.settings.high_confidence {
            ConfidenceLevel::High
        } else if score >= self.settings.medium_confidence {
            ConfidenceLevel::Medium
        } else {
            ConfidenceLevel::Low
        }
    }

    /// Largest boost among the boost keywords found in `question`, or 0.
    pub fn keyword_boost(&self, question: &str) -> f32 {
        self.boost_keywords.matches(question).into_iter().map(|i| self.boosts[i]).fold(0.0, f32::max)
    }

    fn ambiguity(&self, best: f32, gap: f32) -> Option<Ambiguity> {
        if best < self.settings.partial_threshold {
            Some(Ambiguity::LowConfidence)
        } else if gap < self.settings.ambiguity_gap {
            Some(Ambiguity::CloseScores { gap })
        } else {
            None
        }
    }

    fn excluded(&self, question: &str, keyword: &str) -> ClassificationResult {
        ClassificationResult {
            question: question.to_string(),
            unit_scores: Unit::ALL.iter().map(|&u| (u, 0.0)).collect(),
            best_unit: None,
            best_score: 0.0,
            second_best_score: 0.0,
            tier: Tier::Irrelevant,
            confidence: ConfidenceLevel::Low,
            ambiguous: true,
            ambiguity: Some(Ambiguity::LowConfidence),
            keyword_boost: 0.0,
            excluded_by: Some(keyword.to_string()),
        }
    }
}
