//! Rule-based post-correction of the classifier's unit.
//!
//! Two passes run in order. A keyword override replaces the predicted unit
//! with the unit whose override keywords match most often, when the classifier
//! was unsure or the keyword evidence is strong. Dual-unit rules then tag
//! cross-cutting questions with both units of a pair and, when the chosen unit
//! is not among them and confidence is low, re-resolve to the tagged unit the
//! classifier scored highest.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use syllabus_core::config::CorrectorSettings;
use syllabus_core::error::Result;
use syllabus_core::keywords::KeywordMatcher;
use syllabus_core::Unit;

use crate::classifier::ClassificationResult;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DualMatch {
    pub units: [Unit; 2],
    pub keyword: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Correction {
    pub predicted_unit: Option<Unit>,
    pub final_unit: Option<Unit>,
    /// Predicted, final, and every dual-tagged unit.
    pub related_units: BTreeSet<Unit>,
    pub confidence: f32,
    pub correction_applied: bool,
    pub reason: Option<String>,
    pub keyword_matches: BTreeMap<Unit, Vec<String>>,
    pub dual_matches: Vec<DualMatch>,
}

impl Correction {
    pub fn is_dual_tagged(&self) -> bool {
        self.related_units.len() > 1
    }
}

pub struct UnitCorrector {
    overrides: Vec<(Unit, KeywordMatcher)>,
    dual_rules: Vec<([Unit; 2], KeywordMatcher)>,
    settings: CorrectorSettings,
}

impl UnitCorrector {
    pub fn new(settings: &CorrectorSettings) -> Result<Self> {
        let mut overrides = settings
            .overrides
            .iter()
            .map(|e| Ok((e.unit, KeywordMatcher::new(&e.keywords)?)))
            .collect::<Result<Vec<_>>>()?;
        overrides.sort_by_key(|(unit, _)| *unit);
        let dual_rules = settings
            .dual_units
            .iter()
            .map(|r| Ok((r.units, KeywordMatcher::new(&r.keywords)?)))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { overrides, dual_rules, settings: settings.clone() })
    }

    pub fn settings(&self) -> &CorrectorSettings {
        &self.settings
    }

    /// Override keywords found in `question`, per unit. Units without a hit
    /// are absent.
    pub fn keyword_matches(&self, question: &str) -> BTreeMap<Unit, Vec<String>> {
        self.overrides
            .iter()
            .filter_map(|(unit, matcher)| {
                let hits = matcher.matched_keywords(question);
                (!hits.is_empty()).then(|| (*unit, hits.into_iter().map(str::to_string).collect::<Vec<_>>()))
            })
            .collect()
    }

    /// Dual-unit keywords found in `question`, in rule order.
    pub fn dual_matches(&self, question: &str) -> Vec<DualMatch> {
        self.dual_rules
            .iter()
            .flat_map(|(units, matcher)| {
                matcher
                    .matched_keywords(question)
                    .into_iter()
                    .map(|keyword| DualMatch { units: *units, keyword: keyword.to_string() })
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    pub fn correct(&self, question: &str, classification: &ClassificationResult) -> Correction {
        let confidence = classification.best_score;
        let Some(predicted) = classification.best_unit else {
            return Correction {
                predicted_unit: None,
                final_unit: None,
                related_units: BTreeSet::new(),
                confidence,
                correction_applied: false,
                reason: classification.excluded_by.as_ref().map(|k| format!("excluded by '{k}'")),
                keyword_matches: BTreeMap::new(),
                dual_matches: Vec::new(),
            };
        };

        let keyword_matches = self.keyword_matches(question);
        let mut final_unit = predicted;
        let mut reasons = Vec::new();

        // Most matches wins; map order makes ties go to the lower unit.
        let mut candidate: Option<(Unit, usize)> = None;
        for (&unit, hits) in &keyword_matches {
            if candidate.map_or(true, |(_, n)| hits.len() > n) {
                candidate = Some((unit, hits.len()));
            }
        }
        if let Some((unit, count)) = candidate {
            if confidence < self.settings.override_confidence || count >= self.settings.override_min_matches {
                final_unit = unit;
                if unit != predicted {
                    reasons.push(format!("keyword override to {unit} ({count} matches)"));
                }
            }
        }

        let dual_matches = self.dual_matches(question);
        let dual_units: BTreeSet<Unit> = dual_matches.iter().flat_map(|m| m.units).collect();
        if !dual_units.contains(&final_unit) && confidence < self.settings.dual_confidence {
            let mut best: Option<(Unit, f32)> = None;
            for &unit in &dual_units {
                let score = classification.score(unit);
                if best.map_or(true, |(_, s)| score > s) {
                    best = Some((unit, score));
                }
            }
            if let Some((unit, _)) = best {
                reasons.push(format!("dual-unit resolution to {unit}"));
                final_unit = unit;
            }
        }

        let mut related_units = dual_units;
        related_units.insert(predicted);
        related_units.insert(final_unit);

        let correction_applied = final_unit != predicted;
        debug!(question, %predicted, final_unit = %final_unit, correction_applied, "Corrected unit");
        Correction {
            predicted_unit: Some(predicted),
            final_unit: Some(final_unit),
            related_units,
            confidence,
            correction_applied,
            reason: (!reasons.is_empty()).then(|| reasons.join("; ")),
            keyword_matches,
            dual_matches,
        }
    }
}
