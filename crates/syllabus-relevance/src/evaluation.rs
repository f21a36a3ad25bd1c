use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

use syllabus_core::error::{Error, Result};
use syllabus_core::Unit;

use crate::classifier::{ClassificationResult, ConfidenceLevel, RelevanceClassifier};
use crate::corrector::{Correction, UnitCorrector};

/// A question with its expected unit, as stored in an evaluation set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelledQuestion {
    pub id: String,
    pub question: String,
    pub unit: Unit,
}

pub fn load_dataset(path: &Path) -> Result<Vec<LabelledQuestion>> {
    let questions: Vec<LabelledQuestion> = serde_json::from_slice(&fs::read(path)?)?;
    if let Some(q) = questions.iter().find(|q| q.question.trim().is_empty()) {
        return Err(Error::InvalidInput(format!("question '{}' has no text", q.id)));
    }
    Ok(questions)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionReport {
    pub id: String,
    pub expected: Unit,
    pub classification: ClassificationResult,
    pub correction: Correction,
}

impl QuestionReport {
    pub fn predicted_correct(&self) -> bool {
        self.classification.best_unit == Some(self.expected)
    }

    pub fn final_correct(&self) -> bool {
        self.correction.final_unit == Some(self.expected)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationSummary {
    pub total: usize,
    pub high_confidence: usize,
    pub medium_confidence: usize,
    pub low_confidence: usize,
    pub ambiguous: usize,
    pub excluded: usize,
    pub predicted_correct: usize,
    pub final_correct: usize,
    pub corrections_applied: usize,
    pub dual_tagged: usize,
    /// Ids still wrong after correction.
    pub remaining_errors: Vec<String>,
}

impl EvaluationSummary {
    pub fn from_reports(reports: &[QuestionReport]) -> Self {
        let mut s = Self { total: reports.len(), ..Self::default() };
        for r in reports {
            match r.classification.confidence {
                ConfidenceLevel::High => s.high_confidence += 1,
                ConfidenceLevel::Medium => s.medium_confidence += 1,
                ConfidenceLevel::Low => s.low_confidence += 1,
            }
            s.ambiguous += usize::from(r.classification.ambiguous);
            s.excluded += usize::from(!r.classification.is_scored());
            s.predicted_correct += usize::from(r.predicted_correct());
            s.final_correct += usize::from(r.final_correct());
            s.corrections_applied += usize::from(r.correction.correction_applied);
            s.dual_tagged += usize::from(r.correction.is_dual_tagged());
            if !r.final_correct() {
                s.remaining_errors.push(r.id.clone());
            }
        }
        s
    }

    pub fn predicted_accuracy(&self) -> f64 {
        ratio(self.predicted_correct, self.total)
    }

    pub fn final_accuracy(&self) -> f64 {
        ratio(self.final_correct, self.total)
    }
}

fn ratio(n: usize, total: usize) -> f64 {
    if total == 0 { 0.0 } else { n as f64 / total as f64 }
}

/// Classify and correct every question, then summarize.
pub fn evaluate(
    classifier: &RelevanceClassifier,
    corrector: &UnitCorrector,
    dataset: &[LabelledQuestion],
) -> Result<(Vec<QuestionReport>, EvaluationSummary)> {
    let mut reports = Vec::with_capacity(dataset.len());
    for item in dataset {
        let classification = classifier.classify(&item.question)?;
        let correction = corrector.correct(&item.question, &classification);
        reports.push(QuestionReport { id: item.id.clone(), expected: item.unit, classification, correction });
    }
    let summary = EvaluationSummary::from_reports(&reports);
    info!(
        total = summary.total,
        predicted_accuracy = summary.predicted_accuracy(),
        final_accuracy = summary.final_accuracy(),
        corrections = summary.corrections_applied,
        "Evaluation finished"
    );
    Ok((reports, summary))
}
