//! syllabus-relevance
//!
//! Decides whether a question is in curriculum scope and which unit it
//! belongs to: per-unit similarity against keyword-derived topic profiles,
//! lexical boosting, threshold tiers, ambiguity detection, and a rule layer
//! that corrects or dual-tags the predicted unit.

pub mod classifier;
pub mod corrector;
pub mod evaluation;
pub mod profiles;

pub use classifier::{Ambiguity, ClassificationResult, ConfidenceLevel, RelevanceClassifier, Tier};
pub use corrector::{Correction, DualMatch, UnitCorrector};
pub use evaluation::{EvaluationSummary, LabelledQuestion, QuestionReport};
pub use profiles::{TopicProfile, TopicProfileStore};
