//! Domain types shared by the retrieval and relevance engines.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// One of the five curriculum units partitioning the domain.
///
/// Variants are declared in label order, so the derived `Ord` is the
/// ascending-label order used for every tie-break.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Unit {
    #[serde(rename = "Unit 1")]
    Unit1,
    #[serde(rename = "Unit 2")]
    Unit2,
    #[serde(rename = "Unit 3")]
    Unit3,
    #[serde(rename = "Unit 4")]
    Unit4,
    #[serde(rename = "Unit 5")]
    Unit5,
}

impl Unit {
    pub const ALL: [Unit; 5] = [Unit::Unit1, Unit::Unit2, Unit::Unit3, Unit::Unit4, Unit::Unit5];

    pub fn label(self) -> &'static str {
        match self {
            Unit::Unit1 => "Unit 1",
            Unit::Unit2 => "Unit 2",
            Unit::Unit3 => "Unit 3",
            Unit::Unit4 => "Unit 4",
            Unit::Unit5 => "Unit 5",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Unit {
    type Err = Error;

    /// Accepts `"Unit 3"`, `"unit3"` or a bare `"3"`.
    fn from_str(s: &str) -> Result<Self> {
        let lower = s.trim().to_lowercase();
        let digits = lower.strip_prefix("unit").unwrap_or(&lower).trim();
        match digits {
            "1" => Ok(Unit::Unit1),
            "2" => Ok(Unit::Unit2),
            "3" => Ok(Unit::Unit3),
            "4" => Ok(Unit::Unit4),
            "5" => Ok(Unit::Unit5),
            _ => Err(Error::InvalidConfig(format!("unknown unit label '{s}'"))),
        }
    }
}

/// Corpus source. The primary source is preferred when merging results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    #[serde(alias = "stallings")]
    Primary,
    #[serde(alias = "kurose")]
    Secondary,
}

impl Source {
    /// Lower is preferred.
    pub fn priority(self) -> u8 {
        match self {
            Source::Primary => 0,
            Source::Secondary => 1,
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Primary => f.write_str("primary"),
            Source::Secondary => f.write_str("secondary"),
        }
    }
}

/// A chunk as produced by the ingestion pipeline, before an id is assigned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkRecord {
    pub unit: Unit,
    pub topic: String,
    pub source: Source,
    pub page: u32,
    pub text: String,
}

/// An indexed chunk of source text with its provenance.
///
/// `id` is dense (`0..N`) and shared with the vector row of the same passage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Passage {
    pub id: usize,
    pub unit: Unit,
    pub topic: String,
    pub source: Source,
    pub page: u32,
    pub text: String,
}

impl Passage {
    pub fn from_record(id: usize, record: ChunkRecord) -> Self {
        Self {
            id,
            unit: record.unit,
            topic: record.topic,
            source: record.source,
            page: record.page,
            text: record.text,
        }
    }
}

/// A passage returned for a query. `score` is the cosine similarity in
/// `[-1, 1]`; `source_priority` mirrors `Source::priority` of the passage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub passage: Passage,
    pub score: f32,
    pub source_priority: u8,
}

impl RetrievalResult {
    pub fn new(passage: Passage, score: f32) -> Self {
        let source_priority = passage.source.priority();
        Self { passage, score, source_priority }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_labels_parse_and_order() {
        assert_eq!("Unit 4".parse::<Unit>().unwrap(), Unit::Unit4);
        assert_eq!("unit2".parse::<Unit>().unwrap(), Unit::Unit2);
        assert_eq!("5".parse::<Unit>().unwrap(), Unit::Unit5);
        assert!("Unit 6".parse::<Unit>().is_err());
        let mut units = vec![Unit::Unit3, Unit::Unit1, Unit::Unit5];
        units.sort();
        assert_eq!(units, vec![Unit::Unit1, Unit::Unit3, Unit::Unit5]);
    }

    #[test]
    fn chunk_record_reads_ingestion_json() {
        let json = r#"{"unit":"Unit 3","topic":"routing","source":"stallings","page":12,"text":"Routers forward packets."}"#;
        let rec: ChunkRecord = serde_json::from_str(json).unwrap();
        assert_eq!(rec.unit, Unit::Unit3);
        assert_eq!(rec.source, Source::Primary);
        let p = Passage::from_record(7, rec);
        assert_eq!(p.id, 7);
        assert_eq!(serde_json::to_value(p.unit).unwrap(), "Unit 3");
    }
}
