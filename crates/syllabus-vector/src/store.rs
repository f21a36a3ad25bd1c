use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use syllabus_core::error::{Error, Result};
use syllabus_core::{ChunkRecord, Passage, Source, Unit};

/// Passage metadata addressed by the same dense ids as the vector rows.
#[derive(Debug, Clone, Default)]
pub struct PassageStore {
    passages: Vec<Passage>,
}

impl PassageStore {
    /// Assign ids `0..N` in record order.
    pub fn from_records(records: Vec<ChunkRecord>) -> Self {
        let passages = records.into_iter().enumerate().map(|(id, r)| Passage::from_record(id, r)).collect();
        Self { passages }
    }

    /// Adopt already-numbered passages; ids must be exactly `0..N` in order.
    pub fn from_passages(passages: Vec<Passage>) -> Result<Self> {
        if let Some((pos, p)) = passages.iter().enumerate().find(|(pos, p)| p.id != *pos) {
            return Err(Error::Corrupt(format!("passage at position {pos} has id {}", p.id)));
        }
        Ok(Self { passages })
    }

    pub fn get(&self, id: usize) -> Option<&Passage> {
        self.passages.get(id)
    }

    pub fn len(&self) -> usize {
        self.passages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passages.is_empty()
    }

    pub fn passages(&self) -> &[Passage] {
        &self.passages
    }

    pub fn coverage(&self) -> CoverageStats {
        let mut stats = CoverageStats { total: self.passages.len(), ..CoverageStats::default() };
        for p in &self.passages {
            *stats.by_unit.entry(p.unit).or_insert(0) += 1;
            *stats.by_source.entry(p.source).or_insert(0) += 1;
        }
        stats
    }
}

/// Passage counts per unit and per source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageStats {
    pub total: usize,
    pub by_unit: BTreeMap<Unit, usize>,
    pub by_source: BTreeMap<Source, usize>,
}
