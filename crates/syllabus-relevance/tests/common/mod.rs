#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use syllabus_core::traits::Embedder;

/// Six axes: one per unit plus a constant bias axis. Each axis counts the
/// distinct marker phrases present in the lower-cased text.
const MARKERS: [&[&str]; 5] = [
    &["osi", "architecture", "reference model", "hosts"],
    &["ethernet", "csma", "data link", "framing", "wireless"],
    &["routing", "ipv4", "subnet", "ospf", "addressing"],
    &["tcp", "udp", "transport", "http", "dns", "congestion"],
    &["snmp", "mib", "monitoring", "management", "sdn"],
];

#[derive(Default)]
pub struct ConceptEmbedder {
    pub calls: AtomicUsize,
}

impl ConceptEmbedder {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Embedder for ConceptEmbedder {
    fn embedder_id(&self) -> &str { "concept:d6" }
    fn dim(&self) -> usize { 6 }
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts
            .iter()
            .map(|t| {
                let lower = t.to_lowercase();
                let mut v: Vec<f32> = MARKERS
                    .iter()
                    .map(|markers| markers.iter().filter(|m| lower.contains(*m)).count() as f32)
                    .collect();
                v.push(0.1);
                v
            })
            .collect())
    }
}

/// Returns fixed vectors for known texts and fails on anything else.
pub struct TableEmbedder {
    pub dim: usize,
    pub table: HashMap<String, Vec<f32>>,
}

impl TableEmbedder {
    pub fn new(dim: usize, entries: &[(&str, Vec<f32>)]) -> Self {
        Self { dim, table: entries.iter().map(|(k, v)| (k.to_string(), v.clone())).collect() }
    }
}

impl Embedder for TableEmbedder {
    fn embedder_id(&self) -> &str { "table" }
    fn dim(&self) -> usize { self.dim }
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        texts
            .iter()
            .map(|t| self.table.get(t).cloned().ok_or_else(|| anyhow::anyhow!("no vector for '{t}'")))
            .collect()
    }
}

pub struct FailingEmbedder(pub usize);

impl Embedder for FailingEmbedder {
    fn embedder_id(&self) -> &str { "failing" }
    fn dim(&self) -> usize { self.0 }
    fn embed_batch(&self, _texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        Err(anyhow::anyhow!("provider unavailable"))
    }
}
