use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::thread;

use syllabus_core::config::Settings;
use syllabus_core::traits::Embedder;
use syllabus_core::{ChunkRecord, Error, Source, Unit};
use syllabus_embed::FakeEmbedder;
use syllabus_engine::{build_index, ScopeEngine};
use syllabus_relevance::{LabelledQuestion, Tier};

fn record(unit: Unit, source: Source, page: u32, text: &str) -> ChunkRecord {
    ChunkRecord { unit, topic: format!("{unit} topic"), source, page, text: text.to_string() }
}

fn write_corpus(base: &Path) {
    let dir = base.join("data").join("chunks");
    fs::create_dir_all(&dir).unwrap();
    let primary = vec![
        record(Unit::Unit4, Source::Primary, 210, "TCP is the Transmission Control Protocol, a reliable transport protocol."),
        record(Unit::Unit2, Source::Primary, 88, "Ethernet uses CSMA/CD to share a broadcast medium between stations."),
        record(Unit::Unit3, Source::Primary, 140, "Routers forward datagrams using routing tables built by routing protocols."),
        record(Unit::Unit5, Source::Primary, 301, "SNMP agents expose a MIB that managers poll for network monitoring."),
    ];
    let secondary = vec![
        record(Unit::Unit4, Source::Secondary, 233, "The TCP three way handshake performs connection establishment before data transfer."),
        record(Unit::Unit4, Source::Secondary, 240, "TCP congestion control adjusts the transmission window of the protocol."),
        record(Unit::Unit1, Source::Secondary, 12, "The OSI reference model splits network protocol architecture into seven layers."),
        record(Unit::Unit3, Source::Secondary, 150, "Distance vector routing algorithm path selection exchanges tables with neighbours."),
    ];
    fs::write(dir.join("primary.json"), serde_json::to_vec(&primary).unwrap()).unwrap();
    fs::write(dir.join("secondary.json"), serde_json::to_vec(&secondary).unwrap()).unwrap();
}

fn settings() -> Settings {
    let mut s = Settings::default();
    s.retrieval.min_score = -1.0;
    s
}

fn embedder() -> Arc<dyn Embedder> {
    Arc::new(FakeEmbedder::new(256))
}

fn built_engine(base: &Path) -> ScopeEngine {
    write_corpus(base);
    let manifest = build_index(&settings(), base, embedder().as_ref(), 3).expect("build");
    assert_eq!(manifest.count, 8);
    ScopeEngine::open(settings(), base, embedder()).expect("open")
}

#[test]
fn engine_is_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ScopeEngine>();
}

#[test]
fn retrieval_without_index_is_index_not_built() {
    let dir = tempfile::tempdir().unwrap();
    let engine = ScopeEngine::open(settings(), dir.path(), embedder()).unwrap();
    assert!(!engine.has_index());
    assert!(engine.coverage().is_none());
    assert!(matches!(engine.retrieve("What is TCP?", 3), Err(Error::IndexNotBuilt(_))));
    assert!(matches!(engine.retrieve_by_unit("What is TCP?", Unit::Unit4, 3), Err(Error::IndexNotBuilt(_))));
    assert!(matches!(engine.retrieve_prioritized("What is TCP?", 3), Err(Error::IndexNotBuilt(_))));

    // Scope checks do not need the corpus index.
    let decision = engine.check("How to cook pasta?").unwrap();
    assert_eq!(decision.tier(), Tier::Irrelevant);
    assert!(!decision.in_scope());
    assert_eq!(decision.unit(), None);
    assert!(dir.path().join("data").join("topic_profiles.json").is_file());
}

#[test]
fn built_index_serves_all_retrieval_modes() {
    let dir = tempfile::tempdir().unwrap();
    let engine = built_engine(dir.path());
    assert!(engine.has_index());

    let coverage = engine.coverage().unwrap();
    assert_eq!(coverage.total, 8);
    assert_eq!(coverage.by_unit[&Unit::Unit4], 3);
    assert_eq!(coverage.by_source[&Source::Primary], 4);

    let top = engine.retrieve("What is TCP protocol?", 3).unwrap();
    assert_eq!(top.len(), 3);
    assert_eq!(top[0].passage.unit, Unit::Unit4);
    assert!(top[0].passage.text.contains("Transmission Control Protocol"));

    let by_unit = engine.retrieve_by_unit("routing tables", Unit::Unit3, 5).unwrap();
    assert_eq!(by_unit.len(), 2);
    assert!(by_unit.iter().all(|r| r.passage.unit == Unit::Unit3));

    let prioritized = engine.retrieve_prioritized("TCP protocol", 4).unwrap();
    assert_eq!(prioritized.len(), 4);
    assert_eq!(prioritized[0].passage.source, Source::Primary);
    assert!(prioritized.iter().filter(|r| r.passage.source == Source::Primary).count() <= 2);
}

#[test]
fn check_batch_matches_single_checks_across_threads() {
    let dir = tempfile::tempdir().unwrap();
    let engine = built_engine(dir.path());
    let questions = ["What is TCP protocol?", "How to cook pasta?", "Explain the transport layer"];
    let expected = engine.check_batch(&questions).unwrap();
    assert_eq!(expected.len(), 3);
    assert!(expected[0].classification.is_scored());
    assert!(!expected[1].classification.is_scored());

    thread::scope(|s| {
        let handles: Vec<_> = (0..4).map(|_| s.spawn(|| engine.check_batch(&questions).unwrap())).collect();
        for h in handles {
            assert_eq!(h.join().unwrap(), expected);
        }
    });
}

#[test]
fn evaluation_reports_accuracy_and_hit_rate() {
    let dir = tempfile::tempdir().unwrap();
    let engine = built_engine(dir.path());
    let dataset = vec![
        LabelledQuestion { id: "tcp".into(), question: "What is TCP protocol?".into(), unit: Unit::Unit4 },
        LabelledQuestion { id: "pasta".into(), question: "How to cook pasta?".into(), unit: Unit::Unit1 },
    ];

    let (reports, summary) = engine.evaluate(&dataset).unwrap();
    assert_eq!(reports.len(), 2);
    assert_eq!(summary.total, 2);
    assert_eq!(summary.excluded, 1);
    assert!(summary.remaining_errors.contains(&"pasta".to_string()));

    let retrieval = engine.retrieval_hit_rate(&dataset[..1]).unwrap();
    assert_eq!(retrieval.total, 1);
    assert_eq!(retrieval.hits, 1);
    assert!((retrieval.hit_rate() - 1.0).abs() < 1e-9);
}

#[test]
fn invalid_settings_are_rejected_on_open() {
    let dir = tempfile::tempdir().unwrap();
    let mut s = settings();
    s.classifier.partial_threshold = 0.5;
    s.classifier.relevant_threshold = 0.4;
    assert!(matches!(ScopeEngine::open(s, dir.path(), embedder()), Err(Error::InvalidConfig(_))));
}
