mod common;

use std::sync::Arc;

use syllabus_core::config::RetrievalSettings;
use syllabus_core::traits::Embedder;
use syllabus_core::vector::is_normalized;
use syllabus_core::{Error, Source, Unit};
use syllabus_embed::FakeEmbedder;
use syllabus_vector::{build_corpus_index, CorpusIndex, Retriever};

use common::networking_corpus;

struct FailingEmbedder;

impl Embedder for FailingEmbedder {
    fn embedder_id(&self) -> &str { "failing" }
    fn dim(&self) -> usize { 256 }
    fn embed_batch(&self, _texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        Err(anyhow::anyhow!("provider unavailable"))
    }
}

fn open_settings() -> RetrievalSettings {
    RetrievalSettings { min_score: -1.0, ..RetrievalSettings::default() }
}

fn retriever(settings: &RetrievalSettings) -> Retriever {
    let embedder: Arc<dyn Embedder> = Arc::new(FakeEmbedder::new(256));
    let index = build_corpus_index(embedder.as_ref(), networking_corpus(), 3).expect("build");
    Retriever::new(embedder, Arc::new(index), settings).expect("retriever")
}

#[test]
fn stored_vectors_are_normalized() {
    let r = retriever(&open_settings());
    let vectors = r.index().vectors();
    assert_eq!(vectors.len(), r.index().passages().len());
    for id in 0..vectors.len() {
        assert!(is_normalized(vectors.vector(id).unwrap()));
    }
}

#[test]
fn tcp_question_finds_transmission_control_protocol_passage() {
    let r = retriever(&RetrievalSettings::default());
    let results = r.search("What is TCP protocol?", 3, 0.3).expect("search");
    assert!(!results.is_empty());
    let top = &results[0];
    assert_eq!(top.passage.unit, Unit::Unit4);
    assert!(top.passage.text.contains("Transmission Control Protocol"));
    assert!(top.score >= 0.3 && top.score <= 1.0 + 1e-5);
}

#[test]
fn results_are_sorted_and_bounded_by_k() {
    let r = retriever(&open_settings());
    let results = r.search("routing protocol tables", 5, -1.0).unwrap();
    assert_eq!(results.len(), 5);
    assert!(results.windows(2).all(|w| w[0].score >= w[1].score));
}

#[test]
fn raising_min_score_never_adds_results() {
    let r = retriever(&open_settings());
    let thresholds = [-1.0, 0.0, 0.1, 0.2, 0.3, 0.5, 0.8, 1.0];
    let counts: Vec<usize> = thresholds
        .iter()
        .map(|&t| r.search("How does TCP congestion control work?", 8, t).unwrap().len())
        .collect();
    assert!(counts.windows(2).all(|w| w[0] >= w[1]), "{counts:?}");
    for t in thresholds {
        assert!(r.search("How does TCP congestion control work?", 8, t).unwrap().iter().all(|x| x.score >= t));
    }
}

#[test]
fn empty_index_returns_empty_without_calling_provider() {
    let embedder: Arc<dyn Embedder> = Arc::new(FailingEmbedder);
    let r = Retriever::new(embedder, Arc::new(CorpusIndex::empty(256, "failing")), &open_settings()).unwrap();
    assert!(r.search("What is TCP?", 5, 0.0).unwrap().is_empty());
    assert!(r.search_by_unit("What is TCP?", Unit::Unit4, 3).unwrap().is_empty());
    assert!(r.search_with_source_priority("What is TCP?", 4).unwrap().is_empty());
}

#[test]
fn provider_failure_is_reported_for_that_query() {
    let fake = FakeEmbedder::new(256);
    let index = build_corpus_index(&fake, networking_corpus(), 8).unwrap();
    let r = Retriever::new(Arc::new(FailingEmbedder), Arc::new(index), &open_settings()).unwrap();
    assert!(matches!(r.search("What is TCP?", 3, 0.0), Err(Error::EmbeddingProvider(_))));
}

#[test]
fn mismatched_embedder_dimension_is_rejected() {
    let fake = FakeEmbedder::new(256);
    let index = build_corpus_index(&fake, networking_corpus(), 8).unwrap();
    let err = Retriever::new(Arc::new(FakeEmbedder::new(128)), Arc::new(index), &open_settings()).err().unwrap();
    assert!(matches!(err, Error::DimensionMismatch { expected: 256, actual: 128 }));
}

#[test]
fn search_by_unit_keeps_only_that_unit() {
    let r = retriever(&open_settings());
    let results = r.search_by_unit("TCP handshake and routing tables", Unit::Unit3, 2).unwrap();
    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|x| x.passage.unit == Unit::Unit3));
    assert!(results.windows(2).all(|w| w[0].score >= w[1].score));
}

#[test]
fn source_priority_puts_primary_first() {
    let r = retriever(&open_settings());
    let query = "TCP congestion control and the handshake";
    for k in 1..=6 {
        let candidates = r.search(query, 2 * k, -1.0).unwrap();
        let results = r.search_with_source_priority(query, k).unwrap();
        assert!(results.len() <= k);
        if candidates.iter().any(|x| x.passage.source == Source::Primary) {
            assert_eq!(results[0].passage.source, Source::Primary, "k={k}");
        }
        if let Some(pos) = results.iter().position(|x| x.passage.source == Source::Secondary) {
            assert!(results[pos..].iter().all(|x| x.passage.source == Source::Secondary), "k={k}");
        }
        let primaries = results.iter().filter(|x| x.passage.source == Source::Primary).count();
        assert!(primaries <= (k / 2).max(1), "k={k}");
        assert!(results.len() - primaries <= k / 2);
        for part in [Source::Primary, Source::Secondary] {
            let scores: Vec<f32> = results.iter().filter(|x| x.passage.source == part).map(|x| x.score).collect();
            assert!(scores.windows(2).all(|w| w[0] >= w[1]));
        }
    }
}

#[test]
fn source_priority_odd_k_splits_floor_quotas() {
    let r = retriever(&open_settings());
    let query = "TCP congestion control and the handshake";
    let split = |k: usize| {
        let results = r.search_with_source_priority(query, k).unwrap();
        let primaries = results.iter().filter(|x| x.passage.source == Source::Primary).count();
        (primaries, results.len() - primaries)
    };

    // Ten candidates cover the whole corpus: four primary, four secondary.
    assert_eq!(split(5), (2, 2));
    // Any six of the eight hold at least two of each source.
    assert_eq!(split(3), (1, 1));
    let top_two = r.search(query, 2, -1.0).unwrap();
    let has_primary = top_two.iter().any(|x| x.passage.source == Source::Primary);
    assert_eq!(split(1), (usize::from(has_primary), 0));
    assert_eq!(split(0), (0, 0));
}

#[test]
fn source_priority_falls_back_to_secondary_only() {
    let embedder: Arc<dyn Embedder> = Arc::new(FakeEmbedder::new(256));
    let secondary_only: Vec<_> = networking_corpus().into_iter().filter(|c| c.source == Source::Secondary).collect();
    let index = build_corpus_index(embedder.as_ref(), secondary_only, 4).unwrap();
    let r = Retriever::new(embedder, Arc::new(index), &open_settings()).unwrap();
    let results = r.search_with_source_priority("TCP handshake", 4).unwrap();
    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|x| x.passage.source == Source::Secondary));
}

#[test]
fn concurrent_queries_share_one_retriever() {
    let r = Arc::new(retriever(&open_settings()));
    let expected = r.search("routing algorithm", 4, -1.0).unwrap();
    std::thread::scope(|s| {
        for _ in 0..4 {
            let r = Arc::clone(&r);
            let expected = expected.clone();
            s.spawn(move || assert_eq!(r.search("routing algorithm", 4, -1.0).unwrap(), expected));
        }
    });
}
