use syllabus_core::traits::Embedder;
use syllabus_core::vector::{dot, is_normalized};
use syllabus_embed::{get_default_embedder, FakeEmbedder};

#[test]
fn fake_embedder_shapes_and_determinism() {
    // Force fake embedder to avoid loading the model
    std::env::set_var("APP_USE_FAKE_EMBEDDINGS", "1");

    let embedder = get_default_embedder().expect("embedder");
    let texts = vec!["hello world".to_string(), "hello world".to_string()];
    let embs = embedder.embed_batch(&texts).expect("embed_batch");
    let v1 = &embs[0];
    let v2 = &embs[1];

    assert_eq!(v1.len(), embedder.dim());
    assert!(is_normalized(v1), "vector is L2-normalized");
    assert_eq!(v1, v2, "deterministic for same input");
}

#[test]
fn shared_tokens_score_higher_than_disjoint_ones() {
    let e = FakeEmbedder::new(512);
    let q = e.embed_text("What is TCP?").unwrap();
    let near = e.embed_text("tcp transmission control protocol").unwrap();
    let far = e.embed_text("ethernet frames collide").unwrap();
    assert!(dot(&q, &near) > dot(&q, &far));
    assert!(dot(&q, &near) > 0.0);
}

#[test]
fn empty_text_still_yields_unit_vector() {
    let e = FakeEmbedder::new(64);
    assert!(is_normalized(&e.embed_text("   ").unwrap()));
    assert_eq!(e.embedder_id(), "fake:d64");
}
