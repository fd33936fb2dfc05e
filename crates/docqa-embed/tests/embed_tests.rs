use docqa_core::config::OllamaSettings;
use docqa_core::traits::Embedder;
use docqa_embed::{get_default_embedder, FakeEmbedder, FAKE_EMBEDDING_DIM};

#[tokio::test]
async fn fake_embedder_shapes_and_determinism() {
    // Force fake embedder to avoid talking to a provider
    std::env::set_var("APP_USE_FAKE_EMBEDDINGS", "1");

    let embedder = get_default_embedder(&OllamaSettings::default()).expect("embedder");
    let texts = vec!["hello world".to_string(), "hello world".to_string()];
    let embs = embedder.embed_batch(&texts).await.expect("embed_batch");
    let v1 = &embs[0];
    let v2 = &embs[1];

    assert_eq!(v1.len(), FAKE_EMBEDDING_DIM);

    let norm: f32 = v1.iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() <= 1e-3, "vector is L2-normalized (norm={norm})");

    for (a, b) in v1.iter().zip(v2.iter()) { assert!((a - b).abs() <= 1e-6); }
    assert!(embedder.model_id().starts_with("fake:"));
}

#[tokio::test]
async fn fake_embedder_never_returns_zero_vector() {
    let embedder = FakeEmbedder::new(16);
    let v = embedder.embed("   ").await.expect("embed");
    assert_eq!(v.len(), 16);
    assert!(v.iter().any(|x| *x != 0.0));
}

#[tokio::test]
async fn fake_embedder_places_shared_tokens_closer() {
    let embedder = FakeEmbedder::new(256);
    let q = embedder.embed_sync("solar panel wiring");
    let near = embedder.embed_sync("wiring a solar panel");
    let far = embedder.embed_sync("sourdough bread starter");
    let l2 = |a: &[f32], b: &[f32]| a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum::<f32>();
    assert!(l2(&q, &near) < l2(&q, &far));
}
