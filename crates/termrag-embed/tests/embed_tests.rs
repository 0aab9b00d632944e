use termrag_core::config::{EmbeddingProvider, Settings};
use termrag_core::traits::Embedder;
use termrag_embed::{get_default_embedder, HashEmbedder, OpenAiEmbedder};

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[test]
fn hash_embedder_shapes_and_determinism() {
    let embedder = HashEmbedder::new(256);
    let texts = vec!["hello world".to_string(), "hello world".to_string()];
    let embs = embedder.embed_batch(&texts).expect("embed_batch");
    let v1 = &embs[0];
    let v2 = &embs[1];

    assert_eq!(v1.len(), 256);
    let norm: f32 = v1.iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() <= 1e-3, "vector is L2-normalized (norm={norm})");
    for (a, b) in v1.iter().zip(v2.iter()) {
        assert!((a - b).abs() <= 1e-6);
    }
}

#[test]
fn hash_embedder_ranks_shared_vocabulary_higher() {
    let embedder = HashEmbedder::new(512);
    let q = embedder.embed("What is REST API?").unwrap();
    let rest = embedder.embed("Term: REST API\nDefinition: HTTP based API design").unwrap();
    let css = embedder.embed("Term: CSS\nDefinition: Cascading Style Sheets").unwrap();
    assert!(cosine(&q, &rest) > cosine(&q, &css));
}

#[test]
fn hash_embedder_handles_empty_text() {
    let v = HashEmbedder::new(8).embed("").unwrap();
    assert_eq!(v, vec![0.0; 8]);
}

#[test]
fn default_embedder_follows_provider_setting() {
    let mut settings = Settings::default().embedding;
    settings.provider = EmbeddingProvider::Hash;
    settings.dimension = 64;
    let embedder = get_default_embedder(&settings).expect("embedder");
    assert_eq!(embedder.dim(), 64);
    assert_eq!(embedder.embed("anything").unwrap().len(), 64);
}

#[test]
fn openai_embedder_rejects_non_http_endpoint() {
    let err = OpenAiEmbedder::new("ftp://example.com", "key", "text-embedding-3-small", 1536, 5).unwrap_err();
    assert!(err.to_string().contains("invalid embedding endpoint"));
}
