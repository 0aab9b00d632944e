use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

use termrag_core::chunker::{Chunker, ChunkerConfig};
use termrag_core::corpus::parse_terms;
use termrag_core::traits::Embedder;
use termrag_core::types::Chunk;
use termrag_core::Error;
use termrag_embed::HashEmbedder;
use termrag_vector::{VectorIndex, DOCSTORE_FILE, VECTORS_FILE};

const TERMS: &str = r#"[
    {"term": "REST API", "definition": "An API design style built on HTTP methods and resources.", "example": "GET /users/1", "category": "backend"},
    {"term": "Closure", "definition": "A function that captures variables from its enclosing scope.", "example": "const add = x => y => x + y;", "category": "frontend"},
    {"term": "Docker", "definition": "A platform for packaging applications into containers.", "example": "docker run -p 80:80 nginx", "category": "devops"},
    {"term": "Machine Learning", "definition": "Algorithms that learn patterns from data.", "example": "Spam filtering", "category": "ai"}
]"#;

fn corpus_chunks() -> (Vec<Arc<termrag_core::types::Document>>, Vec<Chunk>) {
    let docs: Vec<_> = parse_terms(TERMS).unwrap().into_iter().map(Arc::new).collect();
    let chunker = Chunker::new(ChunkerConfig::default()).unwrap();
    let chunks = chunker.split_all(&docs);
    (docs, chunks)
}

#[test]
fn build_search_persist_restore() {
    let embedder = HashEmbedder::new(256);
    let (_docs, chunks) = corpus_chunks();
    let index = VectorIndex::build(&chunks, &embedder).expect("build");
    assert_eq!(index.len(), 4);
    assert_eq!(index.dim(), 256);

    let hits = index.search("What is Docker?", 2, &embedder).expect("search");
    assert_eq!(hits.len(), 2);
    assert!(hits[0].text.contains("Docker"));
    assert!(hits[0].score >= hits[1].score);

    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("index");
    index.persist(&dir).expect("persist");
    assert!(dir.join(VECTORS_FILE).is_file());
    assert!(dir.join(DOCSTORE_FILE).is_file());

    let restored = VectorIndex::restore(&dir).expect("restore");
    assert_eq!(restored, index);
    for q in ["What is Docker?", "closure scope", "HTTP resources", "unrelated words"] {
        assert_eq!(
            restored.search(q, 3, &embedder).unwrap(),
            index.search(q, 3, &embedder).unwrap(),
            "query {q:?}"
        );
    }
}

#[test]
fn metadata_survives_persistence() {
    let embedder = HashEmbedder::new(64);
    let (_docs, chunks) = corpus_chunks();
    let index = VectorIndex::build(&chunks, &embedder).unwrap();
    let tmp = TempDir::new().unwrap();
    index.persist(tmp.path()).unwrap();
    let restored = VectorIndex::restore(tmp.path()).unwrap();
    assert_eq!(restored.entries()[0].metadata.get("term").map(String::as_str), Some("REST API"));
    assert_eq!(restored.entries()[2].metadata.get("category").map(String::as_str), Some("devops"));
}

#[test]
fn empty_index_returns_no_hits() {
    let embedder = HashEmbedder::new(32);
    let index = VectorIndex::build(&[], &embedder).unwrap();
    assert!(index.is_empty());
    assert!(index.search("anything", 4, &embedder).unwrap().is_empty());

    let tmp = TempDir::new().unwrap();
    index.persist(tmp.path()).unwrap();
    let restored = VectorIndex::restore(tmp.path()).unwrap();
    assert!(restored.is_empty());
    assert_eq!(restored.dim(), 32);
}

#[test]
fn k_larger_than_index_returns_everything() {
    let embedder = HashEmbedder::new(128);
    let (_docs, chunks) = corpus_chunks();
    let index = VectorIndex::build(&chunks, &embedder).unwrap();
    let hits = index.search("API", 50, &embedder).unwrap();
    assert_eq!(hits.len(), 4);
    for pair in hits.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }
    assert!(matches!(index.search("API", 0, &embedder), Err(Error::InvalidArgument(_))));
}

#[test]
fn search_is_deterministic() {
    let embedder = HashEmbedder::new(128);
    let (_docs, chunks) = corpus_chunks();
    let index = VectorIndex::build(&chunks, &embedder).unwrap();
    let a = index.search("containers and HTTP", 4, &embedder).unwrap();
    let b = index.search("containers and HTTP", 4, &embedder).unwrap();
    assert_eq!(a, b);
}

#[test]
fn blank_chunks_are_not_indexed() {
    let embedder = HashEmbedder::new(16);
    let doc = Arc::new(termrag_core::types::Document::new("   \n  "));
    let chunks = Chunker::new(ChunkerConfig::default()).unwrap().split(&doc);
    let index = VectorIndex::build(&chunks, &embedder).unwrap();
    assert!(index.is_empty());
}

#[test]
fn restore_missing_directory_is_not_found() {
    let tmp = TempDir::new().unwrap();
    let err = VectorIndex::restore(&tmp.path().join("nope")).unwrap_err();
    assert!(matches!(err, Error::IndexNotFound(_)));
}

#[test]
fn restore_detects_corruption() {
    let embedder = HashEmbedder::new(64);
    let (_docs, chunks) = corpus_chunks();
    let index = VectorIndex::build(&chunks, &embedder).unwrap();

    // Garbage vectors file: checksum no longer matches.
    let tmp = TempDir::new().unwrap();
    index.persist(tmp.path()).unwrap();
    fs::write(tmp.path().join(VECTORS_FILE), b"not bincode").unwrap();
    assert!(matches!(VectorIndex::restore(tmp.path()), Err(Error::IndexCorrupt(_))));

    // Unparseable docstore.
    let tmp = TempDir::new().unwrap();
    index.persist(tmp.path()).unwrap();
    fs::write(tmp.path().join(DOCSTORE_FILE), "{").unwrap();
    assert!(matches!(VectorIndex::restore(tmp.path()), Err(Error::IndexCorrupt(_))));

    // Docstore from a different index.
    let other = TempDir::new().unwrap();
    let small = VectorIndex::build(&chunks[..1], &embedder).unwrap();
    small.persist(other.path()).unwrap();
    let tmp = TempDir::new().unwrap();
    index.persist(tmp.path()).unwrap();
    fs::copy(other.path().join(DOCSTORE_FILE), tmp.path().join(DOCSTORE_FILE)).unwrap();
    assert!(matches!(VectorIndex::restore(tmp.path()), Err(Error::IndexCorrupt(_))));
}

#[test]
fn query_embedder_dimension_must_match() {
    let (_docs, chunks) = corpus_chunks();
    let index = VectorIndex::build(&chunks, &HashEmbedder::new(64)).unwrap();
    let wrong = HashEmbedder::new(32);
    assert_eq!(wrong.dim(), 32);
    assert!(matches!(index.search("Docker", 1, &wrong), Err(Error::Embedding(_))));
}

struct FailingEmbedder;

impl Embedder for FailingEmbedder {
    fn dim(&self) -> usize {
        16
    }
    fn embed(&self, _text: &str) -> termrag_core::Result<Vec<f32>> {
        Err(Error::Timeout("embedding"))
    }
}

#[test]
fn from_documents_chunks_and_indexes_the_corpus() {
    let embedder = HashEmbedder::new(128);
    let (docs, chunks) = corpus_chunks();
    let chunker = Chunker::new(ChunkerConfig::default()).unwrap();
    let pb = indicatif::ProgressBar::hidden();

    let index = VectorIndex::from_documents(&docs, &chunker, &embedder, &pb).expect("build");
    assert_eq!(index, VectorIndex::build(&chunks, &embedder).unwrap());

    let err = VectorIndex::from_documents(&docs, &chunker, &FailingEmbedder, &pb).unwrap_err();
    assert!(matches!(err, Error::Timeout("embedding")));
}

#[test]
fn restore_rejects_unknown_metric() {
    let embedder = HashEmbedder::new(32);
    let (_docs, chunks) = corpus_chunks();
    let tmp = TempDir::new().unwrap();
    VectorIndex::build(&chunks, &embedder).unwrap().persist(tmp.path()).unwrap();

    let path = tmp.path().join(DOCSTORE_FILE);
    let mut docstore: serde_json::Value = serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
    assert_eq!(docstore["metric"], "cosine");
    docstore["metric"] = "dot".into();
    fs::write(&path, serde_json::to_vec(&docstore).unwrap()).unwrap();

    let err = VectorIndex::restore(tmp.path()).unwrap_err();
    assert!(matches!(err, Error::IndexCorrupt(ref m) if m.contains("metric")), "{err}");
}
