use std::sync::Arc;

use indicatif::ProgressBar;
use termrag_core::chunker::Chunker;
use termrag_core::traits::Embedder;
use termrag_core::types::{Chunk, Document, IndexedVector, Meta, SearchHit};
use termrag_core::{Error, Result};
use tracing::{debug, info};

/// Number of chunk texts sent to the embedder per call during a build.
pub const BUILD_BATCH_SIZE: usize = 64;

/// Exhaustive cosine-similarity index.
///
/// Vectors are L2-normalised on insertion so a dot product is the cosine.
/// Entries keep insertion order, which is also the tie-break order of
/// [`VectorIndex::search`].
#[derive(Debug, Clone, PartialEq)]
pub struct VectorIndex {
    dim: usize,
    entries: Vec<IndexedVector>,
}

impl VectorIndex {
    pub fn new(dim: usize) -> Self {
        Self { dim, entries: Vec::new() }
    }

    pub(crate) fn from_entries(dim: usize, entries: Vec<IndexedVector>) -> Self {
        Self { dim, entries }
    }

    /// Embed every chunk and collect the results into a new index.
    ///
    /// Chunks consisting only of whitespace are skipped.
    pub fn build(chunks: &[Chunk], embedder: &dyn Embedder) -> Result<Self> {
        Self::build_with_progress(chunks, embedder, &ProgressBar::hidden())
    }

    pub fn build_with_progress(chunks: &[Chunk], embedder: &dyn Embedder, pb: &ProgressBar) -> Result<Self> {
        let mut index = Self::new(embedder.dim());
        let usable: Vec<&Chunk> = chunks.iter().filter(|c| !c.text.trim().is_empty()).collect();
        if usable.len() < chunks.len() {
            debug!(skipped = chunks.len() - usable.len(), "skipping blank chunks");
        }
        pb.set_length(usable.len() as u64);

        for batch in usable.chunks(BUILD_BATCH_SIZE) {
            let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
            let vectors = embedder.embed_batch(&texts)?;
            if vectors.len() != batch.len() {
                return Err(Error::Embedding(format!(
                    "expected {} embeddings, got {}",
                    batch.len(),
                    vectors.len()
                )));
            }
            for (chunk, vector) in batch.iter().zip(vectors) {
                let metadata = chunk.document().map(|d| d.metadata.clone()).unwrap_or_default();
                index.push(vector, chunk.text.clone(), metadata)?;
            }
            pb.inc(batch.len() as u64);
        }
        pb.finish_and_clear();

        info!(entries = index.len(), dim = index.dim, "vector index built");
        Ok(index)
    }

    /// Chunk `documents` and index every chunk.
    ///
    /// Any failure is reported as `Embedding` (or `Timeout` when the provider
    /// timed out).
    pub fn from_documents(
        documents: &[Arc<Document>],
        chunker: &Chunker,
        embedder: &dyn Embedder,
        pb: &ProgressBar,
    ) -> Result<Self> {
        let chunks = chunker.split_all(documents);
        debug!(documents = documents.len(), chunks = chunks.len(), "corpus chunked");
        Self::build_with_progress(&chunks, embedder, pb).map_err(|e| match e {
            Error::Embedding(_) | Error::Timeout(_) => e,
            other => Error::Embedding(other.to_string()),
        })
    }

    /// Append one entry. Fails when the vector has the wrong dimension or
    /// contains non-finite values.
    pub fn push(&mut self, mut vector: Vec<f32>, text: String, metadata: Meta) -> Result<()> {
        check_vector(&vector, self.dim)?;
        normalize(&mut vector);
        self.entries.push(IndexedVector { vector, text, metadata });
        Ok(())
    }

    /// Embed `query` and return up to `k` hits, best first.
    ///
    /// An empty index answers with no hits without calling the embedder.
    pub fn search(&self, query: &str, k: usize, embedder: &dyn Embedder) -> Result<Vec<SearchHit>> {
        if k == 0 {
            return Err(Error::InvalidArgument("k must be at least 1".into()));
        }
        if self.entries.is_empty() {
            return Ok(Vec::new());
        }
        let query_vec = embedder.embed(query)?;
        self.search_vector(&query_vec, k)
    }

    /// Up to `k` hits ordered by non-increasing cosine similarity; equal
    /// scores keep insertion order.
    pub fn search_vector(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>> {
        if k == 0 {
            return Err(Error::InvalidArgument("k must be at least 1".into()));
        }
        if self.entries.is_empty() {
            return Ok(Vec::new());
        }
        check_vector(query, self.dim)?;
        let mut q = query.to_vec();
        normalize(&mut q);

        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, e)| (i, dot(&q, &e.vector)))
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(k);

        debug!(k, hits = scored.len(), top = scored.first().map(|s| s.1), "vector search");
        Ok(scored
            .into_iter()
            .map(|(i, score)| SearchHit { text: self.entries[i].text.clone(), score })
            .collect())
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[IndexedVector] {
        &self.entries
    }
}

fn check_vector(v: &[f32], dim: usize) -> Result<()> {
    if v.len() != dim {
        return Err(Error::Embedding(format!("expected a {dim}-dimensional vector, got {}", v.len())));
    }
    if v.iter().any(|x| !x.is_finite()) {
        return Err(Error::Embedding("vector contains non-finite values".into()));
    }
    Ok(())
}

fn normalize(v: &mut [f32]) {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index_of(vectors: &[[f32; 2]]) -> VectorIndex {
        let mut index = VectorIndex::new(2);
        for (i, v) in vectors.iter().enumerate() {
            index.push(v.to_vec(), format!("doc{i}"), Meta::new()).unwrap();
        }
        index
    }

    #[test]
    fn ties_keep_insertion_order() {
        let index = index_of(&[[1.0, 0.0], [0.0, 1.0], [2.0, 0.0], [3.0, 0.0]]);
        let hits = index.search_vector(&[1.0, 0.0], 3).unwrap();
        let texts: Vec<&str> = hits.iter().map(|h| h.text.as_str()).collect();
        assert_eq!(texts, ["doc0", "doc2", "doc3"]);
    }

    #[test]
    fn rejects_zero_k_and_wrong_dimension() {
        let index = index_of(&[[1.0, 0.0]]);
        assert!(matches!(index.search_vector(&[1.0, 0.0], 0), Err(Error::InvalidArgument(_))));
        assert!(matches!(index.search_vector(&[1.0, 0.0, 0.0], 1), Err(Error::Embedding(_))));
        let mut index = VectorIndex::new(2);
        assert!(index.push(vec![f32::NAN, 1.0], "nan".into(), Meta::new()).is_err());
    }
}
