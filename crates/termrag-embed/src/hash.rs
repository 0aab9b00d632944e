use std::hash::{Hash, Hasher};

use termrag_core::traits::Embedder;
use termrag_core::Result;
use twox_hash::XxHash64;

/// Bag-of-words embedder: every lowercased alphanumeric token is hashed into
/// one of `dim` buckets and the result is L2-normalised.
///
/// Texts sharing vocabulary score close to each other, which is enough for
/// retrieval tests without a model.
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dim: usize,
}

impl HashEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim: dim.max(1) }
    }
}

impl Embedder for HashEmbedder {
    fn dim(&self) -> usize {
        self.dim
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut v = vec![0f32; self.dim];
        let tokens = text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .map(str::to_lowercase);
        for token in tokens {
            let mut hasher = XxHash64::with_seed(0);
            token.hash(&mut hasher);
            let h = hasher.finish();
            let idx = (h % self.dim as u64) as usize;
            v[idx] += 1.0 + ((h >> 32) as u32) as f32 / u32::MAX as f32;
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut v {
                *x /= norm;
            }
        }
        Ok(v)
    }
}
