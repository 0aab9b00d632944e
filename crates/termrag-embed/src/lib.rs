//! termrag-embed
//!
//! `Embedder` implementations: the OpenAI embeddings endpoint and a
//! deterministic hashing embedder for tests and offline development.

mod hash;
mod openai;

pub use hash::HashEmbedder;
pub use openai::OpenAiEmbedder;

use termrag_core::config::{EmbeddingProvider, EmbeddingSettings};
use termrag_core::traits::Embedder;
use termrag_core::Result;
use tracing::info;

/// Pick the embedder described by `settings`.
///
/// `APP_USE_FAKE_EMBEDDINGS=1` (or `true`) forces the hashing embedder
/// regardless of the configured provider.
pub fn get_default_embedder(settings: &EmbeddingSettings) -> Result<Box<dyn Embedder>> {
    let use_fake = std::env::var("APP_USE_FAKE_EMBEDDINGS")
        .ok()
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);
    if use_fake || settings.provider == EmbeddingProvider::Hash {
        info!(dim = settings.dimension, "using hashing embedder");
        return Ok(Box::new(HashEmbedder::new(settings.dimension)));
    }
    Ok(Box::new(OpenAiEmbedder::from_settings(settings)?))
}
