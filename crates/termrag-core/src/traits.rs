use crate::error::Result;

/// Maps text to a fixed-dimension vector.
///
/// Implementations are blocking and must be safe to call from several
/// threads at once.
pub trait Embedder: Send + Sync {
    fn dim(&self) -> usize;
    fn embed(&self, text: &str) -> Result<Vec<f32>>;
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.embed(t)).collect()
    }
}

/// Sends a prompt to a language model and returns its raw text.
///
/// No guarantee is made that the text is well-formed JSON.
pub trait Completer: Send + Sync {
    fn complete(&self, prompt: &str) -> Result<String>;
}
