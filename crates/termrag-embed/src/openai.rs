//! OpenAI embeddings client (`POST {endpoint}/v1/embeddings`).

use std::time::{Duration, Instant};

use reqwest::blocking::Client;
use reqwest::header;
use serde::{Deserialize, Serialize};
use termrag_core::config::EmbeddingSettings;
use termrag_core::traits::Embedder;
use termrag_core::{Error, Result};
use tracing::{debug, error};

#[derive(Debug)]
pub struct OpenAiEmbedder {
    client: Client,
    url: String,
    model: String,
    dim: usize,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
    dimensions: usize,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

impl OpenAiEmbedder {
    /// Build a client from settings; the API key is read from `OPENAI_API_KEY`.
    pub fn from_settings(settings: &EmbeddingSettings) -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| Error::InvalidConfig("OPENAI_API_KEY is not set".into()))?;
        Self::new(&settings.endpoint, &api_key, &settings.model, settings.dimension, settings.timeout_secs)
    }

    pub fn new(endpoint: &str, api_key: &str, model: &str, dim: usize, timeout_secs: u64) -> Result<Self> {
        let endpoint = endpoint.trim();
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(Error::InvalidConfig(format!("invalid embedding endpoint: {endpoint}")));
        }
        let mut headers = header::HeaderMap::new();
        let auth = header::HeaderValue::from_str(&format!("Bearer {api_key}"))
            .map_err(|e| Error::InvalidConfig(format!("invalid API key header: {e}")))?;
        headers.insert(header::AUTHORIZATION, auth);
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| Error::InvalidConfig(format!("cannot build HTTP client: {e}")))?;
        Ok(Self {
            client,
            url: format!("{}/v1/embeddings", endpoint.trim_end_matches('/')),
            model: model.to_string(),
            dim,
        })
    }

    fn request(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let started = Instant::now();
        let body = EmbeddingRequest { model: &self.model, input: texts, dimensions: self.dim };
        let resp = self.client.post(&self.url).json(&body).send().map_err(transport_error)?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().unwrap_or_default();
            error!(%status, url = %self.url, latency_ms = started.elapsed().as_millis(), "embedding request rejected");
            return Err(Error::Embedding(format!("{status}: {}", snippet(&text))));
        }

        let mut out: EmbeddingResponse = resp.json().map_err(transport_error)?;
        if out.data.len() != texts.len() {
            return Err(Error::Embedding(format!(
                "expected {} embeddings, provider returned {}",
                texts.len(),
                out.data.len()
            )));
        }
        out.data.sort_by_key(|d| d.index);
        debug!(texts = texts.len(), latency_ms = started.elapsed().as_millis(), "embeddings received");
        Ok(out.data.into_iter().map(|d| d.embedding).collect())
    }
}

impl Embedder for OpenAiEmbedder {
    fn dim(&self) -> usize {
        self.dim
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.request(&[text.to_string()])?
            .pop()
            .ok_or_else(|| Error::Embedding("provider returned no embedding".into()))
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.request(texts)
    }
}

fn transport_error(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::Timeout("embedding")
    } else {
        Error::Embedding(e.to_string())
    }
}

fn snippet(text: &str) -> String {
    text.chars().take(200).collect()
}
