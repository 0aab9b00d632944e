//! termrag-llm
//!
//! Blocking OpenAI chat-completions client exposed as a [`Completer`].
//!
//! - POST `{endpoint}/v1/chat/completions`, non-streaming, single user message
//! - model and temperature come from [`LlmSettings`]
//! - transport timeouts map to `Error::Timeout("completion")`, every other
//!   provider failure to `Error::Completion`

use std::time::{Duration, Instant};

use reqwest::blocking::Client;
use reqwest::header;
use serde::{Deserialize, Serialize};
use termrag_core::config::LlmSettings;
use termrag_core::traits::Completer;
use termrag_core::{Error, Result};
use tracing::{debug, error, info};

#[derive(Debug)]
pub struct OpenAiChat {
    client: Client,
    url: String,
    model: String,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

impl OpenAiChat {
    /// Build a client from settings; the API key is read from `OPENAI_API_KEY`.
    pub fn from_settings(settings: &LlmSettings) -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| Error::InvalidConfig("OPENAI_API_KEY is not set".into()))?;
        Self::new(settings, &api_key)
    }

    pub fn new(settings: &LlmSettings, api_key: &str) -> Result<Self> {
        let endpoint = settings.endpoint.trim();
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(Error::InvalidConfig(format!("invalid completion endpoint: {endpoint}")));
        }
        if !settings.temperature.is_finite() || settings.temperature < 0.0 {
            return Err(Error::InvalidConfig(format!("invalid temperature: {}", settings.temperature)));
        }

        let mut headers = header::HeaderMap::new();
        let auth = header::HeaderValue::from_str(&format!("Bearer {api_key}"))
            .map_err(|e| Error::InvalidConfig(format!("invalid API key header: {e}")))?;
        headers.insert(header::AUTHORIZATION, auth);
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| Error::InvalidConfig(format!("cannot build HTTP client: {e}")))?;

        info!(model = %settings.model, endpoint, timeout_secs = settings.timeout_secs, "chat client initialized");
        Ok(Self {
            client,
            url: format!("{}/v1/chat/completions", endpoint.trim_end_matches('/')),
            model: settings.model.clone(),
            temperature: settings.temperature,
        })
    }
}

impl Completer for OpenAiChat {
    fn complete(&self, prompt: &str) -> Result<String> {
        let started = Instant::now();
        let body = ChatRequest {
            model: &self.model,
            messages: [ChatMessage { role: "user", content: prompt }],
            temperature: self.temperature,
        };
        debug!(model = %self.model, prompt_len = prompt.len(), "POST {}", self.url);

        let resp = self.client.post(&self.url).json(&body).send().map_err(transport_error)?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().unwrap_or_default();
            let snippet: String = text.chars().take(200).collect();
            error!(%status, url = %self.url, %snippet, latency_ms = started.elapsed().as_millis(), "chat completion rejected");
            return Err(Error::Completion(format!("{status}: {snippet}")));
        }

        let out: ChatResponse = resp.json().map_err(|e| {
            if e.is_timeout() {
                return Error::Timeout("completion");
            }
            error!(error = %e, latency_ms = started.elapsed().as_millis(), "cannot decode chat completion");
            Error::Completion(format!("expected `choices[0].message.content`: {e}"))
        })?;
        let content = out
            .choices
            .into_iter()
            .find_map(|c| c.message.content)
            .ok_or_else(|| Error::Completion("provider returned no choices".into()))?;

        info!(model = %self.model, latency_ms = started.elapsed().as_millis(), "chat completion completed");
        Ok(content)
    }
}

fn transport_error(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::Timeout("completion")
    } else {
        Error::Completion(e.to_string())
    }
}
