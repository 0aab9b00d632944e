//! Query orchestration over a shared, swappable vector index.
//!
//! The orchestrator owns the current index as `RwLock<Option<Arc<VectorIndex>>>`.
//! Queries clone the `Arc` under a short read lock and work on that snapshot;
//! `build_index` and `load_index` construct the replacement completely before
//! taking the write lock for the pointer swap, so in-flight queries keep
//! using the previous index and a failed load leaves it in place.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use indicatif::ProgressBar;
use parking_lot::RwLock;
use serde_json::Value;
use termrag_core::chunker::{Chunker, ChunkerConfig};
use termrag_core::config::Settings;
use termrag_core::traits::{Completer, Embedder};
use termrag_core::types::{Document, QueryResult, TermAnswer};
use termrag_core::{Error, Result};
use termrag_vector::VectorIndex;
use tracing::{debug, info};

use crate::{parser, prompt};

pub const DEFAULT_TOP_K: usize = 4;

pub struct QueryOrchestrator {
    embedder: Arc<dyn Embedder>,
    completer: Arc<dyn Completer>,
    chunker: Chunker,
    top_k: usize,
    index: RwLock<Option<Arc<VectorIndex>>>,
}

impl QueryOrchestrator {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        completer: Arc<dyn Completer>,
        chunker: ChunkerConfig,
        top_k: usize,
    ) -> Result<Self> {
        if top_k == 0 {
            return Err(Error::InvalidConfig("top_k must be at least 1".into()));
        }
        Ok(Self {
            embedder,
            completer,
            chunker: Chunker::new(chunker)?,
            top_k,
            index: RwLock::new(None),
        })
    }

    /// Window 1000, overlap 200, four retrieved chunks.
    pub fn with_defaults(embedder: Arc<dyn Embedder>, completer: Arc<dyn Completer>) -> Result<Self> {
        Self::new(embedder, completer, ChunkerConfig::default(), DEFAULT_TOP_K)
    }

    pub fn from_settings(
        settings: &Settings,
        embedder: Arc<dyn Embedder>,
        completer: Arc<dyn Completer>,
    ) -> Result<Self> {
        Self::new(embedder, completer, settings.chunker_config(), settings.retrieval.top_k)
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    pub fn is_ready(&self) -> bool {
        self.index.read().is_some()
    }

    /// The index queries currently run against, if any.
    pub fn current_index(&self) -> Option<Arc<VectorIndex>> {
        self.index.read().clone()
    }

    /// Chunk and embed `documents`, then install the result as the current
    /// index. Returns the number of indexed chunks.
    pub fn build_index(&self, documents: &[Arc<Document>]) -> Result<usize> {
        self.build_index_with_progress(documents, &ProgressBar::hidden())
    }

    pub fn build_index_with_progress(&self, documents: &[Arc<Document>], pb: &ProgressBar) -> Result<usize> {
        let started = Instant::now();
        let index = VectorIndex::from_documents(documents, &self.chunker, self.embedder.as_ref(), pb)?;
        let entries = index.len();
        self.install(index);
        info!(entries, latency_ms = started.elapsed().as_millis(), "index ready");
        Ok(entries)
    }

    /// Persist the current index into `dir`.
    pub fn save_index(&self, dir: &Path) -> Result<()> {
        let index = self.current_index().ok_or(Error::NotReady)?;
        index.persist(dir)
    }

    /// Restore an index from `dir` and make it current. On failure the
    /// previous index, if any, stays in service.
    pub fn load_index(&self, dir: &Path) -> Result<usize> {
        let index = VectorIndex::restore(dir)?;
        if index.dim() != self.embedder.dim() {
            return Err(Error::IndexCorrupt(format!(
                "index has dimension {}, embedder produces {}",
                index.dim(),
                self.embedder.dim()
            )));
        }
        let entries = index.len();
        self.install(index);
        info!(dir = %dir.display(), entries, "index loaded");
        Ok(entries)
    }

    fn install(&self, index: VectorIndex) {
        let replacement = Arc::new(index);
        *self.index.write() = Some(replacement);
    }

    /// Answer `question` for a reader working in `category`.
    ///
    /// Sources are the retrieved chunk texts in retrieval order.
    pub fn answer(&self, question: &str, category: &str) -> Result<QueryResult> {
        let started = Instant::now();
        require_text("question", question)?;
        require_text("category", category)?;
        debug!(state = "RECEIVED", category, "answer request");

        let index = self.current_index().ok_or(Error::NotReady)?;

        debug!(state = "RETRIEVING", k = self.top_k);
        let hits = index
            .search(question, self.top_k, self.embedder.as_ref())
            .map_err(Error::retrieval)?;
        let sources: Vec<String> = hits.into_iter().map(|h| h.text).collect();

        debug!(state = "PROMPTING", context_chunks = sources.len());
        let prompt = prompt::answer_prompt(question, category, &sources);

        let answer = self.complete_and_parse(&prompt)?;
        debug!(state = "RETURNED", latency_ms = started.elapsed().as_millis());
        Ok(QueryResult { answer, sources })
    }

    /// Deepen a previous answer according to `request`. No retrieval is
    /// performed, so this works before any index exists.
    pub fn elaborate(&self, previous: &TermAnswer, request: &str, category: &str) -> Result<QueryResult> {
        let started = Instant::now();
        require_text("request", request)?;
        require_text("category", category)?;
        debug!(state = "RECEIVED", category, request, "elaboration request");

        debug!(state = "PROMPTING");
        let prompt = prompt::elaboration_prompt(previous, request, category);

        let answer = self.complete_and_parse(&prompt)?;
        debug!(state = "RETURNED", latency_ms = started.elapsed().as_millis());
        Ok(QueryResult { answer, sources: Vec::new() })
    }

    /// Like [`elaborate`](Self::elaborate), for a previous answer that has
    /// not been validated yet. It must be an object with string `term`,
    /// `definition` and `example` keys.
    pub fn elaborate_json(&self, previous: &Value, request: &str, category: &str) -> Result<QueryResult> {
        let previous: TermAnswer = serde_json::from_value(previous.clone())
            .map_err(|e| Error::InvalidArgument(format!("previous answer: {e}")))?;
        self.elaborate(&previous, request, category)
    }

    fn complete_and_parse(&self, prompt: &str) -> Result<TermAnswer> {
        debug!(state = "COMPLETING", prompt_len = prompt.len());
        let raw = self.completer.complete(prompt).map_err(|e| match e {
            Error::Completion(_) | Error::Timeout(_) => e,
            other => Error::Completion(other.to_string()),
        })?;
        let answer = parser::parse(&raw);
        debug!(state = "PARSED", term = %answer.term);
        Ok(answer)
    }
}

fn require_text(name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::InvalidArgument(format!("{name} must not be empty")));
    }
    Ok(())
}
