//! Recursive, overlap-aware text chunking.
//!
//! Text is first cut into pieces along the coarsest separator that keeps each
//! piece within the window (paragraph, line, sentence, word, then single
//! characters). Separators stay attached to the piece they terminate, so the
//! pieces always concatenate back to the input. Pieces are then merged
//! greedily into windows; each new window starts with the trailing pieces of
//! the previous one that fit into the overlap budget.

use std::collections::VecDeque;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::types::{Chunk, Document};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkerConfig {
    /// Maximum chunk length in characters.
    pub window: usize,
    /// Characters shared between consecutive chunks of one document.
    pub overlap: usize,
    /// Separators in priority order. An empty string means "split anywhere".
    pub separators: Vec<String>,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            window: 1000,
            overlap: 200,
            separators: ["\n\n", "\n", ". ", " ", ""].iter().map(|s| (*s).to_string()).collect(),
        }
    }
}

impl ChunkerConfig {
    pub fn new(window: usize, overlap: usize) -> Self {
        Self { window, overlap, ..Self::default() }
    }
}

#[derive(Debug, Clone)]
pub struct Chunker {
    config: ChunkerConfig,
}

/// Byte range of a piece plus its length in characters.
#[derive(Debug, Clone, Copy)]
struct Piece {
    start: usize,
    end: usize,
    chars: usize,
}

impl Chunker {
    pub fn new(config: ChunkerConfig) -> Result<Self> {
        if config.window == 0 {
            return Err(Error::InvalidConfig("chunk window must be at least 1".into()));
        }
        if config.overlap >= config.window {
            return Err(Error::InvalidConfig(format!(
                "chunk overlap ({}) must be smaller than the window ({})",
                config.overlap, config.window
            )));
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> &ChunkerConfig {
        &self.config
    }

    /// Split one document. Same input and configuration always yield the
    /// same chunk sequence.
    pub fn split(&self, document: &Arc<Document>) -> Vec<Chunk> {
        let text = document.text.as_str();
        let mut pieces = Vec::new();
        self.collect_pieces(text, 0, &self.config.separators, &mut pieces);

        let source = Arc::downgrade(document);
        let mut chunks = Vec::new();
        let emit = |window: &VecDeque<Piece>, chunks: &mut Vec<Chunk>| {
            if let (Some(first), Some(last)) = (window.front(), window.back()) {
                chunks.push(Chunk {
                    text: text[first.start..last.end].to_string(),
                    source: source.clone(),
                    ordinal: chunks.len(),
                    start: first.start,
                    end: last.end,
                });
            }
        };

        let mut window: VecDeque<Piece> = VecDeque::new();
        let mut total = 0usize;
        for piece in pieces {
            if total + piece.chars > self.config.window && !window.is_empty() {
                emit(&window, &mut chunks);
                // Keep a tail that fits the overlap budget and leaves room for `piece`.
                while total > 0
                    && (total > self.config.overlap || total + piece.chars > self.config.window)
                {
                    match window.pop_front() {
                        Some(dropped) => total -= dropped.chars,
                        None => break,
                    }
                }
            }
            total += piece.chars;
            window.push_back(piece);
        }
        emit(&window, &mut chunks);

        debug!(chunks = chunks.len(), chars = text.chars().count(), "document split");
        chunks
    }

    pub fn split_all(&self, documents: &[Arc<Document>]) -> Vec<Chunk> {
        documents.iter().flat_map(|d| self.split(d)).collect()
    }

    fn collect_pieces(&self, text: &str, base: usize, separators: &[String], out: &mut Vec<Piece>) {
        if text.is_empty() {
            return;
        }
        let chars = text.chars().count();
        if chars <= self.config.window {
            out.push(Piece { start: base, end: base + text.len(), chars });
            return;
        }

        let position = separators.iter().position(|s| s.is_empty() || text.contains(s.as_str()));
        let Some(i) = position else {
            self.hard_split(text, base, out);
            return;
        };
        let separator = separators[i].as_str();
        if separator.is_empty() {
            self.hard_split(text, base, out);
            return;
        }

        let finer = &separators[i + 1..];
        let mut offset = 0usize;
        for segment in text.split_inclusive(separator) {
            self.collect_pieces(segment, base + offset, finer, out);
            offset += segment.len();
        }
    }

    /// Cut into single-character pieces so the merge step can carry an
    /// overlap tail across windows of unbroken text.
    fn hard_split(&self, text: &str, base: usize, out: &mut Vec<Piece>) {
        out.extend(text.char_indices().map(|(idx, c)| Piece {
            start: base + idx,
            end: base + idx + c.len_utf8(),
            chars: 1,
        }));
    }
}

/// Rebuild the text of a single document from its chunks by dropping the
/// prefix each chunk shares with its predecessor.
pub fn reassemble(chunks: &[Chunk]) -> String {
    let mut out = String::new();
    let mut covered = 0usize;
    for chunk in chunks {
        let skip = covered.saturating_sub(chunk.start).min(chunk.text.len());
        out.push_str(&chunk.text[skip..]);
        covered = covered.max(chunk.end);
    }
    out
}
