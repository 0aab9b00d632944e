//! Domain types shared by the chunker, the vector index and the answer pipeline.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Arc, Weak};

/// Free-form metadata attached to documents and carried into the index.
///
/// A `BTreeMap` keeps serialized metadata in a stable key order.
pub type Meta = BTreeMap<String, String>;

/// A reference document as produced by corpus ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub text: String,
    #[serde(default)]
    pub metadata: Meta,
    #[serde(default)]
    pub category: Option<String>,
}

impl Document {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into(), metadata: Meta::new(), category: None }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// A bounded window of a source document.
///
/// - `source`: non-owning handle to the parent document
/// - `ordinal`: position within the parent document
/// - `start`/`end`: byte range of `text` inside the parent text; consecutive
///   chunks may overlap, so `start` of chunk `n+1` can be lower than `end`
///   of chunk `n`
#[derive(Debug, Clone)]
pub struct Chunk {
    pub text: String,
    pub source: Weak<Document>,
    pub ordinal: usize,
    pub start: usize,
    pub end: usize,
}

impl Chunk {
    pub fn document(&self) -> Option<Arc<Document>> {
        self.source.upgrade()
    }

    /// Length in characters, the unit the window size is expressed in.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// One embedded chunk held by the vector index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexedVector {
    pub vector: Vec<f32>,
    pub text: String,
    #[serde(default)]
    pub metadata: Meta,
}

/// A retrieval result. Higher `score` is always better.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub text: String,
    pub score: f32,
}

/// The structured answer shape returned by both the answer and the
/// elaboration flows. Absent values are empty strings, never missing keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermAnswer {
    pub term: String,
    pub definition: String,
    pub example: String,
}

impl TermAnswer {
    pub fn new(term: impl Into<String>, definition: impl Into<String>, example: impl Into<String>) -> Self {
        Self { term: term.into(), definition: definition.into(), example: example.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub answer: TermAnswer,
    pub sources: Vec<String>,
}

/// A literal input/output pair embedded in a prompt to steer format and tone.
///
/// Typed inputs and outputs serialise in field declaration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FewShotExample<I = serde_json::Value, O = serde_json::Value> {
    pub input: I,
    pub output: O,
}
