//! Loading the raw term list into [`Document`]s.
//!
//! The term list is a JSON array of `{term, definition, example, category?}`
//! records. Each record becomes one document whose text lists the fields on
//! labelled lines; `term` and `category` are also kept as metadata.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::types::Document;

#[derive(Debug, Clone, Deserialize)]
pub struct TermRecord {
    pub term: String,
    pub definition: String,
    #[serde(default)]
    pub example: String,
    #[serde(default)]
    pub category: Option<String>,
}

impl TermRecord {
    pub fn into_document(self) -> Document {
        let mut text = format!(
            "Term: {}\nDefinition: {}\nExample: {}",
            self.term, self.definition, self.example
        );
        if let Some(category) = &self.category {
            text.push_str("\nCategory: ");
            text.push_str(category);
        }
        let mut doc = Document::new(text).with_meta("term", self.term);
        if let Some(category) = self.category {
            doc = doc.with_meta("category", category.clone()).with_category(category);
        }
        doc
    }
}

pub fn parse_terms(json: &str) -> Result<Vec<Document>> {
    let records: Vec<TermRecord> = serde_json::from_str(json)
        .map_err(|e| Error::InvalidArgument(format!("term list is not valid JSON: {e}")))?;
    Ok(records.into_iter().map(TermRecord::into_document).collect())
}

/// Load one JSON term list, or every `*.json` file under a directory
/// (visited in sorted path order).
pub fn load_documents(path: &Path) -> Result<Vec<Arc<Document>>> {
    let files = if path.is_dir() { list_json_files(path) } else { vec![path.to_path_buf()] };
    let mut documents = Vec::new();
    for file in &files {
        let raw = fs::read_to_string(file)?;
        let docs = parse_terms(&raw)?;
        debug!(file = %file.display(), documents = docs.len(), "loaded term list");
        documents.extend(docs.into_iter().map(Arc::new));
    }
    info!(files = files.len(), documents = documents.len(), "corpus loaded");
    Ok(documents)
}

fn list_json_files(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.path().extension().and_then(|s| s.to_str()) == Some("json"))
        .map(|e| e.path().to_path_buf())
        .collect();
    files.sort();
    files
}
