//! On-disk layout of a persisted index.
//!
//! A persisted index is a directory holding two files:
//!
//! - `vectors.bin`: bincode-encoded dimension plus the normalised vectors
//! - `docstore.json`: chunk texts and metadata in vector order, together with
//!   the vector count, dimension and a blake3 digest of `vectors.bin`
//!
//! Each file is written to a temporary sibling and renamed into place, so a
//! reader never observes a half-written file. Restoring checks the digest and
//! the counts before anything is handed back.

use std::fs;
use std::io::Write;
use std::path::Path;

use bincode::Options;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use termrag_core::types::{IndexedVector, Meta};
use termrag_core::{Error, Result};
use tracing::{debug, info};

use crate::index::VectorIndex;

pub const VECTORS_FILE: &str = "vectors.bin";
pub const DOCSTORE_FILE: &str = "docstore.json";
const FORMAT_VERSION: u32 = 1;
const METRIC: &str = "cosine";

#[derive(Serialize, Deserialize)]
struct VectorStore {
    dim: usize,
    vectors: Vec<Vec<f32>>,
}

#[derive(Serialize, Deserialize)]
struct DocStore {
    version: u32,
    dim: usize,
    metric: String,
    count: usize,
    vectors_blake3: String,
    entries: Vec<DocEntry>,
}

#[derive(Serialize, Deserialize)]
struct DocEntry {
    text: String,
    #[serde(default)]
    metadata: Meta,
}

impl VectorIndex {
    /// Write the index into `dir`, creating it if needed.
    pub fn persist(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir)?;

        let store = VectorStore {
            dim: self.dim(),
            vectors: self.entries().iter().map(|e| e.vector.clone()).collect(),
        };
        let vector_bytes = bincode::DefaultOptions::new()
            .serialize(&store)
            .map_err(|e| Error::IndexCorrupt(format!("cannot encode vectors: {e}")))?;

        let docs = DocStore {
            version: FORMAT_VERSION,
            dim: self.dim(),
            metric: METRIC.into(),
            count: self.len(),
            vectors_blake3: blake3::hash(&vector_bytes).to_hex().to_string(),
            entries: self
                .entries()
                .iter()
                .map(|e| DocEntry { text: e.text.clone(), metadata: e.metadata.clone() })
                .collect(),
        };
        let doc_bytes = serde_json::to_vec_pretty(&docs)
            .map_err(|e| Error::IndexCorrupt(format!("cannot encode docstore: {e}")))?;

        write_atomic(dir, VECTORS_FILE, &vector_bytes)?;
        write_atomic(dir, DOCSTORE_FILE, &doc_bytes)?;
        info!(dir = %dir.display(), entries = self.len(), "index persisted");
        Ok(())
    }

    /// Load an index previously written by [`VectorIndex::persist`].
    pub fn restore(dir: &Path) -> Result<Self> {
        let vectors_path = dir.join(VECTORS_FILE);
        let docs_path = dir.join(DOCSTORE_FILE);
        for p in [&vectors_path, &docs_path] {
            if !p.is_file() {
                return Err(Error::IndexNotFound(p.clone()));
            }
        }

        let vector_bytes = fs::read(&vectors_path)?;
        let doc_bytes = fs::read(&docs_path)?;

        let docs: DocStore = serde_json::from_slice(&doc_bytes)
            .map_err(|e| Error::IndexCorrupt(format!("{DOCSTORE_FILE}: {e}")))?;
        if docs.version != FORMAT_VERSION {
            return Err(Error::IndexCorrupt(format!("unsupported format version {}", docs.version)));
        }
        if docs.metric != METRIC {
            return Err(Error::IndexCorrupt(format!("unsupported metric {:?}", docs.metric)));
        }
        let digest = blake3::hash(&vector_bytes).to_hex().to_string();
        if digest != docs.vectors_blake3 {
            return Err(Error::IndexCorrupt(format!("{VECTORS_FILE} does not match its recorded checksum")));
        }

        let store: VectorStore = bincode::DefaultOptions::new()
            .with_limit(vector_bytes.len() as u64)
            .deserialize(&vector_bytes)
            .map_err(|e| Error::IndexCorrupt(format!("{VECTORS_FILE}: {e}")))?;

        if store.dim != docs.dim {
            return Err(Error::IndexCorrupt(format!(
                "dimension mismatch: {} in {VECTORS_FILE}, {} in {DOCSTORE_FILE}",
                store.dim, docs.dim
            )));
        }
        if store.vectors.len() != docs.entries.len() || docs.count != docs.entries.len() {
            return Err(Error::IndexCorrupt(format!(
                "entry count mismatch: {} vectors, {} documents",
                store.vectors.len(),
                docs.entries.len()
            )));
        }
        if let Some(bad) = store.vectors.iter().position(|v| v.len() != store.dim) {
            return Err(Error::IndexCorrupt(format!("vector {bad} has the wrong dimension")));
        }

        let entries: Vec<IndexedVector> = store
            .vectors
            .into_iter()
            .zip(docs.entries)
            .map(|(vector, d)| IndexedVector { vector, text: d.text, metadata: d.metadata })
            .collect();
        debug!(dir = %dir.display(), entries = entries.len(), dim = store.dim, "index restored");
        Ok(VectorIndex::from_entries(store.dim, entries))
    }
}

fn write_atomic(dir: &Path, name: &str, bytes: &[u8]) -> Result<()> {
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(dir.join(name)).map_err(|e| Error::Io(e.error))?;
    Ok(())
}
