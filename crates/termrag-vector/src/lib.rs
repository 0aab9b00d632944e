//! termrag-vector
//!
//! In-memory cosine-similarity index over chunk embeddings, with a two-file
//! on-disk format (see [`store`]).

mod index;
pub mod store;

pub use index::{VectorIndex, BUILD_BATCH_SIZE};
pub use store::{DOCSTORE_FILE, VECTORS_FILE};
