//! termrag-rag
//!
//! The answer pipeline: prompt construction, answer parsing and the
//! orchestrator that ties retrieval and completion together.

pub mod orchestrator;
pub mod parser;
pub mod prompt;

pub use orchestrator::QueryOrchestrator;
pub use parser::{fallback_answer, parse};
