use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The query path was used before an index was built or loaded.
    #[error("Index is not ready: build or load an index first")]
    NotReady,

    #[error("Embedding failed: {0}")]
    Embedding(String),

    #[error("Completion failed: {0}")]
    Completion(String),

    #[error("{0} request timed out")]
    Timeout(&'static str),

    #[error("Retrieval failed: {0}")]
    Retrieval(#[source] Box<Error>),

    #[error("Index not found at {}", .0.display())]
    IndexNotFound(PathBuf),

    #[error("Index is corrupt: {0}")]
    IndexCorrupt(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Wrap a failure raised while retrieving context for a question.
    ///
    /// Timeouts and readiness errors keep their own variant so callers can
    /// tell them apart from provider failures.
    pub fn retrieval(err: Error) -> Self {
        match err {
            Error::Timeout(_) | Error::NotReady | Error::InvalidArgument(_) => err,
            other => Error::Retrieval(Box::new(other)),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
