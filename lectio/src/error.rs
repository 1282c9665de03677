//! Error types for Lectio

use thiserror::Error;

/// Failure to populate the corpus. Fatal to search for the session.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Malformed corpus JSON: {0}")]
    Parse(String),

    #[error("Invalid corpus row {row}: {reason}")]
    Invalid { row: usize, reason: String },
}

#[derive(Error, Debug)]
pub enum LectioError {
    #[error("Corpus not ready: {0}")]
    CorpusNotReady(String),

    #[error("Corpus failed to load: {0}")]
    LoadFailed(#[from] LoadError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Search error: {0}")]
    Search(String),

    #[error("{0}")]
    Other(String),
}

impl serde::Serialize for LectioError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}
