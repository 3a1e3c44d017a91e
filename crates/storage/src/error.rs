//! Storage errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("io error for {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed learner document for {learner_id}: {source}")]
    Malformed {
        learner_id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("external mirror rejected the write: {0}")]
    Mirror(String),
}
