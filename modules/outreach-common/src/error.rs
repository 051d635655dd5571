use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum OutreachError {
    #[error("No city matched the given tokens. Known cities: {}", known.join(", "))]
    NoMatch { known: Vec<String> },

    #[error("Generation failed for {shard}: {message}")]
    Generation { shard: String, message: String },

    #[error("Reconciliation batch {batch} returned {actual} results for {expected} records")]
    ReconciliationMismatch {
        batch: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Persistence error at {}: {message}", path.display())]
    Persistence { path: PathBuf, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl OutreachError {
    pub fn persistence(path: impl Into<PathBuf>, err: impl std::fmt::Display) -> Self {
        Self::Persistence {
            path: path.into(),
            message: err.to_string(),
        }
    }
}
