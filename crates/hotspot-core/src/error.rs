//! Error taxonomy for the hotspot pipeline.
//!
//! Configuration and input problems are rejected immediately. "No data"
//! outcomes are not errors: see [`crate::pipeline::RankOutcome`].

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum HotspotError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid ISO week identifier: {0}")]
    InvalidWeek(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Model failure: {0}")]
    Model(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl HotspotError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }
}

pub type Result<T> = std::result::Result<T, HotspotError>;
