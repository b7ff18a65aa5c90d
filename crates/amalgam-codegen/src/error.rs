//! Error types for synthesis and artifact output

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CodegenError {
    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid artifact name: {0:?}")]
    InvalidArtifactName(String),
}
