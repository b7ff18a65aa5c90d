use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParserError {
    #[error("Malformed compilation database: {0}")]
    MalformedDatabase(String),

    #[error("Unexpected invocation shape for {file}: {reason}")]
    InvocationShape { file: PathBuf, reason: String },

    #[error("Failed to parse compiler diagnostics: {0}")]
    DiagnosticParse(String),

    #[error("Invalid diagnostic pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Core(#[from] amalgam_core::CoreError),
}
