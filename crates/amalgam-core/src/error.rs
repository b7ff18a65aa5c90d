use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Failed to read skip list {path}: {source}")]
    SkipListRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write skip list {path}: {source}")]
    SkipListWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid define flag: {0}")]
    InvalidDefine(String),
}
