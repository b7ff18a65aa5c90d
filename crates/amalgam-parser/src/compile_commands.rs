//! Compilation database loading.
//!
//! A database may list the same source file several times (one entry per
//! build configuration, test variants, ...). Only the first entry for a
//! given source path is kept; later ones are dropped without error.

use crate::{Parser, ParserError};
use amalgam_core::CompileRecord;
use serde_json::Value;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Default, Clone)]
pub struct CompileDatabaseLoader;

impl CompileDatabaseLoader {
    pub fn new() -> Self {
        Self
    }

    /// Read and parse a `compile_commands.json` file.
    pub fn load_file(&self, path: &Path) -> Result<Vec<CompileRecord>, ParserError> {
        let content = fs::read_to_string(path).map_err(|source| ParserError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.parse(&content)
    }

    fn parse_entry(index: usize, value: Value) -> Result<CompileRecord, ParserError> {
        if !value.is_object() {
            return Err(ParserError::MalformedDatabase(format!(
                "entry {} is not an object",
                index
            )));
        }

        let record: CompileRecord = serde_json::from_value(value)
            .map_err(|e| ParserError::MalformedDatabase(format!("entry {}: {}", index, e)))?;

        if record.file.as_os_str().is_empty() {
            return Err(ParserError::MalformedDatabase(format!(
                "entry {} has an empty file path",
                index
            )));
        }

        let has_arguments = record.arguments.as_ref().is_some_and(|a| !a.is_empty());
        let has_command = record
            .command
            .as_ref()
            .is_some_and(|c| !c.trim().is_empty());
        if !has_arguments && !has_command {
            return Err(ParserError::MalformedDatabase(format!(
                "entry {} ({}) has neither arguments nor command",
                index,
                record.file.display()
            )));
        }

        Ok(record)
    }
}

impl Parser for CompileDatabaseLoader {
    type Output = Vec<CompileRecord>;

    fn parse(&self, input: &str) -> Result<Self::Output, ParserError> {
        let document: Value = serde_json::from_str(input)
            .map_err(|e| ParserError::MalformedDatabase(e.to_string()))?;

        let Value::Array(entries) = document else {
            return Err(ParserError::MalformedDatabase(
                "expected a JSON array of compile entries".to_string(),
            ));
        };

        let total = entries.len();
        let mut seen = HashSet::new();
        let mut records = Vec::with_capacity(total);

        for (index, value) in entries.into_iter().enumerate() {
            let record = Self::parse_entry(index, value)?;
            let source = record.source_path();
            if seen.insert(source.clone()) {
                records.push(record);
            } else {
                debug!("Dropping duplicate database entry for {}", source.display());
            }
        }

        debug!(
            "Loaded {} compile records ({} duplicates dropped)",
            records.len(),
            total - records.len()
        );
        Ok(records)
    }
}
