//! Compilation database records.
//!
//! The on-disk shape follows the clang JSON compilation database format:
//! an array of `{ directory, file, arguments | command, output }` objects.
//! The same type is used for the records we read and for the single record
//! describing the amalgamated unit that we write back.

use crate::paths;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One per-file compiler invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompileRecord {
    /// Working directory of the invocation
    pub directory: PathBuf,
    /// Source file, absolute or relative to `directory`
    pub file: PathBuf,
    /// Pre-split argument vector, compiler first
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<Vec<String>>,
    /// Shell-joined command line, used when `arguments` is absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
}

impl CompileRecord {
    pub fn with_arguments(
        directory: impl Into<PathBuf>,
        file: impl Into<PathBuf>,
        arguments: Vec<String>,
    ) -> Self {
        Self {
            directory: directory.into(),
            file: file.into(),
            arguments: Some(arguments),
            command: None,
            output: None,
        }
    }

    pub fn with_output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = Some(output.into());
        self
    }

    /// The source path resolved against `directory`, lexically normalized.
    ///
    /// This is the identity used for deduplicating database entries.
    pub fn source_path(&self) -> PathBuf {
        paths::resolve(&self.file, &self.directory)
    }

    /// Source path relative to the project root, `/`-separated.
    pub fn relative_source_path(&self, project_root: &Path) -> String {
        paths::to_slash(&paths::relative_to(&self.source_path(), project_root))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_arguments_entry() -> Result<(), Box<dyn std::error::Error>> {
        let record: CompileRecord = serde_json::from_str(
            r#"{"directory": "/proj", "file": "x.c", "arguments": ["cc", "-c", "x.c"]}"#,
        )?;
        assert_eq!(record.directory, PathBuf::from("/proj"));
        assert_eq!(record.arguments.as_deref().map(|a| a.len()), Some(3));
        assert!(record.command.is_none());
        assert!(record.output.is_none());
        Ok(())
    }

    #[test]
    fn test_serialize_skips_absent_fields() -> Result<(), Box<dyn std::error::Error>> {
        let record = CompileRecord::with_arguments("/proj", "/proj/a.c", vec!["cc".to_string()]);
        let json = serde_json::to_string(&record)?;
        assert_eq!(json, r#"{"directory":"/proj","file":"/proj/a.c","arguments":["cc"]}"#);
        Ok(())
    }

    #[test]
    fn test_source_path_resolution() {
        let record = CompileRecord::with_arguments("/proj/build", "../src/./a.c", vec![]);
        assert_eq!(record.source_path(), PathBuf::from("/proj/src/a.c"));
        assert_eq!(record.relative_source_path(Path::new("/proj")), "src/a.c");
    }
}
