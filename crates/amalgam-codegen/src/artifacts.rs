//! On-disk layout of the generated artifacts and the compiler invocations
//! that consume them.

use crate::CodegenError;
use amalgam_core::CompileRecord;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_OUTPUT_DIR: &str = "amalgamated";
pub const COMPILE_DATABASE_FILE: &str = "compile_commands.json";
pub const SKIP_LIST_FILE: &str = "files_with_errors.txt";

/// Paths of everything generated for one artifact name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    dir: PathBuf,
    name: String,
}

impl ArtifactPaths {
    pub fn new(dir: impl Into<PathBuf>, name: impl Into<String>) -> Result<Self, CodegenError> {
        let name = name.into();
        if name.is_empty() || name.contains(['/', '\\']) || name.starts_with('.') {
            return Err(CodegenError::InvalidArtifactName(name));
        }
        Ok(Self {
            dir: dir.into(),
            name,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn with_suffix(&self, suffix: &str) -> PathBuf {
        self.dir.join(format!("{}{}", self.name, suffix))
    }

    /// The amalgamated C source
    pub fn source(&self) -> PathBuf {
        self.with_suffix(".c")
    }

    pub fn object(&self) -> PathBuf {
        self.with_suffix(".o")
    }

    /// Preprocessor output, for checking exactly what got included
    pub fn preprocessed(&self) -> PathBuf {
        self.with_suffix(".ii")
    }

    pub fn executable(&self) -> PathBuf {
        self.dir.join(&self.name)
    }

    pub fn compile_database(&self) -> PathBuf {
        self.dir.join(COMPILE_DATABASE_FILE)
    }

    pub fn default_skip_list(&self) -> PathBuf {
        self.dir.join(SKIP_LIST_FILE)
    }
}

/// A compiler invocation: argument vector plus working directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Invocation {
    pub directory: PathBuf,
    pub arguments: Vec<String>,
}

impl Invocation {
    pub fn program(&self) -> Option<&str> {
        self.arguments.first().map(String::as_str)
    }

    /// Arguments after the program.
    pub fn args(&self) -> &[String] {
        self.arguments.get(1..).unwrap_or(&[])
    }

    /// Arguments after the program as a process receives them, without a
    /// shell in between. Hoisted defines keep the database's shell escaping
    /// (`-DV=\"1\"`) so [`shell_command`](Self::shell_command) stays
    /// pasteable; that escaping is undone once here.
    pub fn process_args(&self) -> Vec<String> {
        self.args().iter().map(|arg| arg.replace("\\\"", "\"")).collect()
    }

    /// `(cd "<dir>" && <arguments joined by spaces>)`, ready to paste into a shell.
    pub fn shell_command(&self) -> String {
        format!(
            "(cd \"{}\" && {})",
            self.directory.display(),
            self.arguments.join(" ")
        )
    }
}

/// Create the parent directory of `path` if needed and write `contents`.
pub fn write_text(path: &Path, contents: &str) -> Result<(), CodegenError> {
    let io_err = |source| CodegenError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    fs::write(path, contents).map_err(io_err)
}

/// Serialize records as a compile database, indented with four spaces.
pub fn compile_database_json(records: &[CompileRecord]) -> Result<String, CodegenError> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    records.serialize(&mut serializer)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}
