//! The operator-curated list of units to leave out of the amalgamation.
//!
//! The file is newline separated and may hold any spelling of a path
//! (absolute, `./`-prefixed, relative). It is rewritten on every run with
//! each entry canonicalized relative to the project root and duplicates
//! removed, keeping first-seen order. The engine never adds entries.

use crate::error::CoreError;
use crate::paths;
use indexmap::IndexSet;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SkipSet {
    paths: IndexSet<String>,
}

impl SkipSet {
    /// Parse skip list contents. Blank lines are ignored.
    pub fn parse(contents: &str, project_root: &Path) -> Self {
        contents
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| Self::canonical_entry(line, project_root))
            .collect()
    }

    /// Load a skip list. A missing file is an empty set.
    pub fn load(path: &Path, project_root: &Path) -> Result<Self, CoreError> {
        match fs::read_to_string(path) {
            Ok(contents) => Ok(Self::parse(&contents, project_root)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No skip list at {}, starting empty", path.display());
                Ok(Self::default())
            }
            Err(source) => Err(CoreError::SkipListRead {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Overwrite `path` with the normalized list.
    pub fn save(&self, path: &Path) -> Result<(), CoreError> {
        let write_err = |source| CoreError::SkipListWrite {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        fs::write(path, self.to_file_contents()).map_err(write_err)
    }

    pub fn to_file_contents(&self) -> String {
        let mut contents = self.paths.iter().cloned().collect::<Vec<_>>().join("\n");
        if !contents.is_empty() {
            contents.push('\n');
        }
        contents
    }

    /// Canonical spelling of a skip list entry: relative to the project
    /// root, lexically normalized, `/`-separated.
    pub fn canonical_entry(entry: &str, project_root: &Path) -> String {
        paths::to_slash(&paths::relative_to(Path::new(entry), project_root))
    }

    pub fn contains(&self, relative_path: &str) -> bool {
        self.paths.contains(relative_path)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.paths.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

impl FromIterator<String> for SkipSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self {
            paths: iter.into_iter().collect(),
        }
    }
}
