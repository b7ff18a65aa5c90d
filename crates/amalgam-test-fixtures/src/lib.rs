//! Test fixtures for amalgamation testing
//!
//! A [`FixtureProject`] is a throwaway C project on disk: source files, the
//! compilation database describing them, and optionally a skip list.

use serde_json::{json, Value};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A file-scope counter that collides whenever two units carrying it merge.
pub const COUNTER_SOURCE: &str = "static int counter;\n\nint bump(void) { return ++counter; }\n";

/// A throwaway project rooted in a temporary directory.
pub struct FixtureProject {
    dir: TempDir,
    entries: Vec<Value>,
}

impl FixtureProject {
    pub fn new() -> io::Result<Self> {
        Ok(Self {
            dir: TempDir::new()?,
            entries: Vec::new(),
        })
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.root().join(relative)
    }

    /// Write a file without adding it to the database (headers, includes).
    pub fn write_file(&self, relative: &str, contents: &str) -> io::Result<PathBuf> {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, contents)?;
        Ok(path)
    }

    /// Write a source file and record it in `arguments` form:
    /// `cc <flags> -o <relative>.o -c <absolute source>`.
    pub fn add_source(&mut self, relative: &str, contents: &str, flags: &[&str]) -> io::Result<&mut Self> {
        let source = self.write_file(relative, contents)?;
        let mut arguments = vec!["cc".to_string()];
        arguments.extend(flags.iter().map(|f| f.to_string()));
        arguments.extend([
            "-o".to_string(),
            format!("{}.o", relative),
            "-c".to_string(),
            source.to_string_lossy().into_owned(),
        ]);
        self.entries.push(json!({
            "directory": self.root(),
            "file": source,
            "arguments": arguments,
        }));
        Ok(self)
    }

    /// Write a source file and record it in `command` form, with the file
    /// given relative to the project root.
    pub fn add_command(&mut self, relative: &str, contents: &str, flags: &str) -> io::Result<&mut Self> {
        self.write_file(relative, contents)?;
        let command = format!("cc {} -o {}.o -c {}", flags, relative, relative);
        self.entries.push(json!({
            "directory": self.root(),
            "file": relative,
            "command": command,
        }));
        Ok(self)
    }

    /// Append an arbitrary database entry.
    pub fn add_entry(&mut self, entry: Value) -> &mut Self {
        self.entries.push(entry);
        self
    }

    /// Write `compile_commands.json` at the project root.
    pub fn write_database(&self) -> io::Result<PathBuf> {
        let path = self.path("compile_commands.json");
        let json = serde_json::to_string_pretty(&self.entries)?;
        fs::write(&path, json)?;
        Ok(path)
    }

    /// Write a skip list, one entry per line.
    pub fn write_skip_list(&self, relative: &str, entries: &[&str]) -> io::Result<PathBuf> {
        let mut contents = entries.join("\n");
        contents.push('\n');
        self.write_file(relative, &contents)
    }

    pub fn read(&self, relative: &str) -> io::Result<String> {
        fs::read_to_string(self.path(relative))
    }
}

/// Two units that each define `static int counter;`, so they collide once
/// merged. Both share `-DANS=1`; `x.c` also has `-DFOO=1`, `y.c` `-DBAR=2`.
pub fn colliding_pair() -> io::Result<FixtureProject> {
    let mut project = FixtureProject::new()?;
    project
        .add_source("x.c", COUNTER_SOURCE, &["-DANS=1", "-DFOO=1"])?
        .add_source("y.c", COUNTER_SOURCE, &["-DANS=1", "-DBAR=2"])?;
    project.write_database()?;
    Ok(project)
}
