//! Amalgamated unit synthesis.
//!
//! Each retained unit becomes one block:
//!
//! ```c
//! #define LOCAL_MACRO value        // defines not shared by every unit
//! #define counter src_a_c__counter // renamings for this file
//! #include "src/a.c"
//! #undef counter                   // everything above, in reverse
//! #undef LOCAL_MACRO
//! ```
//!
//! Synthesis is a pure function of its inputs. Every stage rebuilds the
//! whole unit from scratch.

use crate::artifacts::{self, ArtifactPaths, Invocation};
use crate::CodegenError;
use amalgam_core::{CommonDefineSet, CompileRecord, NormalizedUnit, RenamingTable, SkipSet};
use indexmap::IndexSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Platform macros that have to be in effect the first time these headers
/// are seen, before any unit can include them without `_GNU_SOURCE`.
pub const BOOTSTRAP_LINES: &[&str] = &[
    "#define _GNU_SOURCE",
    "#include <pthread.h>",
    "#include <sched.h>",
    "#undef _GNU_SOURCE",
];

/// Added to the amalgamated invocation. Units may name warnings the
/// merging compiler does not know.
pub const PORTABILITY_FLAGS: &[&str] = &["-Wno-unknown-warning-option"];

/// Units compiled with this macro defined are test variants of another unit.
pub const DEFAULT_UNIT_TEST_MARKER: &str = "UNIT_TEST";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncludeBlock {
    /// `None` for the bootstrap block
    pub relative_path: Option<String>,
    pub lines: Vec<String>,
}

impl IncludeBlock {
    fn bootstrap() -> Self {
        Self {
            relative_path: None,
            lines: BOOTSTRAP_LINES.iter().map(|l| l.to_string()).collect(),
        }
    }

    fn for_unit(unit: &NormalizedUnit, common: &CommonDefineSet, renamings: &RenamingTable) -> Self {
        let mut lines = Vec::new();
        let mut defined = Vec::new();

        for define in common.local_defines(unit) {
            lines.push(define.define_directive());
            defined.push(define.macro_name().to_string());
        }
        for renaming in renamings.renamings_for(&unit.relative_path, &unit.path_identifier) {
            lines.push(format!("#define {} {}", renaming.identifier, renaming.alias));
            defined.push(renaming.identifier.to_string());
        }

        lines.push(format!("#include \"{}\"", unit.relative_path));
        lines.extend(defined.iter().rev().map(|name| format!("#undef {}", name)));

        Self {
            relative_path: Some(unit.relative_path.clone()),
            lines,
        }
    }

    pub fn render(&self) -> String {
        self.lines.join("\n")
    }
}

/// The synthesized source: bootstrap block, then one block per unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmalgamatedUnit {
    pub blocks: Vec<IncludeBlock>,
}

impl AmalgamatedUnit {
    pub fn render(&self) -> String {
        let mut text = self
            .blocks
            .iter()
            .map(IncludeBlock::render)
            .collect::<Vec<_>>()
            .join("\n\n");
        text.push('\n');
        text
    }

    pub fn block_for(&self, relative_path: &str) -> Option<&IncludeBlock> {
        self.blocks
            .iter()
            .find(|b| b.relative_path.as_deref() == Some(relative_path))
    }

    pub fn included_files(&self) -> impl Iterator<Item = &str> {
        self.blocks.iter().filter_map(|b| b.relative_path.as_deref())
    }
}

/// How many units each filter removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SynthesisStats {
    pub retained: usize,
    pub skipped: usize,
    pub unit_test_variants: usize,
}

/// One stage's output: the unit and everything needed to compile it.
#[derive(Debug, Clone)]
pub struct Amalgamation {
    pub unit: AmalgamatedUnit,
    pub global_flags: Vec<String>,
    pub stats: SynthesisStats,
    compiler: String,
    project_root: PathBuf,
    paths: ArtifactPaths,
}

impl Amalgamation {
    pub fn source_text(&self) -> String {
        self.unit.render()
    }

    pub fn paths(&self) -> &ArtifactPaths {
        &self.paths
    }

    fn invocation<I>(&self, extra_flags: &[String], tail: I) -> Invocation
    where
        I: IntoIterator<Item = String>,
    {
        let arguments = std::iter::once(self.compiler.clone())
            .chain(self.global_flags.iter().cloned())
            .chain(extra_flags.iter().cloned())
            .chain(tail)
            .collect();
        Invocation {
            directory: self.project_root.clone(),
            arguments,
        }
    }

    fn display(path: &Path) -> String {
        path.display().to_string()
    }

    /// `cc <flags> -o N.o -c N.c`
    pub fn compile_invocation(&self) -> Invocation {
        self.compile_invocation_with(&[])
    }

    /// The compile-only invocation with `extra_flags` placed after the
    /// global flags, e.g. to request machine-readable diagnostics.
    pub fn compile_invocation_with(&self, extra_flags: &[String]) -> Invocation {
        self.invocation(
            extra_flags,
            [
                "-o".to_string(),
                Self::display(&self.paths.object()),
                "-c".to_string(),
                Self::display(&self.paths.source()),
            ],
        )
    }

    /// `cc <flags> -o N.ii -E N.c`
    pub fn preprocess_invocation(&self) -> Invocation {
        self.invocation(
            &[],
            [
                "-o".to_string(),
                Self::display(&self.paths.preprocessed()),
                "-E".to_string(),
                Self::display(&self.paths.source()),
            ],
        )
    }

    /// `cc <flags> -o N N.c <link args>`
    pub fn link_invocation(&self, link_args: &[String]) -> Invocation {
        let tail = [
            "-o".to_string(),
            Self::display(&self.paths.executable()),
            Self::display(&self.paths.source()),
        ];
        self.invocation(&[], tail.into_iter().chain(link_args.iter().cloned()))
    }

    /// The compile database entry describing how to build the unit.
    pub fn compile_record(&self) -> CompileRecord {
        CompileRecord::with_arguments(
            self.project_root.clone(),
            self.paths.source(),
            self.compile_invocation().arguments,
        )
        .with_output(self.paths.object())
    }

    /// Overwrite the source file and the one-entry compile database.
    pub fn write(&self) -> Result<(), CodegenError> {
        let source = self.paths.source();
        artifacts::write_text(&source, &self.source_text())?;

        let database = self.paths.compile_database();
        let json = artifacts::compile_database_json(&[self.compile_record()])?;
        artifacts::write_text(&database, &json)?;

        debug!("Wrote {} and {}", source.display(), database.display());
        Ok(())
    }
}

/// Builds [`Amalgamation`]s for one project and artifact name.
#[derive(Debug, Clone)]
pub struct Synthesizer {
    project_root: PathBuf,
    compiler: String,
    paths: ArtifactPaths,
    unit_test_marker: String,
}

impl Synthesizer {
    pub fn new(project_root: impl Into<PathBuf>, compiler: impl Into<String>, paths: ArtifactPaths) -> Self {
        Self {
            project_root: project_root.into(),
            compiler: compiler.into(),
            paths,
            unit_test_marker: DEFAULT_UNIT_TEST_MARKER.to_string(),
        }
    }

    pub fn with_unit_test_marker(mut self, marker: impl Into<String>) -> Self {
        self.unit_test_marker = marker.into();
        self
    }

    pub fn paths(&self) -> &ArtifactPaths {
        &self.paths
    }

    pub fn synthesize(
        &self,
        units: &[NormalizedUnit],
        common: &CommonDefineSet,
        skip: &SkipSet,
        renamings: &RenamingTable,
    ) -> Amalgamation {
        let mut stats = SynthesisStats::default();
        let mut retained = Vec::with_capacity(units.len());

        for unit in units {
            if unit.defines_macro(&self.unit_test_marker) {
                debug!("Excluding unit-test variant {}", unit.relative_path);
                stats.unit_test_variants += 1;
            } else if skip.contains(&unit.relative_path) {
                debug!("Skipping {}", unit.relative_path);
                stats.skipped += 1;
            } else {
                retained.push(unit);
            }
        }
        stats.retained = retained.len();

        for file in renamings.files() {
            if !retained.iter().any(|u| u.relative_path == file) {
                warn!(
                    "Collisions reported in {} cannot be renamed: it is not an amalgamated unit",
                    file
                );
            }
        }

        let mut blocks = Vec::with_capacity(retained.len() + 1);
        blocks.push(IncludeBlock::bootstrap());
        blocks.extend(
            retained
                .iter()
                .map(|unit| IncludeBlock::for_unit(unit, common, renamings)),
        );

        let global_flags = self.global_flags(&retained, common);

        info!(
            "Synthesized {} units ({} skipped, {} unit-test variants excluded, {} hoisted defines, {} renamings)",
            stats.retained,
            stats.skipped,
            stats.unit_test_variants,
            common.len(),
            renamings.identifier_count()
        );

        Amalgamation {
            unit: AmalgamatedUnit { blocks },
            global_flags,
            stats,
            compiler: self.compiler.clone(),
            project_root: self.project_root.clone(),
            paths: self.paths.clone(),
        }
    }

    /// Retained units' non-define flags (first seen wins), then the
    /// hoisted defines, then our own flags.
    fn global_flags(&self, retained: &[&NormalizedUnit], common: &CommonDefineSet) -> Vec<String> {
        let mut flags: IndexSet<String> = retained
            .iter()
            .flat_map(|unit| unit.non_define_flags.iter().cloned())
            .collect();
        flags.extend(common.iter().map(str::to_string));
        flags.extend(PORTABILITY_FLAGS.iter().map(|f| f.to_string()));
        flags.insert(format!("-I{}", self.project_root.display()));
        flags.into_iter().collect()
    }
}
