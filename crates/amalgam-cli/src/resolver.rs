//! Diagnostic-driven conflict resolution.
//!
//! Separate compilation keeps file-scope names, typedefs and tags private
//! to their translation unit. Once units are merged, two files using the
//! same spelling collide. Which names collide depends on the compiler's own
//! symbol table, so the compiler is asked: the amalgamated unit is compiled
//! with machine-readable diagnostics and every redefinition/redeclaration is
//! turned into a per-file renaming.

use crate::compiler::{Compiler, CompilerError};
use amalgam_codegen::Amalgamation;
use amalgam_core::{paths, RenamingTable};
use amalgam_parser::diagnostics::{Diagnostic, DiagnosticGrammar, DiagnosticStreamParser};
use amalgam_parser::{Parser, ParserError};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Flags that make the compiler emit the diagnostic format we parse.
pub const DIAGNOSTIC_FLAGS: &[&str] = &["-fdiagnostics-format=json"];

#[derive(Error, Debug)]
pub enum ResolveError {
    #[error(transparent)]
    Compiler(#[from] CompilerError),

    #[error(transparent)]
    Diagnostics(#[from] ParserError),
}

/// One reported name collision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collision {
    /// Unit path relative to the project root
    pub file: String,
    pub identifier: String,
    pub line: u32,
    pub column: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    pub renamings: RenamingTable,
    pub collisions: Vec<Collision>,
    /// Top-level diagnostics that were not collisions
    pub ignored: usize,
    pub compiler_succeeded: bool,
}

impl Resolution {
    pub fn has_collisions(&self) -> bool {
        !self.collisions.is_empty()
    }
}

pub struct ConflictResolver<C, G> {
    compiler: C,
    grammar: G,
    project_root: PathBuf,
}

impl<C: Compiler, G: DiagnosticGrammar> ConflictResolver<C, G> {
    pub fn new(compiler: C, grammar: G, project_root: impl Into<PathBuf>) -> Self {
        Self {
            compiler,
            grammar,
            project_root: project_root.into(),
        }
    }

    pub fn compiler(&self) -> &C {
        &self.compiler
    }

    /// Compile `amalgamation` and derive the renamings its diagnostics call for.
    ///
    /// A failing compile is expected here; only a compiler that cannot be
    /// launched or a stream that is not structured diagnostics is an error.
    pub fn resolve(&self, amalgamation: &Amalgamation) -> Result<Resolution, ResolveError> {
        let extra: Vec<String> = DIAGNOSTIC_FLAGS.iter().map(|f| f.to_string()).collect();
        let invocation = amalgamation.compile_invocation_with(&extra);
        let output = self.compiler.run(&invocation)?;

        let diagnostics = DiagnosticStreamParser::new().parse(&output.diagnostics)?;
        let mut resolution = self.extract(&diagnostics);
        resolution.compiler_succeeded = output.success;

        info!(
            "Found {} collisions across {} files ({} other diagnostics ignored)",
            resolution.collisions.len(),
            resolution.renamings.file_count(),
            resolution.ignored
        );
        if resolution.ignored > 0 {
            warn!(
                "{} diagnostics are not name collisions and were not resolved; add failing units to the skip list",
                resolution.ignored
            );
        }
        Ok(resolution)
    }

    /// Build the renaming table from parsed diagnostics.
    pub fn extract(&self, diagnostics: &[Diagnostic]) -> Resolution {
        let mut resolution = Resolution::default();

        for diagnostic in diagnostics {
            let mut matched = false;
            for candidate in diagnostic.flatten() {
                let Some(identifier) = self.grammar.collision_identifier(&candidate.message) else {
                    continue;
                };
                let Some(caret) = candidate.caret() else {
                    warn!("Collision on `{}` has no source location", identifier);
                    continue;
                };

                let file = self.unit_path(&caret.file);
                debug!(
                    "{}:{}:{}: collision on `{}`",
                    file, caret.line, caret.column, identifier
                );
                resolution.renamings.insert(file.clone(), identifier.clone());
                resolution.collisions.push(Collision {
                    file,
                    identifier,
                    line: caret.line,
                    column: caret.column,
                });
                matched = true;
            }

            if !matched {
                debug!("Ignoring {} diagnostic: {}", diagnostic.kind, diagnostic.message);
                resolution.ignored += 1;
            }
        }

        resolution
    }

    /// Diagnostic paths are relative to the compiler's working directory
    /// (the project root) or absolute.
    fn unit_path(&self, file: &Path) -> String {
        let absolute = paths::resolve(file, &self.project_root);
        paths::to_slash(&paths::relative_to(&absolute, &self.project_root))
    }
}
