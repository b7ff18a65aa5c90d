//! Library interface for the amalgam CLI
//!
//! Merges every translation unit of a compilation database into a single
//! C source file, renaming the file-scope identifiers that collide once
//! the units share one scope.

pub mod compiler;
pub mod config;
pub mod orchestrator;
pub mod resolver;

pub use compiler::{Compiler, CompilerError, CompilerOutput, ProcessCompiler};
pub use config::{AmalgamateConfig, ConfigFile};
pub use orchestrator::{AmalgamationReport, Orchestrator, ReportedCommands};
pub use resolver::{Collision, ConflictResolver, Resolution, ResolveError};
