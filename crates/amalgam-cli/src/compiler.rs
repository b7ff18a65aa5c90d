//! The compiler as an external process.
//!
//! The engine only ever needs one thing from the compiler: run an
//! invocation to completion and hand back its diagnostic stream (stderr).
//! [`Compiler`] is that seam, so tests can substitute an in-process fake.

use amalgam_codegen::Invocation;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum CompilerError {
    #[error("Compiler `{program}` not found: {source}")]
    NotFound {
        program: String,
        #[source]
        source: which::Error,
    },

    #[error("Failed to launch `{program}`: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Empty compiler invocation")]
    EmptyInvocation,
}

/// What a finished compiler run left behind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompilerOutput {
    /// Exit code, `None` if terminated by a signal
    pub exit_code: Option<i32>,
    pub success: bool,
    /// Raw stderr, where machine-readable diagnostics are written
    pub diagnostics: String,
}

pub trait Compiler {
    /// Run `invocation` to completion. A non-zero exit is not an error.
    fn run(&self, invocation: &Invocation) -> Result<CompilerOutput, CompilerError>;
}

impl<C: Compiler + ?Sized> Compiler for &C {
    fn run(&self, invocation: &Invocation) -> Result<CompilerOutput, CompilerError> {
        (**self).run(invocation)
    }
}

/// Runs the real compiler as a subprocess.
///
/// There is no timeout: a hung compiler has to be interrupted by the
/// operator.
#[derive(Debug, Default, Clone)]
pub struct ProcessCompiler;

impl ProcessCompiler {
    pub fn new() -> Self {
        Self
    }

    /// Resolve a program name (or path) to an executable.
    pub fn resolve(program: &str) -> Result<PathBuf, CompilerError> {
        which::which(program).map_err(|source| CompilerError::NotFound {
            program: program.to_string(),
            source,
        })
    }
}

impl Compiler for ProcessCompiler {
    fn run(&self, invocation: &Invocation) -> Result<CompilerOutput, CompilerError> {
        let program = invocation.program().ok_or(CompilerError::EmptyInvocation)?;
        let executable = Self::resolve(program)?;

        info!("Running {}", invocation.shell_command());
        debug!("Resolved compiler {} to {}", program, executable.display());

        let output = Command::new(&executable)
            .args(invocation.process_args())
            .current_dir(&invocation.directory)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .output()
            .map_err(|source| CompilerError::Launch {
                program: program.to_string(),
                source,
            })?;

        let result = CompilerOutput {
            exit_code: output.status.code(),
            success: output.status.success(),
            diagnostics: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        debug!(
            "Compiler exited with {:?}, {} bytes of diagnostics",
            result.exit_code,
            result.diagnostics.len()
        );
        Ok(result)
    }
}
