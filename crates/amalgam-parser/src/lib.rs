//! Parsers for the inputs of the amalgamation engine
//!
//! - [`compile_commands`]: JSON compilation databases
//! - [`invocation`]: per-file compiler command lines
//! - [`diagnostics`]: machine-readable compiler diagnostics

pub mod compile_commands;
pub mod diagnostics;
pub mod error;
pub mod invocation;

pub use compile_commands::CompileDatabaseLoader;
pub use diagnostics::{DiagnosticGrammar, DiagnosticStreamParser, GccRedefinitionGrammar};
pub use error::ParserError;
pub use invocation::{InvocationConvention, InvocationNormalizer};

/// Common trait for the text parsers in this crate
pub trait Parser {
    type Output;

    fn parse(&self, input: &str) -> Result<Self::Output, ParserError>;
}
