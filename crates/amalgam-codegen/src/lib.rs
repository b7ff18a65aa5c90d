//! Synthesis of the amalgamated translation unit
//!
//! [`synthesis::Synthesizer`] turns normalized units into one C source file
//! plus the compiler invocation that builds it. [`artifacts`] owns where
//! those land on disk and how they are written.

pub mod artifacts;
pub mod error;
pub mod synthesis;

pub use artifacts::{ArtifactPaths, Invocation};
pub use error::CodegenError;
pub use synthesis::{AmalgamatedUnit, Amalgamation, Synthesizer};
