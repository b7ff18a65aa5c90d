//! Core data model for amalgamating C translation units

pub mod compile_db;
pub mod defines;
pub mod error;
pub mod naming;
pub mod paths;
pub mod renaming;
pub mod skip_set;
pub mod unit;

pub use compile_db::CompileRecord;
pub use defines::CommonDefineSet;
pub use error::CoreError;
pub use renaming::RenamingTable;
pub use skip_set::SkipSet;
pub use unit::{DefineFlag, NormalizedUnit};
