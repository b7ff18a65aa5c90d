//! Compiler command line normalization.
//!
//! Compile databases of this kind come from a small number of generators
//! that all spell a per-file invocation the same way:
//!
//! ```text
//! <compiler> <flags...> -o <output> -c <input>
//! ```
//!
//! The flags are recovered by removing a fixed prefix and suffix. The shape
//! is described by [`InvocationConvention`] and checked token by token, so a
//! database from an unexpected generator fails loudly instead of being
//! sliced at the wrong place.

use crate::ParserError;
use amalgam_core::unit::DEFINE_PREFIX;
use amalgam_core::{CompileRecord, NormalizedUnit};
use indexmap::IndexSet;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Expected shape of one token at a fixed position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenShape {
    /// Any token, e.g. the compiler path or a file name
    Any(&'static str),
    /// Exactly this token
    Literal(&'static str),
}

impl TokenShape {
    fn matches(&self, token: &str) -> bool {
        match self {
            TokenShape::Any(_) => true,
            TokenShape::Literal(expected) => token == *expected,
        }
    }
}

impl fmt::Display for TokenShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenShape::Any(name) => write!(f, "<{}>", name),
            TokenShape::Literal(token) => write!(f, "{}", token),
        }
    }
}

/// Fixed prefix and suffix around the flags of an invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationConvention {
    pub prefix: Vec<TokenShape>,
    pub suffix: Vec<TokenShape>,
}

impl Default for InvocationConvention {
    /// `cc <flags> -o <output> -c <input>`
    fn default() -> Self {
        Self {
            prefix: vec![TokenShape::Any("compiler")],
            suffix: vec![
                TokenShape::Literal("-o"),
                TokenShape::Any("output"),
                TokenShape::Literal("-c"),
                TokenShape::Any("input"),
            ],
        }
    }
}

impl InvocationConvention {
    pub fn min_tokens(&self) -> usize {
        self.prefix.len() + self.suffix.len()
    }

    /// Return the flag tokens between prefix and suffix.
    pub fn flags<'a>(&self, file: &Path, tokens: &'a [String]) -> Result<&'a [String], ParserError> {
        let shape_error = |reason: String| ParserError::InvocationShape {
            file: file.to_path_buf(),
            reason,
        };

        if tokens.len() < self.min_tokens() {
            return Err(shape_error(format!(
                "expected at least {} tokens ({}), found {}",
                self.min_tokens(),
                self,
                tokens.len()
            )));
        }

        let suffix_start = tokens.len() - self.suffix.len();
        let positioned = self
            .prefix
            .iter()
            .zip(&tokens[..self.prefix.len()])
            .chain(self.suffix.iter().zip(&tokens[suffix_start..]));

        for (shape, token) in positioned {
            if !shape.matches(token) {
                return Err(shape_error(format!(
                    "expected `{}` but found `{}` (convention: {})",
                    shape, token, self
                )));
            }
        }

        Ok(&tokens[self.prefix.len()..suffix_start])
    }
}

impl fmt::Display for InvocationConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix: Vec<String> = self.prefix.iter().map(ToString::to_string).collect();
        let suffix: Vec<String> = self.suffix.iter().map(ToString::to_string).collect();
        write!(f, "{} <flags...> {}", prefix.join(" "), suffix.join(" "))
    }
}

/// Turns compile records into [`NormalizedUnit`]s.
#[derive(Debug, Clone)]
pub struct InvocationNormalizer {
    project_root: PathBuf,
    convention: InvocationConvention,
    denied_flags: IndexSet<String>,
}

impl InvocationNormalizer {
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            convention: InvocationConvention::default(),
            denied_flags: IndexSet::new(),
        }
    }

    pub fn with_convention(mut self, convention: InvocationConvention) -> Self {
        self.convention = convention;
        self
    }

    /// Flags the target compiler does not understand. They are dropped
    /// from every unit before anything else looks at them.
    pub fn with_denied_flags<I, S>(mut self, flags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.denied_flags.extend(flags.into_iter().map(Into::into));
        self
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// The invocation as tokens. A `command` string is split on whitespace.
    pub fn tokens(record: &CompileRecord) -> Vec<String> {
        match (&record.arguments, &record.command) {
            (Some(arguments), _) if !arguments.is_empty() => arguments.clone(),
            (_, Some(command)) => command.split_whitespace().map(str::to_string).collect(),
            _ => Vec::new(),
        }
    }

    pub fn normalize(&self, record: &CompileRecord) -> Result<NormalizedUnit, ParserError> {
        let source = record.source_path();
        let tokens = Self::tokens(record);
        let raw_flags = self.convention.flags(&source, &tokens)?;

        let flags = join_split_defines(&source, raw_flags)?
            .into_iter()
            .filter(|flag| {
                let denied = self.denied_flags.contains(flag);
                if denied {
                    trace!("Dropping denied flag {} for {}", flag, source.display());
                }
                !denied
            })
            .collect();

        let relative_path = record.relative_source_path(&self.project_root);
        Ok(NormalizedUnit::new(source, relative_path, flags)?)
    }

    /// Normalize every record. The first failure aborts: later stages
    /// assume every unit was normalized.
    pub fn normalize_all(&self, records: &[CompileRecord]) -> Result<Vec<NormalizedUnit>, ParserError> {
        let units = records
            .iter()
            .map(|record| self.normalize(record))
            .collect::<Result<Vec<_>, _>>()?;
        debug!("Normalized {} units", units.len());
        Ok(units)
    }
}

/// Merge `-D NAME=VALUE` written as two tokens into `-DNAME=VALUE`.
fn join_split_defines(file: &Path, flags: &[String]) -> Result<Vec<String>, ParserError> {
    let mut joined = Vec::with_capacity(flags.len());
    let mut iter = flags.iter();
    while let Some(flag) = iter.next() {
        if flag == DEFINE_PREFIX {
            let definition = iter.next().ok_or_else(|| ParserError::InvocationShape {
                file: file.to_path_buf(),
                reason: format!("`{}` without a macro definition", DEFINE_PREFIX),
            })?;
            joined.push(format!("{}{}", DEFINE_PREFIX, definition));
        } else {
            joined.push(flag.clone());
        }
    }
    Ok(joined)
}
