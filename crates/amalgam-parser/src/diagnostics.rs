//! Machine-readable compiler diagnostics.
//!
//! The stream is the JSON array GCC writes to stderr under
//! `-fdiagnostics-format=json`:
//!
//! ```json
//! [{"kind": "error",
//!   "message": "redefinition of 'counter'",
//!   "locations": [{"caret": {"file": "b.c", "line": 1, "column": 12}}],
//!   "children": [{"kind": "note", "message": "previous definition of 'counter' was here", ...}]}]
//! ```
//!
//! Recognizing a name collision in a message is a separate concern behind
//! [`DiagnosticGrammar`], so a compiler with different phrasing only needs a
//! new grammar.

use crate::{Parser, ParserError};
use regex::Regex;
use serde::Deserialize;
use std::path::PathBuf;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Diagnostic {
    #[serde(default)]
    pub kind: String,
    pub message: String,
    #[serde(default)]
    pub locations: Vec<DiagnosticLocation>,
    #[serde(default)]
    pub children: Vec<Diagnostic>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DiagnosticLocation {
    #[serde(default)]
    pub caret: Option<SourcePosition>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SourcePosition {
    pub file: PathBuf,
    #[serde(default)]
    pub line: u32,
    #[serde(default)]
    pub column: u32,
}

impl Diagnostic {
    /// The caret of the first location that has one.
    pub fn caret(&self) -> Option<&SourcePosition> {
        self.locations.iter().find_map(|l| l.caret.as_ref())
    }

    /// This diagnostic followed by all nested children, depth first.
    pub fn flatten(&self) -> Vec<&Diagnostic> {
        let mut out = vec![self];
        for child in &self.children {
            out.extend(child.flatten());
        }
        out
    }
}

/// Parses a raw diagnostic stream into records.
#[derive(Debug, Default, Clone)]
pub struct DiagnosticStreamParser;

impl DiagnosticStreamParser {
    pub fn new() -> Self {
        Self
    }
}

impl Parser for DiagnosticStreamParser {
    type Output = Vec<Diagnostic>;

    /// An empty stream means no diagnostics. Anything else must start with
    /// a JSON array of records; plain text after it (`compilation
    /// terminated.`, `cc1: all warnings being treated as errors`) is logged
    /// and dropped.
    fn parse(&self, input: &str) -> Result<Self::Output, ParserError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Ok(Vec::new());
        }
        let invalid = |e: serde_json::Error| {
            let preview: String = trimmed.chars().take(120).collect();
            ParserError::DiagnosticParse(format!("{} (stream starts with: {:?})", e, preview))
        };

        let mut stream = serde_json::Deserializer::from_str(trimmed).into_iter::<Vec<Diagnostic>>();
        let diagnostics = match stream.next() {
            Some(records) => records.map_err(invalid)?,
            None => return Ok(Vec::new()),
        };

        let trailer = trimmed[stream.byte_offset()..].trim();
        if !trailer.is_empty() {
            debug!("Ignoring non-JSON diagnostic trailer: {:?}", trailer);
        }
        Ok(diagnostics)
    }
}

/// Recognizes the identifier a "this name is already taken" diagnostic is
/// about.
pub trait DiagnosticGrammar {
    /// The bare identifier if `message` reports a redefinition or
    /// redeclaration, with any `struct`/`union`/`enum` tag keyword removed.
    fn collision_identifier(&self, message: &str) -> Option<String>;
}

/// GCC and Clang phrasing:
///
/// ```text
/// message    := ("redefinition" | "redeclaration") " of " [qualifier " "] quoted
/// qualifier  := "typedef" | "enumerator"
/// quoted     := quote [tag " "] identifier quote
/// tag        := "struct" | "union" | "enum"
/// quote      := "'" | "‘" | "’" | "\"" | "`"
/// ```
///
/// Anything after the closing quote (`with no linkage`, `with different
/// type`, ...) is ignored.
#[derive(Debug, Clone)]
pub struct GccRedefinitionGrammar {
    pattern: Regex,
}

impl GccRedefinitionGrammar {
    pub const PATTERN: &'static str = concat!(
        r#"^(?:redefinition|redeclaration) of (?:(?:typedef|enumerator) )?"#,
        r#"['‘’"`](?:(?:struct|union|enum)\s+)?([A-Za-z_][A-Za-z0-9_]*)['‘’"`]"#,
    );

    pub fn new() -> Result<Self, ParserError> {
        Self::with_pattern(Self::PATTERN)
    }

    /// Use a custom pattern. Capture group 1 must be the bare identifier.
    pub fn with_pattern(pattern: &str) -> Result<Self, ParserError> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
        })
    }
}

impl DiagnosticGrammar for GccRedefinitionGrammar {
    fn collision_identifier(&self, message: &str) -> Option<String> {
        self.pattern
            .captures(message.trim())
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const STREAM: &str = r#"[
        {"kind": "error", "message": "redefinition of 'counter'",
         "locations": [{"caret": {"file": "b.c", "line": 1, "column": 12},
                        "finish": {"file": "b.c", "line": 1, "column": 18}}],
         "children": [{"kind": "note", "message": "previous definition of 'counter' was here",
                       "locations": [{"caret": {"file": "a.c", "line": 1, "column": 12}}]}],
         "option": "", "column-origin": 1},
        {"kind": "warning", "message": "unused variable 'x'", "locations": []}
    ]"#;

    #[test]
    fn test_parse_gcc_stream() -> Result<(), ParserError> {
        let diagnostics = DiagnosticStreamParser::new().parse(STREAM)?;

        assert_eq!(diagnostics.len(), 2);
        let first = &diagnostics[0];
        assert_eq!(first.kind, "error");
        let caret = first.caret().ok_or_else(|| ParserError::DiagnosticParse("no caret".into()))?;
        assert_eq!(caret.file, PathBuf::from("b.c"));
        assert_eq!((caret.line, caret.column), (1, 12));
        assert_eq!(first.flatten().len(), 2);
        assert!(diagnostics[1].caret().is_none());
        Ok(())
    }

    #[test]
    fn test_empty_stream() -> Result<(), ParserError> {
        assert!(DiagnosticStreamParser::new().parse("")?.is_empty());
        assert!(DiagnosticStreamParser::new().parse("  \n")?.is_empty());
        assert!(DiagnosticStreamParser::new().parse("[]")?.is_empty());
        Ok(())
    }

    #[test]
    fn test_non_json_stream_is_error() {
        let err = DiagnosticStreamParser::new()
            .parse("x.c:1:1: error: redefinition of 'y'")
            .unwrap_err();
        assert!(matches!(err, ParserError::DiagnosticParse(_)));
    }

    #[test]
    fn test_plain_text_trailer_is_dropped() -> Result<(), ParserError> {
        let trailers = [
            "compilation terminated.",
            "cc1: all warnings being treated as errors",
        ];
        for trailer in trailers {
            let stream = format!("{}\n{}\n", STREAM, trailer);
            let diagnostics = DiagnosticStreamParser::new().parse(&stream)?;
            assert_eq!(diagnostics.len(), 2, "trailer: {}", trailer);
            assert_eq!(diagnostics[0].message, "redefinition of 'counter'");
        }
        Ok(())
    }

    #[test]
    fn test_text_before_array_is_error() {
        let stream = format!("compilation terminated.\n{}", STREAM);
        let err = DiagnosticStreamParser::new().parse(&stream).unwrap_err();
        assert!(matches!(err, ParserError::DiagnosticParse(_)));
    }

    #[test]
    fn test_grammar_matches_collisions() -> Result<(), ParserError> {
        let grammar = GccRedefinitionGrammar::new()?;
        let cases = [
            ("redefinition of 'counter'", Some("counter")),
            ("redefinition of ‘counter’", Some("counter")),
            ("redeclaration of 'x' with no linkage", Some("x")),
            ("redefinition of 'struct node'", Some("node")),
            ("redefinition of ‘union value’", Some("value")),
            ("redefinition of 'enum color'", Some("color")),
            ("redefinition of typedef 'size_type'", Some("size_type")),
            ("redeclaration of enumerator 'RED'", Some("RED")),
            ("conflicting types for 'f'", None),
            ("unused variable 'x'", None),
            ("note: previous definition of 'counter' was here", None),
            ("redefinition of 'operator+'", None),
        ];

        for (message, expected) in cases {
            assert_eq!(
                grammar.collision_identifier(message).as_deref(),
                expected,
                "message: {}",
                message
            );
        }
        Ok(())
    }

    #[test]
    fn test_custom_pattern() -> Result<(), ParserError> {
        let grammar = GccRedefinitionGrammar::with_pattern(r"^duplicate symbol (\w+)$")?;
        assert_eq!(grammar.collision_identifier("duplicate symbol foo").as_deref(), Some("foo"));
        assert!(GccRedefinitionGrammar::with_pattern("(").is_err());
        Ok(())
    }
}
