//! An in-process stand-in for the C compiler.
//!
//! It understands just enough preprocessing to exercise the two-stage
//! pipeline: object-like `#define`/`#undef`, `-D` flags, quoted `#include`
//! and `#error`. Every `static int NAME;` declares `NAME` after macro
//! expansion; a second declaration of the same name is reported as a
//! redefinition in the JSON diagnostic format.

#![allow(dead_code)]

use amalgam::{Compiler, CompilerError, CompilerOutput};
use amalgam_codegen::Invocation;
use regex::Regex;
use serde_json::{json, Value};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

pub struct MockCompiler {
    invocations: RefCell<Vec<Invocation>>,
    canned_stderr: Option<String>,
    declaration: Regex,
}

impl MockCompiler {
    pub fn new() -> Self {
        Self {
            invocations: RefCell::new(Vec::new()),
            canned_stderr: None,
            declaration: Regex::new(r"^\s*static\s+int\s+([A-Za-z_][A-Za-z0-9_]*)\s*;").unwrap(),
        }
    }

    /// Ignore the source and write `stderr` as the diagnostic stream.
    pub fn with_stderr(stderr: &str) -> Self {
        Self {
            canned_stderr: Some(stderr.to_string()),
            ..Self::new()
        }
    }

    pub fn invocations(&self) -> Vec<Invocation> {
        self.invocations.borrow().clone()
    }

    fn compile(&self, invocation: &Invocation) -> Vec<Value> {
        let mut state = State::default();
        for arg in invocation.args() {
            if let Some(definition) = arg.strip_prefix("-D") {
                let (name, value) = definition.split_once('=').unwrap_or((definition, "1"));
                state.macros.insert(name.to_string(), value.to_string());
            }
        }

        let args = invocation.args();
        let source = args
            .iter()
            .position(|a| a == "-c")
            .and_then(|i| args.get(i + 1))
            .expect("compile invocation without -c");
        let text = fs::read_to_string(invocation.directory.join(source)).unwrap();
        self.preprocess(&text, &invocation.directory, &mut state);
        state.diagnostics
    }

    fn preprocess(&self, text: &str, dir: &Path, state: &mut State) {
        for line in text.lines() {
            let line = line.trim();
            if let Some(rest) = line.strip_prefix("#define ") {
                let (name, value) = rest.split_once(' ').unwrap_or((rest, ""));
                state.macros.insert(name.to_string(), value.to_string());
            } else if let Some(name) = line.strip_prefix("#undef ") {
                state.macros.remove(name.trim());
            } else if let Some(quoted) = line.strip_prefix("#include \"") {
                let path = dir.join(quoted.trim_end_matches('"'));
                let included = fs::read_to_string(&path).unwrap();
                self.scan_unit(&included, &path.to_string_lossy(), state);
            }
        }
    }

    fn scan_unit(&self, text: &str, file: &str, state: &mut State) {
        for (index, line) in text.lines().enumerate() {
            if let Some(message) = line.trim().strip_prefix("#error") {
                state.diagnostics.push(json!({
                    "kind": "error",
                    "message": format!("#error{}", message),
                    "locations": [{"caret": {"file": file, "line": index + 1, "column": 2}}],
                }));
                continue;
            }
            let Some(captures) = self.declaration.captures(line) else {
                continue;
            };
            let Some(spelled) = captures.get(1) else {
                continue;
            };
            let name = state
                .macros
                .get(spelled.as_str())
                .cloned()
                .unwrap_or_else(|| spelled.as_str().to_string());
            if !state.declared.insert(name.clone()) {
                state.diagnostics.push(json!({
                    "kind": "error",
                    "message": format!("redefinition of '{}'", name),
                    "locations": [{"caret": {"file": file, "line": index + 1, "column": spelled.start() + 1}}],
                    "children": [{"kind": "note", "message": format!("previous definition of '{}' with type 'int'", name)}],
                }));
            }
        }
    }
}

impl Compiler for MockCompiler {
    fn run(&self, invocation: &Invocation) -> Result<CompilerOutput, CompilerError> {
        self.invocations.borrow_mut().push(invocation.clone());

        let diagnostics = match &self.canned_stderr {
            Some(stderr) => stderr.clone(),
            None => {
                let diagnostics = self.compile(invocation);
                if diagnostics.is_empty() {
                    String::new()
                } else {
                    serde_json::to_string(&diagnostics).unwrap()
                }
            }
        };
        let success = diagnostics.is_empty();
        Ok(CompilerOutput {
            exit_code: Some(if success { 0 } else { 1 }),
            success,
            diagnostics,
        })
    }
}

#[derive(Default)]
struct State {
    macros: HashMap<String, String>,
    declared: HashSet<String>,
    diagnostics: Vec<Value>,
}
