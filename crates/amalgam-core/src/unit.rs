//! Normalized translation units.

use crate::error::CoreError;
use crate::naming;
use std::path::PathBuf;

/// Prefix of a macro-definition flag.
pub const DEFINE_PREFIX: &str = "-D";
/// Separates a macro name from its value inside a define flag.
pub const DEFINE_SEPARATOR: char = '=';

/// A `-DNAME[=VALUE]` flag decoded into its parts.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DefineFlag {
    pub name: String,
    /// `None` for `-DNAME`, `Some("")` for `-DNAME=`
    pub value: Option<String>,
    /// The flag exactly as it appeared on the command line
    pub flag: String,
}

impl DefineFlag {
    /// Decode a define flag.
    ///
    /// Compile databases escape quotes in define values for the shell
    /// (`-DVERSION=\"1.2\"`). That escaping is undone exactly once here so
    /// the value can be pasted into a `#define`.
    pub fn parse(flag: &str) -> Result<Self, CoreError> {
        let body = flag
            .strip_prefix(DEFINE_PREFIX)
            .ok_or_else(|| CoreError::InvalidDefine(flag.to_string()))?;

        let (name, value) = match body.split_once(DEFINE_SEPARATOR) {
            Some((name, value)) => (name, Some(value.replace("\\\"", "\""))),
            None => (body, None),
        };

        if name.is_empty() {
            return Err(CoreError::InvalidDefine(flag.to_string()));
        }

        Ok(Self {
            name: name.to_string(),
            value,
            flag: flag.to_string(),
        })
    }

    /// Macro name without a function-like parameter list.
    pub fn macro_name(&self) -> &str {
        match self.name.find('(') {
            Some(idx) => &self.name[..idx],
            None => &self.name,
        }
    }

    /// The `#define` line equivalent to passing this flag to the compiler.
    pub fn define_directive(&self) -> String {
        match self.value.as_deref() {
            None => format!("#define {} 1", self.name),
            Some("") => format!("#define {}", self.name),
            Some(value) => format!("#define {} {}", self.name, value),
        }
    }

    pub fn undef_directive(&self) -> String {
        format!("#undef {}", self.macro_name())
    }
}

/// A compile record reduced to what synthesis needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedUnit {
    /// Absolute, normalized source path
    pub source: PathBuf,
    /// Source path relative to the project root, `/`-separated
    pub relative_path: String,
    /// Namespace token derived from `relative_path`
    pub path_identifier: String,
    /// All flags, in command-line order
    pub flags: Vec<String>,
    pub define_flags: Vec<DefineFlag>,
    pub non_define_flags: Vec<String>,
}

impl NormalizedUnit {
    /// Build a unit, partitioning `flags` into defines and everything else.
    ///
    /// Both partitions keep command-line order.
    pub fn new(
        source: PathBuf,
        relative_path: impl Into<String>,
        flags: Vec<String>,
    ) -> Result<Self, CoreError> {
        let relative_path = relative_path.into();
        let mut define_flags = Vec::new();
        let mut non_define_flags = Vec::new();

        for flag in &flags {
            if flag.starts_with(DEFINE_PREFIX) {
                define_flags.push(DefineFlag::parse(flag)?);
            } else {
                non_define_flags.push(flag.clone());
            }
        }

        Ok(Self {
            source,
            path_identifier: naming::path_identifier(&relative_path),
            relative_path,
            flags,
            define_flags,
            non_define_flags,
        })
    }

    /// Whether this unit is compiled with macro `name` defined, whatever its value.
    pub fn defines_macro(&self, name: &str) -> bool {
        self.define_flags.iter().any(|d| d.macro_name() == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_define_with_value() -> Result<(), CoreError> {
        let define = DefineFlag::parse("-DFOO=1")?;
        assert_eq!(define.name, "FOO");
        assert_eq!(define.value.as_deref(), Some("1"));
        assert_eq!(define.define_directive(), "#define FOO 1");
        assert_eq!(define.undef_directive(), "#undef FOO");
        Ok(())
    }

    #[test]
    fn test_parse_define_splits_on_first_separator() -> Result<(), CoreError> {
        let define = DefineFlag::parse("-DEXPR=a=b")?;
        assert_eq!(define.name, "EXPR");
        assert_eq!(define.value.as_deref(), Some("a=b"));
        Ok(())
    }

    #[test]
    fn test_parse_define_unescapes_quotes_once() -> Result<(), CoreError> {
        let define = DefineFlag::parse(r#"-DVERSION=\"1.2\""#)?;
        assert_eq!(define.define_directive(), r#"#define VERSION "1.2""#);

        let nested = DefineFlag::parse(r#"-DMSG=\\\"x\\\""#)?;
        assert_eq!(nested.value.as_deref(), Some(r#"\\"x\\""#));
        Ok(())
    }

    #[test]
    fn test_define_without_value() -> Result<(), CoreError> {
        let bare = DefineFlag::parse("-DNDEBUG")?;
        assert_eq!(bare.value, None);
        assert_eq!(bare.define_directive(), "#define NDEBUG 1");

        let empty = DefineFlag::parse("-DEMPTY=")?;
        assert_eq!(empty.define_directive(), "#define EMPTY");
        Ok(())
    }

    #[test]
    fn test_function_like_define() -> Result<(), CoreError> {
        let define = DefineFlag::parse("-DMAX(a,b)=((a)>(b)?(a):(b))")?;
        assert_eq!(define.macro_name(), "MAX");
        assert_eq!(define.define_directive(), "#define MAX(a,b) ((a)>(b)?(a):(b))");
        assert_eq!(define.undef_directive(), "#undef MAX");
        Ok(())
    }

    #[test]
    fn test_invalid_define() {
        assert!(DefineFlag::parse("-D").is_err());
        assert!(DefineFlag::parse("-D=1").is_err());
        assert!(DefineFlag::parse("-O2").is_err());
    }

    #[test]
    fn test_unit_partitions_flags_in_order() -> Result<(), CoreError> {
        let flags: Vec<String> = ["-O2", "-DA=1", "-Iinclude", "-DB", "-Wall"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let unit = NormalizedUnit::new(PathBuf::from("/p/src/a.c"), "src/a.c", flags.clone())?;

        assert_eq!(unit.flags, flags);
        assert_eq!(unit.non_define_flags, vec!["-O2", "-Iinclude", "-Wall"]);
        let names: Vec<_> = unit.define_flags.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);
        assert_eq!(unit.path_identifier, "src_a_c");
        assert!(unit.defines_macro("B"));
        assert!(!unit.defines_macro("C"));
        Ok(())
    }
}
