//! Run configuration.
//!
//! Settings come from three layers, highest precedence first: command line
//! (including `CC` from the environment), an optional TOML file, built-in
//! defaults. Relative paths are resolved against the project root.

use amalgam_codegen::artifacts::{DEFAULT_OUTPUT_DIR, SKIP_LIST_FILE};
use amalgam_codegen::synthesis::DEFAULT_UNIT_TEST_MARKER;
use amalgam_core::paths;
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_DATABASE: &str = "compile_commands.json";
pub const DEFAULT_COMPILER: &str = "cc";

/// One layer of settings, every key optional.
///
/// ```toml
/// name = "server"
/// database = "build/compile_commands.json"
/// output-dir = "amalgamated"
/// compiler = "clang"
/// drop-flags = ["-fno-lifetime-dse"]
/// link-args = ["-lm", "-lpthread"]
/// verify = true
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub database: Option<PathBuf>,
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
    #[serde(default)]
    pub skip_list: Option<PathBuf>,
    #[serde(default)]
    pub compiler: Option<String>,
    #[serde(default)]
    pub drop_flags: Vec<String>,
    #[serde(default)]
    pub unit_test_marker: Option<String>,
    #[serde(default)]
    pub link_args: Vec<String>,
    #[serde(default)]
    pub verify: Option<bool>,
}

impl ConfigFile {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Layer `self` over `lower`: any key set here wins. Lists replace
    /// rather than extend.
    pub fn over(self, lower: ConfigFile) -> ConfigFile {
        ConfigFile {
            name: self.name.or(lower.name),
            database: self.database.or(lower.database),
            output_dir: self.output_dir.or(lower.output_dir),
            skip_list: self.skip_list.or(lower.skip_list),
            compiler: self.compiler.or(lower.compiler),
            drop_flags: if self.drop_flags.is_empty() {
                lower.drop_flags
            } else {
                self.drop_flags
            },
            unit_test_marker: self.unit_test_marker.or(lower.unit_test_marker),
            link_args: if self.link_args.is_empty() {
                lower.link_args
            } else {
                self.link_args
            },
            verify: self.verify.or(lower.verify),
        }
    }
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmalgamateConfig {
    /// Artifact name `N`
    pub name: String,
    pub project_root: PathBuf,
    pub database: PathBuf,
    pub output_dir: PathBuf,
    pub skip_list: PathBuf,
    pub compiler: String,
    pub denied_flags: Vec<String>,
    pub unit_test_marker: String,
    pub link_args: Vec<String>,
    pub verify: bool,
}

impl AmalgamateConfig {
    /// Defaults for everything but the name.
    pub fn new(project_root: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self::from_layers(project_root, name, ConfigFile::default())
    }

    fn from_layers(project_root: impl Into<PathBuf>, name: impl Into<String>, layer: ConfigFile) -> Self {
        let project_root = paths::normalize_lexically(&project_root.into());
        let under_root = |p: PathBuf| paths::resolve(&p, &project_root);

        let output_dir = under_root(
            layer
                .output_dir
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
        );
        let skip_list = layer
            .skip_list
            .map(under_root)
            .unwrap_or_else(|| output_dir.join(SKIP_LIST_FILE));

        Self {
            name: name.into(),
            database: under_root(
                layer
                    .database
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE)),
            ),
            output_dir,
            skip_list,
            compiler: layer
                .compiler
                .unwrap_or_else(|| DEFAULT_COMPILER.to_string()),
            denied_flags: layer.drop_flags,
            unit_test_marker: layer
                .unit_test_marker
                .unwrap_or_else(|| DEFAULT_UNIT_TEST_MARKER.to_string()),
            link_args: layer.link_args,
            verify: layer.verify.unwrap_or(false),
            project_root,
        }
    }

    /// Resolve the command-line layer over an optional config file.
    pub fn resolve(project_root: impl Into<PathBuf>, cli: ConfigFile, file: Option<&Path>) -> Result<Self> {
        let project_root = project_root.into();
        let file_layer = match file {
            Some(path) => ConfigFile::from_file(&paths::resolve(path, &project_root))?,
            None => ConfigFile::default(),
        };
        let mut merged = cli.over(file_layer);

        let Some(name) = merged.name.take() else {
            bail!("No artifact name given on the command line or in the config file");
        };
        Ok(Self::from_layers(project_root, name, merged))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = AmalgamateConfig::new("/p", "app");
        assert_eq!(config.database, PathBuf::from("/p/compile_commands.json"));
        assert_eq!(config.output_dir, PathBuf::from("/p/amalgamated"));
        assert_eq!(
            config.skip_list,
            PathBuf::from("/p/amalgamated/files_with_errors.txt")
        );
        assert_eq!(config.compiler, "cc");
        assert_eq!(config.unit_test_marker, "UNIT_TEST");
        assert!(config.denied_flags.is_empty());
        assert!(!config.verify);
    }

    #[test]
    fn test_cli_overrides_file() -> Result<()> {
        let dir = TempDir::new()?;
        let file = dir.path().join("amalgam.toml");
        fs::write(
            &file,
            r#"
name = "from-file"
output-dir = "out"
compiler = "gcc"
drop-flags = ["-fno-lifetime-dse"]
link-args = ["-lm"]
verify = true
"#,
        )?;

        let cli = ConfigFile {
            compiler: Some("clang".to_string()),
            link_args: vec!["-lpthread".to_string()],
            ..ConfigFile::default()
        };
        let config = AmalgamateConfig::resolve(dir.path(), cli, Some(Path::new("amalgam.toml")))?;

        assert_eq!(config.name, "from-file");
        assert_eq!(config.compiler, "clang");
        assert_eq!(config.output_dir, dir.path().join("out"));
        assert_eq!(config.skip_list, dir.path().join("out").join(SKIP_LIST_FILE));
        assert_eq!(config.denied_flags, vec!["-fno-lifetime-dse"]);
        assert_eq!(config.link_args, vec!["-lpthread"]);
        assert!(config.verify);
        Ok(())
    }

    #[test]
    fn test_missing_name_is_an_error() {
        let err = AmalgamateConfig::resolve("/p", ConfigFile::default(), None).unwrap_err();
        assert!(err.to_string().contains("artifact name"));
    }

    #[test]
    fn test_unknown_key_is_rejected() -> Result<()> {
        let dir = TempDir::new()?;
        let file = dir.path().join("amalgam.toml");
        fs::write(&file, "nmae = \"typo\"\n")?;
        assert!(ConfigFile::from_file(&file).is_err());
        Ok(())
    }

    #[test]
    fn test_absolute_paths_are_kept() {
        let cli = ConfigFile {
            name: Some("app".to_string()),
            database: Some(PathBuf::from("/elsewhere/db.json")),
            skip_list: Some(PathBuf::from("skip.txt")),
            ..ConfigFile::default()
        };
        let config = AmalgamateConfig::from_layers("/p", "app", cli);
        assert_eq!(config.database, PathBuf::from("/elsewhere/db.json"));
        assert_eq!(config.skip_list, PathBuf::from("/p/skip.txt"));
    }
}
