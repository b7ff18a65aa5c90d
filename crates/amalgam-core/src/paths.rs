//! Lexical path helpers.
//!
//! Compile databases mix absolute paths, paths relative to an entry's
//! `directory` and `./`-prefixed variants of the same file. Everything the
//! engine compares (skip lists, renaming tables, include directives) goes
//! through these helpers so that one file always has one spelling.
//!
//! None of these touch the filesystem: symlinks are not resolved.

use std::path::{Component, Path, PathBuf};

/// Fold `.` and `..` components without consulting the filesystem.
///
/// A `..` that would climb above the start of a relative path is kept.
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut parts: Vec<Component<'_>> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match parts.last() {
                Some(Component::Normal(_)) => {
                    parts.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => parts.push(component),
            },
            other => parts.push(other),
        }
    }

    if parts.is_empty() {
        return PathBuf::from(".");
    }
    parts.iter().collect()
}

/// Resolve `path` against `base` when it is relative, then normalize.
pub fn resolve(path: &Path, base: &Path) -> PathBuf {
    if path.is_absolute() {
        normalize_lexically(path)
    } else {
        normalize_lexically(&base.join(path))
    }
}

/// Express `path` relative to `base`.
///
/// Relative inputs are taken to already be relative to `base`. Absolute
/// inputs outside `base` get the necessary `..` components.
pub fn relative_to(path: &Path, base: &Path) -> PathBuf {
    if !path.is_absolute() {
        return normalize_lexically(path);
    }

    let path = normalize_lexically(path);
    let base = normalize_lexically(base);
    let path_parts: Vec<_> = path.components().collect();
    let base_parts: Vec<_> = base.components().collect();

    let common = path_parts
        .iter()
        .zip(base_parts.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut relative = PathBuf::new();
    for _ in common..base_parts.len() {
        relative.push("..");
    }
    for part in &path_parts[common..] {
        relative.push(part);
    }

    if relative.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        relative
    }
}

/// Render a path with `/` separators, the spelling used in generated
/// `#include` directives and in the skip list file.
pub fn to_slash(path: &Path) -> String {
    let mut out = String::new();
    for component in path.components() {
        match component {
            Component::RootDir => out.push('/'),
            other => {
                if !out.is_empty() && !out.ends_with('/') {
                    out.push('/');
                }
                out.push_str(&other.as_os_str().to_string_lossy());
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_lexically() {
        assert_eq!(normalize_lexically(Path::new("./a/./b.c")), PathBuf::from("a/b.c"));
        assert_eq!(normalize_lexically(Path::new("a/x/../b.c")), PathBuf::from("a/b.c"));
        assert_eq!(normalize_lexically(Path::new("../a.c")), PathBuf::from("../a.c"));
        assert_eq!(normalize_lexically(Path::new("/../a.c")), PathBuf::from("/a.c"));
        assert_eq!(normalize_lexically(Path::new("./")), PathBuf::from("."));
    }

    #[test]
    fn test_resolve() {
        let base = Path::new("/proj/build");
        assert_eq!(resolve(Path::new("../src/a.c"), base), PathBuf::from("/proj/src/a.c"));
        assert_eq!(resolve(Path::new("/abs/b.c"), base), PathBuf::from("/abs/b.c"));
    }

    #[test]
    fn test_relative_to() {
        let root = Path::new("/proj");
        assert_eq!(relative_to(Path::new("/proj/src/a.c"), root), PathBuf::from("src/a.c"));
        assert_eq!(relative_to(Path::new("/other/a.c"), root), PathBuf::from("../other/a.c"));
        assert_eq!(relative_to(Path::new("./src/a.c"), root), PathBuf::from("src/a.c"));
        assert_eq!(relative_to(Path::new("/proj"), root), PathBuf::from("."));
    }

    #[test]
    fn test_to_slash() {
        assert_eq!(to_slash(Path::new("src/lib/a.c")), "src/lib/a.c");
        assert_eq!(to_slash(Path::new("/proj/a.c")), "/proj/a.c");
    }
}
