//! Naming utilities for per-file namespaces.
//!
//! Every translation unit gets a namespace token derived from its path
//! relative to the project root. Identifiers that collide once units share
//! one compilation are aliased into that namespace with a macro.

/// Separator between a unit's namespace and the aliased identifier.
pub const NAMESPACE_SEPARATOR: &str = "__";

/// Derive the namespace token for a relative source path.
///
/// Every run of non-word characters becomes a single underscore. Word
/// characters are ASCII/Unicode alphanumerics and `_`.
///
/// # Examples
/// ```
/// use amalgam_core::naming::path_identifier;
/// assert_eq!(path_identifier("a/b.c"), "a_b_c");
/// assert_eq!(path_identifier("src/net/http-client.c"), "src_net_http_client_c");
/// assert_eq!(path_identifier("../x//y.c"), "_x_y_c");
/// ```
pub fn path_identifier(relative_path: &str) -> String {
    let mut out = String::with_capacity(relative_path.len());
    let mut in_run = false;
    for c in relative_path.chars() {
        if c.is_alphanumeric() || c == '_' {
            out.push(c);
            in_run = false;
        } else if !in_run {
            out.push('_');
            in_run = true;
        }
    }
    out
}

/// Build the alias an identifier is renamed to inside one unit.
///
/// # Examples
/// ```
/// use amalgam_core::naming::namespaced_alias;
/// assert_eq!(namespaced_alias("a_b_c", "foo"), "a_b_c__foo");
/// ```
pub fn namespaced_alias(path_identifier: &str, identifier: &str) -> String {
    format!("{}{}{}", path_identifier, NAMESPACE_SEPARATOR, identifier)
}

/// Whether `name` is usable as a C identifier (and therefore as a macro name).
pub fn is_c_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}
