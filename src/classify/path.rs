//! Path parsing helpers used by the classifier

use regex::Regex;

/// Replace Windows separators with `/`
pub fn normalize_separators(path: &str) -> String {
    path.replace('\\', "/")
}

/// Build the pattern capturing the path segment right after the store marker.
///
/// The capture is lazy and stops at the first separator, so for a scoped
/// package (`node_modules/@scope/pkg`) only `@scope` is captured.
pub fn store_package_pattern(marker: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!(r"[\\/]{}[\\/](.*?)([\\/]|$)", regex::escape(marker)))
}

/// Base name of an import request: last `/` segment, query dropped, cut at
/// the first `.`. Returns `None` when nothing is left.
pub fn request_base_name(raw_request: &str) -> Option<&str> {
    let last = raw_request.rsplit('/').next().unwrap_or(raw_request);
    let without_query = last.split('?').next().unwrap_or(last);
    let base = without_query.split('.').next().unwrap_or(without_query);

    if base.is_empty() {
        None
    } else {
        Some(base)
    }
}

/// Lower-case the first character only (`MyWidget` -> `myWidget`)
pub fn lower_first(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Trim separators from both ends of a configured directory marker
pub fn trim_dir(dir: &str) -> String {
    normalize_separators(dir).trim_matches('/').to_string()
}
