//! Ignore-rule evaluation.
//!
//! The last rule that matches a path decides: a plain rule excludes it, a
//! negated rule includes it again. Paths no rule matches are included.

use std::path::{Component, Path};

use crate::ignore::IgnoreRuleSet;
use crate::pattern::{clean, to_slash};

/// Whether `path` (relative to the context root) is excluded by `rules`.
pub fn matches(path: &Path, rules: &IgnoreRuleSet) -> bool {
    if rules.is_empty() {
        return false;
    }
    matches_str(&slash_path(path), rules)
}

/// Same as [`matches`] for a slash-separated path string.
pub fn matches_str(path: &str, rules: &IgnoreRuleSet) -> bool {
    let path = clean(&to_slash(path));
    let path = path.strip_prefix('/').unwrap_or(&path);

    rules
        .patterns()
        .iter()
        .rev()
        .find(|p| p.matches(path))
        .is_some_and(|p| !p.is_negated())
}

/// Join the normal components of a relative path with `/`.
pub(crate) fn slash_path(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy()),
            Component::ParentDir => Some("..".into()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
