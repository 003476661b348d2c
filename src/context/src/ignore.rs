//! `.dockerignore` discovery and parsing.

use std::path::{Path, PathBuf};

use a3s_build_core::error::{BuildError, Result};
use walkdir::WalkDir;

use crate::matcher;
use crate::pattern::IgnorePattern;

/// Name of the ignore-rules file inside a build context.
pub const IGNORE_FILE_NAME: &str = ".dockerignore";

const UTF8_BOM: char = '\u{feff}';

/// Ordered ignore rules. Later rules override earlier ones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IgnoreRuleSet {
    patterns: Vec<IgnorePattern>,
    source: Option<PathBuf>,
}

impl IgnoreRuleSet {
    /// A rule set that excludes nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse ignore-file text. Every non-blank, non-comment line becomes a rule.
    pub fn parse(text: &str) -> Self {
        let text = text.strip_prefix(UTF8_BOM).unwrap_or(text);
        Self::from_lines(text.lines())
    }

    /// Build a rule set from pattern lines, e.g. `["target", "!target/keep"]`.
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = lines
            .into_iter()
            .enumerate()
            .filter_map(|(idx, raw)| IgnorePattern::parse_line(raw.as_ref(), idx + 1))
            .collect();
        Self {
            patterns,
            source: None,
        }
    }

    /// Rules in file order.
    pub fn patterns(&self) -> &[IgnorePattern] {
        &self.patterns
    }

    /// Rules rendered back as strings, negations prefixed with `!`.
    pub fn to_strings(&self) -> Vec<String> {
        self.patterns.iter().map(ToString::to_string).collect()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Ignore file the rules were read from, if any.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Whether a context-relative path is excluded.
    pub fn is_excluded(&self, path: &Path) -> bool {
        matcher::matches(path, self)
    }
}

/// Locate the ignore file for a context directory.
///
/// The root-level file wins. Otherwise the tree is searched depth-first in
/// file-name order and the first hit is returned.
pub fn find_ignore_file(context_dir: &Path) -> Result<Option<PathBuf>> {
    let root_file = context_dir.join(IGNORE_FILE_NAME);
    if root_file.is_file() {
        return Ok(Some(root_file));
    }

    for entry in WalkDir::new(context_dir)
        .min_depth(2)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| {
            let path = e
                .path()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| context_dir.to_path_buf());
            BuildError::read(path, e.into())
        })?;
        if entry.file_type().is_file() && entry.file_name() == IGNORE_FILE_NAME {
            return Ok(Some(entry.into_path()));
        }
    }

    Ok(None)
}

/// Load the ignore rules for a context directory.
///
/// A missing ignore file yields an empty rule set.
pub fn load_ignore_rules(context_dir: &Path) -> Result<IgnoreRuleSet> {
    let Some(path) = find_ignore_file(context_dir)? else {
        tracing::debug!(context = %context_dir.display(), "No ignore file found");
        return Ok(IgnoreRuleSet::empty());
    };

    let text = std::fs::read_to_string(&path).map_err(|e| BuildError::read(&path, e))?;
    let mut rules = IgnoreRuleSet::parse(&text);
    tracing::debug!(
        file = %path.display(),
        rules = rules.len(),
        "Loaded ignore rules"
    );
    rules.source = Some(path);
    Ok(rules)
}
