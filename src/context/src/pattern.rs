//! A single `.dockerignore` pattern.

use std::fmt;

use glob::{MatchOptions, Pattern};

/// Glob options: `*` and `?` stop at `/`, case-sensitive, dotfiles match wildcards.
const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// A cleaned, context-relative glob with an optional negation flag.
#[derive(Debug, Clone)]
pub struct IgnorePattern {
    text: String,
    negated: bool,
    line: usize,
    /// Compiled alternatives; empty when the text is not a valid glob.
    globs: Vec<Pattern>,
}

impl IgnorePattern {
    /// Parse one line of an ignore file.
    ///
    /// Returns `None` for blank lines and comments. Every other line yields a
    /// pattern. `line` is 1-based and only used for diagnostics.
    pub fn parse_line(raw: &str, line: usize) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return None;
        }

        let (negated, body) = match trimmed.strip_prefix('!') {
            Some(rest) => (true, rest.trim()),
            None => (false, trimmed),
        };

        let mut text = if body.is_empty() {
            String::new()
        } else {
            clean(&to_slash(body))
        };
        if text.len() > 1 && text.starts_with('/') {
            text.remove(0);
        }

        Some(Self::new(text, negated, line))
    }

    /// Build a pattern from already-cleaned text.
    ///
    /// Text the glob engine rejects (e.g. an unclosed `[`) is kept but never
    /// matches.
    pub fn new(text: impl Into<String>, negated: bool, line: usize) -> Self {
        let text = text.into();
        let globs = match compile(&text) {
            Ok(globs) => globs,
            Err(e) => {
                tracing::warn!(
                    line,
                    pattern = %text,
                    error = e.msg,
                    "Ignore pattern never matches"
                );
                Vec::new()
            }
        };
        Self {
            text,
            negated,
            line,
            globs,
        }
    }

    /// Pattern text without the negation marker.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Whether a match re-includes the path.
    pub fn is_negated(&self) -> bool {
        self.negated
    }

    /// Source line in the ignore file (1-based).
    pub fn line(&self) -> usize {
        self.line
    }

    /// Whether the text compiled. Invalid patterns match nothing.
    pub fn is_valid(&self) -> bool {
        !self.globs.is_empty()
    }

    /// Whether this pattern matches `path` or any of its parent directories.
    ///
    /// `path` must be cleaned and slash-separated.
    pub fn matches(&self, path: &str) -> bool {
        if self.matches_exact(path) {
            return true;
        }
        path.match_indices('/')
            .any(|(idx, _)| self.matches_exact(&path[..idx]))
    }

    fn matches_exact(&self, path: &str) -> bool {
        self.globs
            .iter()
            .any(|glob| glob.matches_with(path, MATCH_OPTIONS))
    }
}

fn compile(text: &str) -> std::result::Result<Vec<Pattern>, glob::PatternError> {
    expand_double_star(text)
        .iter()
        .map(|alt| Pattern::new(alt))
        .collect()
}

/// Rewrite `**` runs that share a segment with other characters.
///
/// Such a run matches any characters, separators included, but the glob engine
/// only accepts `**` as a whole segment. `a**b` therefore becomes the pair
/// `a*b` (no separator crossed) and `a*/**/*b` (at least one crossed).
fn expand_double_star(text: &str) -> Vec<String> {
    let Some((start, end)) = embedded_double_star(text) else {
        return vec![text.to_string()];
    };
    let (left, right) = (&text[..start], &text[end..]);
    expand_double_star(right)
        .into_iter()
        .flat_map(|tail| [format!("{left}*{tail}"), format!("{left}*/**/*{tail}")])
        .collect()
}

/// Byte range of the first run of two or more `*` that is not exactly a `**` segment.
fn embedded_double_star(text: &str) -> Option<(usize, usize)> {
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] != b'*' {
            i += 1;
            continue;
        }
        let start = i;
        while i < bytes.len() && bytes[i] == b'*' {
            i += 1;
        }
        let run = i - start;
        let whole_segment =
            (start == 0 || bytes[start - 1] == b'/') && (i == bytes.len() || bytes[i] == b'/');
        if run > 2 || (run == 2 && !whole_segment) {
            return Some((start, i));
        }
    }
    None
}

impl fmt::Display for IgnorePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negated {
            write!(f, "!{}", self.text)
        } else {
            f.write_str(&self.text)
        }
    }
}

impl PartialEq for IgnorePattern {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text && self.negated == other.negated
    }
}

impl Eq for IgnorePattern {}

/// Convert host separators to `/`.
#[cfg(windows)]
pub(crate) fn to_slash(path: &str) -> String {
    path.replace('\\', "/")
}

#[cfg(not(windows))]
pub(crate) fn to_slash(path: &str) -> String {
    path.to_string()
}

/// Lexically clean a slash-separated path.
///
/// Collapses repeated separators, drops `.` segments and resolves `..`
/// against the preceding segment. `..` that climbs above a relative path is
/// kept; above the root it is dropped. An empty result is `.`.
pub fn clean(path: &str) -> String {
    let rooted = path.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => match parts.last() {
                Some(&last) if last != ".." => {
                    parts.pop();
                }
                _ if rooted => {}
                _ => parts.push(".."),
            },
            s => parts.push(s),
        }
    }

    let joined = parts.join("/");
    if rooted {
        format!("/{joined}")
    } else if joined.is_empty() {
        ".".to_string()
    } else {
        joined
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> Option<IgnorePattern> {
        IgnorePattern::parse_line(raw, 1)
    }

    #[test]
    fn test_clean() {
        assert_eq!(clean("a/b/c"), "a/b/c");
        assert_eq!(clean("a//b/./c/"), "a/b/c");
        assert_eq!(clean("a/b/../c"), "a/c");
        assert_eq!(clean("./a"), "a");
        assert_eq!(clean("../a"), "../a");
        assert_eq!(clean("a/../.."), "..");
        assert_eq!(clean("/../a"), "/a");
        assert_eq!(clean("/"), "/");
        assert_eq!(clean(""), ".");
        assert_eq!(clean("./"), ".");
    }

    #[test]
    fn test_parse_plain() {
        let p = parse("  node_modules  ").unwrap();
        assert_eq!(p.as_str(), "node_modules");
        assert!(!p.is_negated());
        assert_eq!(p.to_string(), "node_modules");
    }

    #[test]
    fn test_parse_negation() {
        let p = parse("! ./keep//me.txt").unwrap();
        assert_eq!(p.as_str(), "keep/me.txt");
        assert!(p.is_negated());
        assert_eq!(p.to_string(), "!keep/me.txt");
    }

    #[test]
    fn test_parse_strips_leading_slash() {
        assert_eq!(parse("/build").unwrap().as_str(), "build");
        assert_eq!(parse("!/build").unwrap().as_str(), "build");
        assert_eq!(parse("/").unwrap().as_str(), "/");
    }

    #[test]
    fn test_parse_skips_comments_and_blanks() {
        assert!(parse("").is_none());
        assert!(parse("   ").is_none());
        assert!(parse("# comment").is_none());
        assert!(parse("   # comment").is_none());
    }

    #[test]
    fn test_invalid_glob_is_kept_and_never_matches() {
        let p = IgnorePattern::parse_line("src/[abc", 7).unwrap();
        assert_eq!(p.as_str(), "src/[abc");
        assert_eq!(p.line(), 7);
        assert!(!p.is_valid());
        assert!(!p.matches("src/[abc"));
        assert!(!p.matches("src/a"));
    }

    #[test]
    fn test_expand_double_star() {
        assert_eq!(expand_double_star("a/**/b"), vec!["a/**/b"]);
        assert_eq!(expand_double_star("**.pyc"), vec!["*.pyc", "*/**/*.pyc"]);
        assert_eq!(expand_double_star("foo**"), vec!["foo*", "foo*/**/*"]);
        assert_eq!(expand_double_star("a/***/b"), vec!["a/*/b", "a/*/**/*/b"]);
        assert_eq!(expand_double_star("x**y**").len(), 4);
    }

    #[test]
    fn test_embedded_double_star_crosses_separators() {
        let p = parse("**.pyc").unwrap();
        assert!(p.is_valid());
        assert!(p.matches("a.pyc"));
        assert!(p.matches("pkg/mod/a.pyc"));
        assert!(!p.matches("a.py"));

        let p = parse("dir/**.tmp").unwrap();
        assert!(p.matches("dir/a.tmp"));
        assert!(p.matches("dir/x/y/a.tmp"));
        assert!(!p.matches("other/a.tmp"));

        let p = parse("foo**").unwrap();
        assert!(p.matches("foobar"));
        assert!(p.matches("foo/bar/baz"));
        assert!(!p.matches("barfoo"));
    }

    #[test]
    fn test_star_stays_in_segment() {
        let p = parse("*.txt").unwrap();
        assert!(p.matches("a.txt"));
        assert!(!p.matches("sub/a.txt"));
    }

    #[test]
    fn test_segment_wildcards() {
        let p = parse("*/*tmp*").unwrap();
        assert!(p.matches("keep/tmp1"));
        assert!(p.matches("keep/a.tmp.b"));
        assert!(!p.matches("tmp1"));
        assert!(!p.matches("keep/file"));
    }

    #[test]
    fn test_question_mark_and_class() {
        let p = parse("log?.[0-9]").unwrap();
        assert!(p.matches("log1.5"));
        assert!(!p.matches("log.5"));
        assert!(!p.matches("log1.x"));

        let p = parse("[!a]*").unwrap();
        assert!(p.matches("b.txt"));
        assert!(!p.matches("a.txt"));
    }

    #[test]
    fn test_double_star() {
        let p = parse("**/*.log").unwrap();
        assert!(p.matches("a.log"));
        assert!(p.matches("x/y/z.log"));
        assert!(!p.matches("x/y/z.txt"));
    }

    #[test]
    fn test_matches_parent_directory() {
        let p = parse("ignore_dir").unwrap();
        assert!(p.matches("ignore_dir"));
        assert!(p.matches("ignore_dir/x"));
        assert!(p.matches("ignore_dir/deep/er"));
        assert!(!p.matches("ignore_dir_other"));
        assert!(!p.matches("other/ignore_dir"));
    }

    #[test]
    fn test_case_sensitive() {
        let p = parse("README.md").unwrap();
        assert!(!p.matches("readme.md"));
    }

    #[test]
    fn test_dotfiles_match_wildcards() {
        let p = parse("*").unwrap();
        assert!(p.matches(".env"));
    }

    #[test]
    fn test_equality_ignores_line() {
        let a = IgnorePattern::parse_line("x", 1).unwrap();
        let b = IgnorePattern::parse_line("x", 9).unwrap();
        assert_eq!(a, b);
    }
}
