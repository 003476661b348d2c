//! A3S Build Context - build context packaging.
//!
//! Turns a context directory into the tar stream an image builder consumes:
//!
//! ```text
//! .dockerignore ──► IgnoreRuleSet ──► matcher ◄── ContextPacker (walk) ──► ArchiveWriter ──► tar bytes
//! ```
//!
//! - [`ignore`] finds and parses `.dockerignore` into ordered rules
//! - [`matcher`] decides whether a path is excluded (last match wins, `!` re-includes)
//! - [`pack`] walks the tree in name order, pruning excluded directories
//! - [`archive`] writes the tar entries
//!
//! # Glob dialect
//!
//! Patterns are anchored at the context root. `*` and `?` never cross `/`,
//! `[...]` / `[!...]` are character classes, and `**` as a whole segment
//! matches any number of directories, while a `**` run inside a segment
//! (`**.pyc`) matches across separators. Matching is case-sensitive. A rule
//! that matches a directory also matches everything beneath it. Lines that
//! do not compile are kept as rules that never match.

pub mod archive;
pub mod ignore;
pub mod matcher;
pub mod pack;
pub mod pattern;

pub use archive::{ArchiveWriter, EntryHeader};
pub use ignore::{find_ignore_file, load_ignore_rules, IgnoreRuleSet, IGNORE_FILE_NAME};
pub use matcher::matches;
pub use pack::{pack, ArchiveRoot, ContextArchive, ContextPacker};
pub use pattern::IgnorePattern;
