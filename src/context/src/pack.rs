//! Build context packaging.
//!
//! Walks a context directory depth-first in file-name order, drops whatever
//! the ignore rules exclude (pruning excluded directories), and writes every
//! remaining regular file and symlink into a tar stream.

use std::fmt;
use std::fs::Metadata;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use a3s_build_core::error::{BuildError, Result};
use sha2::{Digest, Sha256};
use walkdir::WalkDir;

use crate::archive::{ArchiveWriter, EntryHeader};
use crate::ignore::{load_ignore_rules, IgnoreRuleSet};
use crate::matcher::slash_path;

/// Where entries are rooted inside the archive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ArchiveRoot {
    /// Context-relative names (`sub/b.txt`)
    #[default]
    Bare,
    /// Names under a fixed top-level directory (`build/sub/b.txt`)
    Named(String),
}

impl ArchiveRoot {
    /// Archive name for a context-relative path.
    ///
    /// Built from the path itself, so names that are not valid UTF-8 keep
    /// their exact bytes.
    pub fn entry_path(&self, relative: &Path) -> PathBuf {
        match self {
            ArchiveRoot::Bare => relative.to_path_buf(),
            ArchiveRoot::Named(root) => Path::new(root).join(relative),
        }
    }
}

impl FromStr for ArchiveRoot {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "" | "." | "bare" => Ok(ArchiveRoot::Bare),
            ".." => Err("archive root must not be '..'".to_string()),
            s if s.contains('/') || s.contains('\\') => Err(format!(
                "archive root must be a single directory name (got '{s}')"
            )),
            s => Ok(ArchiveRoot::Named(s.to_string())),
        }
    }
}

impl fmt::Display for ArchiveRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArchiveRoot::Bare => f.write_str("bare"),
            ArchiveRoot::Named(root) => f.write_str(root),
        }
    }
}

/// A packed build context held in memory.
#[derive(Debug, Clone)]
pub struct ContextArchive {
    /// Tar bytes, including the end-of-archive marker
    pub bytes: Vec<u8>,
    /// Entries in archive order
    pub entries: Vec<EntryHeader>,
}

impl ContextArchive {
    /// Archive size in bytes.
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// SHA256 of the archive bytes (hex, without prefix).
    pub fn digest(&self) -> String {
        hex::encode(Sha256::digest(&self.bytes))
    }

    /// Digest with the `sha256:` prefix.
    pub fn prefixed_digest(&self) -> String {
        format!("sha256:{}", self.digest())
    }

    /// Entry names in archive order, lossily converted for display.
    pub fn names(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|e| e.name.to_string_lossy().into_owned())
            .collect()
    }
}

/// Packs a build context directory into a tar stream.
#[derive(Debug, Clone)]
pub struct ContextPacker {
    context_dir: PathBuf,
    root: ArchiveRoot,
    rules: Option<IgnoreRuleSet>,
}

impl ContextPacker {
    pub fn new(context_dir: impl Into<PathBuf>) -> Self {
        Self {
            context_dir: context_dir.into(),
            root: ArchiveRoot::Bare,
            rules: None,
        }
    }

    /// Root entries under `root` inside the archive.
    pub fn with_root(mut self, root: ArchiveRoot) -> Self {
        self.root = root;
        self
    }

    /// Use `rules` instead of loading the context's ignore file.
    pub fn with_rules(mut self, rules: IgnoreRuleSet) -> Self {
        self.rules = Some(rules);
        self
    }

    pub fn context_dir(&self) -> &Path {
        &self.context_dir
    }

    /// Pack into `writer`, returning it after the archive is sealed.
    ///
    /// The archive is assembled in memory first, so a failed run leaves
    /// `writer` untouched.
    pub fn pack_into<W: Write>(&self, mut writer: W) -> Result<(W, Vec<EntryHeader>)> {
        let archive = self.pack()?;
        writer
            .write_all(&archive.bytes)
            .and_then(|()| writer.flush())
            .map_err(|e| BuildError::WriteError(format!("Failed to write archive: {e}")))?;
        Ok((writer, archive.entries))
    }

    /// Pack into memory.
    pub fn pack(&self) -> Result<ContextArchive> {
        let root = &self.context_dir;
        match std::fs::metadata(root) {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => return Err(BuildError::ContextNotFound(root.clone())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(BuildError::ContextNotFound(root.clone()))
            }
            Err(e) => return Err(BuildError::read(root, e)),
        }

        let rules = match &self.rules {
            Some(rules) => rules.clone(),
            None => load_ignore_rules(root)?,
        };

        tracing::info!(
            context = %root.display(),
            rules = rules.len(),
            archive_root = %self.root,
            "Packing build context"
        );

        let mut archive = ArchiveWriter::new(Vec::new());
        let mut entries = Vec::new();

        let walker = WalkDir::new(root)
            .min_depth(1)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                let relative = relative_path(root, entry.path());
                let excluded = rules.is_excluded(Path::new(&relative));
                if excluded {
                    tracing::debug!(path = %relative, dir = entry.file_type().is_dir(), "Excluded");
                }
                !excluded
            });

        for entry in walker {
            let entry = entry.map_err(|e| {
                let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| root.clone());
                BuildError::read(path, e.into())
            })?;

            let file_type = entry.file_type();
            if file_type.is_dir() {
                continue;
            }

            let path = entry.path();
            let relative = path.strip_prefix(root).unwrap_or(path);
            let name = self.root.entry_path(relative);
            let metadata = entry
                .metadata()
                .map_err(|e| BuildError::read(path, e.into()))?;
            let mode = file_mode(&metadata);
            let mtime = modified_secs(&metadata);

            let header = if file_type.is_symlink() {
                let target = std::fs::read_link(path).map_err(|e| BuildError::read(path, e))?;
                archive.append_symlink(&name, mode, mtime, &target)?
            } else if file_type.is_file() {
                let contents = std::fs::read(path).map_err(|e| BuildError::read(path, e))?;
                archive.append_file(&name, mode, mtime, &contents)?
            } else {
                tracing::debug!(path = %relative.display(), "Skipping special file");
                continue;
            };

            tracing::debug!(name = %header.name.display(), size = header.size, "Added");
            entries.push(header);
        }

        let bytes = archive.finish()?;
        tracing::info!(
            entries = entries.len(),
            bytes = bytes.len(),
            "Build context packed"
        );
        Ok(ContextArchive { bytes, entries })
    }
}

/// Pack `context_dir` with its own ignore file and bare entry names.
pub fn pack(context_dir: &Path) -> Result<ContextArchive> {
    ContextPacker::new(context_dir).pack()
}

/// Slash-separated path of `path` relative to `root`, used for rule matching.
fn relative_path(root: &Path, path: &Path) -> String {
    slash_path(path.strip_prefix(root).unwrap_or(path))
}

#[cfg(unix)]
fn file_mode(metadata: &Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o7777
}

#[cfg(not(unix))]
fn file_mode(metadata: &Metadata) -> u32 {
    if metadata.permissions().readonly() {
        0o444
    } else {
        0o644
    }
}

fn modified_secs(metadata: &Metadata) -> u64 {
    metadata
        .modified()
        .map(|t| {
            t.duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs()
        })
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, contents: &str) {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn test_archive_root_parse() {
        assert_eq!("bare".parse::<ArchiveRoot>().unwrap(), ArchiveRoot::Bare);
        assert_eq!(".".parse::<ArchiveRoot>().unwrap(), ArchiveRoot::Bare);
        assert_eq!(
            "build".parse::<ArchiveRoot>().unwrap(),
            ArchiveRoot::Named("build".to_string())
        );
        assert!("..".parse::<ArchiveRoot>().is_err());
        assert!("a/b".parse::<ArchiveRoot>().is_err());
    }

    #[test]
    fn test_archive_root_entry_path() {
        let relative = Path::new("sub/b.txt");
        assert_eq!(ArchiveRoot::Bare.entry_path(relative), relative);
        assert_eq!(
            ArchiveRoot::Named("build".to_string()).entry_path(relative),
            PathBuf::from("build/sub/b.txt")
        );
    }

    #[test]
    fn test_missing_context() {
        let err = pack(Path::new("/nonexistent/context/dir")).unwrap_err();
        assert!(matches!(err, BuildError::ContextNotFound(_)));
    }

    #[test]
    fn test_context_is_a_file() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "file", "x");
        let err = pack(&tmp.path().join("file")).unwrap_err();
        assert!(matches!(err, BuildError::ContextNotFound(_)));
    }

    #[test]
    fn test_empty_context() {
        let tmp = TempDir::new().unwrap();
        let archive = pack(tmp.path()).unwrap();
        assert!(archive.entries.is_empty());
        assert_eq!(archive.size(), 1024);
    }

    #[test]
    fn test_entries_sorted_and_dirs_not_recorded() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "z.txt", "z");
        write(tmp.path(), "a.txt", "a");
        write(tmp.path(), "m/inner.txt", "m");
        fs::create_dir(tmp.path().join("empty")).unwrap();

        let archive = pack(tmp.path()).unwrap();
        assert_eq!(archive.names(), vec!["a.txt", "m/inner.txt", "z.txt"]);
    }

    #[test]
    fn test_with_rules_overrides_ignore_file() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), ".dockerignore", "a.txt");
        write(tmp.path(), "a.txt", "a");
        write(tmp.path(), "b.txt", "b");

        let archive = ContextPacker::new(tmp.path())
            .with_rules(IgnoreRuleSet::from_lines(["b.txt"]))
            .pack()
            .unwrap();
        assert_eq!(archive.names(), vec![".dockerignore", "a.txt"]);
    }

    #[test]
    fn test_named_root() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "sub/b.txt", "b");

        let archive = ContextPacker::new(tmp.path())
            .with_root(ArchiveRoot::Named("build".to_string()))
            .pack()
            .unwrap();
        assert_eq!(archive.names(), vec!["build/sub/b.txt"]);
    }

    #[test]
    fn test_digest_format() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "a.txt", "a");
        let archive = pack(tmp.path()).unwrap();
        assert_eq!(archive.digest().len(), 64);
        assert!(archive.prefixed_digest().starts_with("sha256:"));
    }

    #[cfg(unix)]
    #[test]
    fn test_mode_preserved() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "run.sh", "#!/bin/sh");
        fs::set_permissions(tmp.path().join("run.sh"), fs::Permissions::from_mode(0o750))
            .unwrap();

        let archive = pack(tmp.path()).unwrap();
        assert_eq!(archive.entries[0].mode, 0o750);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_recorded_as_link() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "real.txt", "data");
        std::os::unix::fs::symlink("real.txt", tmp.path().join("alias.txt")).unwrap();

        let archive = pack(tmp.path()).unwrap();
        assert_eq!(archive.names(), vec!["alias.txt", "real.txt"]);
        assert!(archive.entries[0].symlink);
        assert_eq!(archive.entries[0].size, 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_file_name_kept_exactly() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let tmp = TempDir::new().unwrap();
        let raw = OsStr::from_bytes(b"caf\xe9.txt");
        // Some filesystems only accept UTF-8 names.
        if fs::write(tmp.path().join(raw), "x").is_err() {
            return;
        }

        let archive = pack(tmp.path()).unwrap();
        assert_eq!(archive.entries[0].name, Path::new(raw));

        let mut reader = tar::Archive::new(archive.bytes.as_slice());
        let entry = reader.entries().unwrap().next().unwrap().unwrap();
        assert_eq!(&*entry.path_bytes(), b"caf\xe9.txt");
    }

    #[cfg(unix)]
    #[test]
    fn test_failed_pack_leaves_writer_untouched() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "a.txt", "a");
        write(tmp.path(), "locked.txt", "secret");
        let locked = tmp.path().join("locked.txt");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        // Only meaningful when the permission bites (not as root).
        if fs::read(&locked).is_err() {
            let mut sink = Vec::new();
            let result = ContextPacker::new(tmp.path()).pack_into(&mut sink);
            assert!(result.is_err());
            assert!(sink.is_empty());
        }

        fs::set_permissions(&locked, fs::Permissions::from_mode(0o644)).unwrap();
    }

    #[test]
    fn test_pack_into_matches_pack() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "a.txt", "a");
        write(tmp.path(), "sub/b.txt", "b");

        let packer = ContextPacker::new(tmp.path());
        let mut sink = Vec::new();
        let (_, entries) = packer.pack_into(&mut sink).unwrap();
        let archive = packer.pack().unwrap();
        assert_eq!(sink, archive.bytes);
        assert_eq!(entries, archive.entries);
    }
}
