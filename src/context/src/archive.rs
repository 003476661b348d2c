//! Tar archive writer for build context entries.
//!
//! Each entry is a GNU tar header followed by its content, padded to
//! 512-byte blocks. Names longer than 100 bytes use GNU long-name records.

use std::io::Write;
use std::path::{Path, PathBuf};

use a3s_build_core::error::{BuildError, Result};
use tar::{Builder, EntryType, Header};

/// Header fields for one archive entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryHeader {
    /// Name inside the archive (relative, stored byte-for-byte)
    pub name: PathBuf,
    /// Permission bits
    pub mode: u32,
    /// Modification time (seconds since epoch)
    pub mtime: u64,
    /// Content size in bytes (0 for links)
    pub size: u64,
    /// Symbolic link instead of a regular file
    pub symlink: bool,
}

/// Append-only archive stream.
///
/// Consumed by [`ArchiveWriter::finish`], which writes the end-of-archive
/// marker and hands back the inner writer.
pub struct ArchiveWriter<W: Write> {
    builder: Builder<W>,
    entries: usize,
}

impl<W: Write> ArchiveWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            builder: Builder::new(writer),
            entries: 0,
        }
    }

    /// Write a regular file. The header size is taken from `contents`.
    pub fn append_file(
        &mut self,
        name: impl AsRef<Path>,
        mode: u32,
        mtime: u64,
        contents: &[u8],
    ) -> Result<EntryHeader> {
        let mut header = Header::new_gnu();
        header.set_entry_type(EntryType::Regular);
        header.set_mode(mode);
        header.set_mtime(mtime);
        header.set_size(contents.len() as u64);

        let name = name.as_ref();
        self.builder
            .append_data(&mut header, name, contents)
            .map_err(|e| {
                BuildError::WriteError(format!("Failed to add {}: {e}", name.display()))
            })?;
        self.entries += 1;

        Ok(EntryHeader {
            name: name.to_path_buf(),
            mode,
            mtime,
            size: contents.len() as u64,
            symlink: false,
        })
    }

    /// Write a symbolic link pointing at `target`, stored verbatim.
    pub fn append_symlink(
        &mut self,
        name: impl AsRef<Path>,
        mode: u32,
        mtime: u64,
        target: &Path,
    ) -> Result<EntryHeader> {
        let mut header = Header::new_gnu();
        header.set_entry_type(EntryType::Symlink);
        header.set_mode(mode);
        header.set_mtime(mtime);
        header.set_size(0);

        let name = name.as_ref();
        self.builder
            .append_link(&mut header, name, target)
            .map_err(|e| {
                BuildError::WriteError(format!("Failed to add link {}: {e}", name.display()))
            })?;
        self.entries += 1;

        Ok(EntryHeader {
            name: name.to_path_buf(),
            mode,
            mtime,
            size: 0,
            symlink: true,
        })
    }

    /// Number of entries written so far.
    pub fn len(&self) -> usize {
        self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries == 0
    }

    /// Seal the archive and return the underlying writer.
    pub fn finish(self) -> Result<W> {
        self.builder
            .into_inner()
            .map_err(|e| BuildError::WriteError(format!("Failed to finalize archive: {e}")))
    }
}
