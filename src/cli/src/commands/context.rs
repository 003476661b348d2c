//! `a3s-build context` command — Package the build context.
//!
//! Packs the context directory (`image.path` from the config, or `--dir`)
//! into a tar archive, honoring its `.dockerignore`.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use a3s_build_context::{ArchiveRoot, ContextArchive, ContextPacker};
use clap::Args;
use flate2::write::GzEncoder;
use flate2::Compression;

use crate::output;

#[derive(Args)]
pub struct ContextArgs {
    /// Context directory (default: image.path from the config)
    #[arg(short, long)]
    pub dir: Option<PathBuf>,

    /// Write the archive to FILE
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Gzip the archive written to --output
    #[arg(long, requires = "output")]
    pub gzip: bool,

    /// Top-level directory for entries: "bare" or a directory name
    #[arg(long, default_value = "bare")]
    pub root: ArchiveRoot,

    /// List the packed entries
    #[arg(short, long)]
    pub list: bool,
}

pub async fn execute(
    args: ContextArgs,
    config: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let context_dir = match args.dir {
        Some(dir) => dir,
        None => super::load_config(config)?.context_dir().to_path_buf(),
    };

    let packer = ContextPacker::new(context_dir.clone()).with_root(args.root);
    let archive = tokio::task::spawn_blocking(move || packer.pack()).await??;

    if let Some(ref path) = args.output {
        write_archive(&archive, path, args.gzip)
            .map_err(|e| format!("Failed to write {}: {}", path.display(), e))?;
    }

    if args.list {
        let mut table = output::new_table(&["MODE", "SIZE", "MODIFIED", "NAME"]);
        for entry in &archive.entries {
            table.add_row(vec![
                output::format_mode(entry.mode, entry.symlink),
                entry.size.to_string(),
                output::format_timestamp(entry.mtime),
                entry.name.display().to_string(),
            ]);
        }
        println!("{table}");
    }

    println!(
        "Packed {} entries ({}) from {}",
        archive.entries.len(),
        output::format_bytes(archive.size()),
        context_dir.display()
    );
    println!("{}", archive.prefixed_digest());
    if let Some(ref path) = args.output {
        println!("Wrote {}", path.display());
    }
    Ok(())
}

/// Write the archive, optionally gzip-compressed.
fn write_archive(archive: &ContextArchive, path: &Path, gzip: bool) -> std::io::Result<()> {
    let file = File::create(path)?;
    if gzip {
        let mut encoder = GzEncoder::new(file, Compression::default());
        encoder.write_all(&archive.bytes)?;
        encoder.finish()?.sync_all()
    } else {
        let mut file = file;
        file.write_all(&archive.bytes)?;
        file.sync_all()
    }
}
