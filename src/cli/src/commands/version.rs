//! `a3s-build version` command.

use a3s_build_context::IGNORE_FILE_NAME;
use clap::Args;

#[derive(Args)]
pub struct VersionArgs {
    /// Print only the version number
    #[arg(long)]
    pub short: bool,
}

/// Text printed by `a3s-build version`.
fn render(args: &VersionArgs) -> String {
    if args.short {
        return a3s_build_core::VERSION.to_string();
    }
    format!(
        "a3s-build version {}\nIgnore file: {}\nArchive format: tar (GNU headers)",
        a3s_build_core::VERSION,
        IGNORE_FILE_NAME
    )
}

pub async fn execute(args: VersionArgs) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", render(&args));
    Ok(())
}
