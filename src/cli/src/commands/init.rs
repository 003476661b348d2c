//! `a3s-build init` command — Write a commented config template.

use std::path::Path;

use a3s_build_core::{render_template, Config};
use clap::Args;

#[derive(Args)]
pub struct InitArgs {
    /// Overwrite an existing config file
    #[arg(short, long)]
    pub force: bool,
}

pub async fn execute(
    args: InitArgs,
    config: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let path = super::config_path(config);
    if path.exists() && !args.force {
        return Err(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )
        .into());
    }

    let rendered = render_template(&Config::default());
    std::fs::write(&path, rendered)
        .map_err(|e| format!("Failed to write {}: {}", path.display(), e))?;

    tracing::debug!(path = %path.display(), "Wrote config template");
    println!(
        "Created {}. Edit it to describe your image.",
        path.display()
    );
    Ok(())
}
