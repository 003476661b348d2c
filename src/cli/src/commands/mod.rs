//! CLI command definitions and dispatch.

mod auth;
mod context;
mod init;
mod show;
mod version;

use std::path::{Path, PathBuf};

use a3s_build_core::{Config, DEFAULT_CONFIG_FILE};
use clap::{Parser, Subcommand};

/// A3S Build: package build contexts from a YAML build config.
#[derive(Parser)]
#[command(name = "a3s-build", version, about)]
pub struct Cli {
    /// Path to the config file (default: ./a3s-build.yml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Subcommand)]
pub enum Command {
    /// Write a commented config template
    Init(init::InitArgs),
    /// Show the loaded configuration and ignore rules
    Show(show::ShowArgs),
    /// Package the build context into a tar archive
    Context(context::ContextArgs),
    /// Print the encoded registry credentials (X-Registry-Auth)
    Auth(auth::AuthArgs),
    /// Show version information
    Version(version::VersionArgs),
}

/// Config file to use: `--config` or the default in the working directory.
pub(crate) fn config_path(explicit: Option<&Path>) -> PathBuf {
    explicit
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
}

/// Load the config file, with a hint when it does not exist.
pub(crate) fn load_config(explicit: Option<&Path>) -> Result<Config, Box<dyn std::error::Error>> {
    let path = config_path(explicit);
    if !path.exists() {
        return Err(format!(
            "Config file {} not found. Run `a3s-build init` to generate one.",
            path.display()
        )
        .into());
    }
    Ok(Config::load(&path)?)
}

/// Dispatch a parsed CLI to the appropriate command handler.
pub async fn dispatch(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = cli.config.as_deref();
    match cli.command {
        Command::Init(args) => init::execute(args, config).await,
        Command::Show(args) => show::execute(args, config).await,
        Command::Context(args) => context::execute(args, config).await,
        Command::Auth(args) => auth::execute(args, config).await,
        Command::Version(args) => version::execute(args).await,
    }
}
