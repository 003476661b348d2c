//! `a3s-build auth` command — Print the encoded registry credentials.

use std::path::Path;

use clap::Args;

#[derive(Args)]
pub struct AuthArgs;

pub async fn execute(
    _args: AuthArgs,
    config: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config)?;
    if config.registry.auth.is_empty() {
        return Err("registry.auth is empty; nothing to encode".into());
    }
    println!("{}", config.registry.encoded_auth()?);
    Ok(())
}
