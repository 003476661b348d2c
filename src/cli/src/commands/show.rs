//! `a3s-build show` command — Print the configuration and ignore rules.

use std::path::Path;

use a3s_build_context::load_ignore_rules;
use clap::Args;

use crate::output;

#[derive(Args)]
pub struct ShowArgs {
    /// Skip the ignore rules section
    #[arg(long)]
    pub no_rules: bool,
}

pub async fn execute(
    args: ShowArgs,
    config: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config)?;

    let mut table = output::new_table(&["FIELD", "VALUE"]);
    for (field, value) in config.display_rows() {
        table.add_row(vec![field.to_string(), value]);
    }
    println!("{table}");

    if args.no_rules {
        return Ok(());
    }

    let context_dir = config.context_dir();
    if !context_dir.is_dir() {
        println!();
        println!("Build context {} does not exist.", context_dir.display());
        return Ok(());
    }

    let rules = load_ignore_rules(context_dir)?;
    println!();
    match rules.source() {
        Some(source) => println!("Ignore rules from {}:", source.display()),
        None => println!("No ignore file in {}.", context_dir.display()),
    }
    if !rules.is_empty() {
        let mut table = output::new_table(&["LINE", "RULE"]);
        for pattern in rules.patterns() {
            table.add_row(vec![pattern.line().to_string(), pattern.to_string()]);
        }
        println!("{table}");
    }
    Ok(())
}
