use crate::output::{print_json, print_yaml};
use anyhow::{bail, Context};
use clap::Subcommand;
use taskboard_core::config::ServerConfig;
use std::path::Path;

// ---------------------------------------------------------------------------
// Subcommand types
// ---------------------------------------------------------------------------

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Write a config file with default values
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the effective configuration
    Show,

    /// Validate the config file
    Validate,
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run(path: &Path, subcmd: ConfigSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        ConfigSubcommand::Init { force } => init(path, force),
        ConfigSubcommand::Show => show(path, json),
        ConfigSubcommand::Validate => validate(path, json),
    }
}

fn init(path: &Path, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }
    ServerConfig::default()
        .save(path)
        .with_context(|| format!("failed to write {}", path.display()))?;
    println!("Wrote {}", path.display());
    Ok(())
}

fn show(path: &Path, json: bool) -> anyhow::Result<()> {
    let config = ServerConfig::load(path).context("failed to load config")?;
    if json {
        print_json(&config)
    } else {
        print_yaml(&config)
    }
}

fn validate(path: &Path, json: bool) -> anyhow::Result<()> {
    let config = ServerConfig::load(path).context("failed to load config")?;
    config.validate()?;
    if json {
        print_json(&serde_json::json!({ "valid": true, "path": path }))?;
    } else {
        println!("Config is valid.");
    }
    Ok(())
}
