//! Configuration file management command.

use super::common::{config_path, load_config};
use clap::{Args, Subcommand};
use std::path::Path;
use wavesynth_config::{SynthConfig, ensure_user_config_dir};

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Write a configuration file with the default settings
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the effective configuration as TOML
    Show,

    /// Print the configuration file path
    Path,

    /// Validate the configuration file
    Check,
}

pub fn run(args: ConfigArgs, explicit: Option<&Path>) -> anyhow::Result<()> {
    match args.command {
        ConfigCommand::Init { force } => {
            if explicit.is_none() {
                ensure_user_config_dir()?;
            }
            let path = config_path(explicit);
            init_config(&path, force)?;
            println!("Wrote {}", path.display());
        }
        ConfigCommand::Show => {
            let config = load_config(explicit)?;
            print!("{}", config.to_toml()?);
        }
        ConfigCommand::Path => {
            let path = config_path(explicit);
            let status = if path.exists() { "" } else { " (not created)" };
            println!("{}{}", path.display(), status);
        }
        ConfigCommand::Check => {
            load_config(explicit)?;
            println!("Configuration OK: {}", config_path(explicit).display());
        }
    }
    Ok(())
}

fn init_config(path: &Path, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists. Use --force to overwrite.",
            path.display()
        );
    }
    SynthConfig::default().save(path)?;
    Ok(())
}
