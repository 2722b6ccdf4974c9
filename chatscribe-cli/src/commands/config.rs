use crate::config::ConfigLoader;
use anyhow::Result;
use clap::{Args, Subcommand};

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show current configuration (merged)
    Show,
    /// Show configuration file paths
    Path,
    /// Set a value in the user config file
    Set {
        /// Dotted key, e.g. monitor.interval_secs
        key: String,
        /// New value
        value: String,
    },
}

pub fn run(args: ConfigArgs) -> Result<()> {
    match args.command {
        ConfigCommands::Show => show_config(),
        ConfigCommands::Path => show_paths(),
        ConfigCommands::Set { key, value } => set_value(&key, &value),
    }
}

fn show_config() -> Result<()> {
    let config = ConfigLoader::load()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{}", toml_str);
    println!("# transcript: {}", config.transcript_path().display());
    Ok(())
}

fn show_paths() -> Result<()> {
    println!("User config:    {}", ConfigLoader::user_config_path().display());
    println!("Project config: {}", ConfigLoader::project_config_path().display());
    Ok(())
}

fn set_value(key: &str, value: &str) -> Result<()> {
    let path = ConfigLoader::user_config_path();
    ConfigLoader::set_value(&path, key, value)?;
    println!("Configuration updated: {} = {}", key, value);
    println!("  in {}", path.display());
    Ok(())
}
