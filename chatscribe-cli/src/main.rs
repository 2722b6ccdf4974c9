use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod config;

#[derive(Parser)]
#[command(name = "chatscribe", about = "Import chat transcripts from the clipboard")]
#[command(version, propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Score a capture and show why it was accepted or rejected
    Classify(commands::classify::ClassifyArgs),
    /// Manage configuration
    Config(commands::config::ConfigArgs),
    /// Import the current capture once
    Import(commands::import::ImportArgs),
    /// Re-scan the transcript and report how many messages it holds
    Reload,
    /// Watch the clipboard (or signal file) and import continuously
    Watch(commands::watch::WatchArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Classify(args) => commands::classify::run(args),
        Commands::Config(args) => commands::config::run(args),
        Commands::Import(args) => commands::import::run(args),
        Commands::Reload => commands::reload::run(),
        Commands::Watch(args) => commands::watch::run(args).await,
    }
}
