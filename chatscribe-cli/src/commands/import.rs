//! Manual import: one classify, parse, dedup, write cycle

use anyhow::Result;
use clap::Args;

use super::SourceArgs;
use crate::config::ConfigLoader;
use chatscribe_core::{ImportMode, ImportOutcome};

#[derive(Args, Debug)]
pub struct ImportArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Import even if the capture does not look like a chat
    #[arg(short, long)]
    pub force: bool,
}

pub fn run(args: ImportArgs) -> Result<()> {
    let config = ConfigLoader::load()?;
    let mut importer = super::build_importer(&config);
    let mut source = args.source.open()?;

    let mode = if args.force {
        ImportMode::Forced
    } else {
        ImportMode::Classified
    };

    match importer.import_from(source.as_mut(), mode) {
        ImportOutcome::Failed(message) => anyhow::bail!("Import failed: {}", message),
        outcome => {
            println!("{}", summarize(&outcome, source.name()));
            if outcome.added() > 0 {
                println!("Saved to {}", importer.transcript().path().display());
            }
            Ok(())
        }
    }
}

fn summarize(outcome: &ImportOutcome, source: &str) -> String {
    match outcome {
        ImportOutcome::Appended(report) => format!(
            "Imported {} new messages ({} duplicates skipped)",
            report.added, report.skipped
        ),
        ImportOutcome::Rejected(verdict) => format!(
            "Not chat content (score {}/{}); use --force to import anyway",
            verdict.score, verdict.threshold
        ),
        ImportOutcome::Empty => format!("Nothing to import: {} is empty", source),
        ImportOutcome::Unchanged => "Nothing new to import".to_string(),
        ImportOutcome::Failed(message) => format!("Import failed: {}", message),
    }
}
