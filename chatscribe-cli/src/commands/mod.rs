pub mod classify;
pub mod config;
pub mod import;
pub mod reload;
pub mod watch;

use std::io::Read;
use std::path::PathBuf;

use anyhow::Result;
use chatscribe_core::{
    CaptureSource, Classifier, ClipboardSource, FileSource, Importer, TextSource, Transcript,
};
use clap::Args;

use crate::config::ScribeConfig;

/// Where a one-shot command reads its capture from (clipboard by default)
#[derive(Args, Debug, Default)]
pub struct SourceArgs {
    /// Read the capture from a file instead of the clipboard
    #[arg(long, conflicts_with = "stdin")]
    pub file: Option<PathBuf>,

    /// Read the capture from standard input
    #[arg(long)]
    pub stdin: bool,
}

impl SourceArgs {
    pub fn open(&self) -> Result<Box<dyn CaptureSource>> {
        if let Some(path) = &self.file {
            return Ok(Box::new(FileSource::new(path)));
        }
        if self.stdin {
            let mut text = String::new();
            std::io::stdin().read_to_string(&mut text)?;
            return Ok(Box::new(TextSource::new(text)));
        }
        Ok(Box::new(ClipboardSource::new()))
    }
}

/// Build the importer described by `config`, bootstrapping its ledger
pub fn build_importer(config: &ScribeConfig) -> Importer {
    let classifier = Classifier::default().with_threshold(config.classifier.threshold);
    Importer::new(classifier, Transcript::open(config.transcript_path()))
}
