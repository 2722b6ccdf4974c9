//! Explain the classifier verdict for a capture

use anyhow::Result;
use clap::Args;

use super::SourceArgs;
use crate::config::ConfigLoader;
use chatscribe_core::{Classification, Classifier};

#[derive(Args, Debug)]
pub struct ClassifyArgs {
    #[command(flatten)]
    pub source: SourceArgs,
}

pub fn run(args: ClassifyArgs) -> Result<()> {
    let config = ConfigLoader::load()?;
    let classifier = Classifier::default().with_threshold(config.classifier.threshold);

    let mut source = args.source.open()?;
    let Some(text) = source.read_text()? else {
        println!("Nothing to classify: {} is empty", source.name());
        return Ok(());
    };

    print!("{}", render(&classifier.classify(&text)));
    Ok(())
}

fn render(verdict: &Classification) -> String {
    let mut out = format!(
        "{} (score {}/{})\n",
        if verdict.accepted { "Chat content" } else { "Not chat content" },
        verdict.score,
        verdict.threshold
    );
    for reason in &verdict.reasons {
        out.push_str(&format!("  - {}\n", reason));
    }
    out
}
