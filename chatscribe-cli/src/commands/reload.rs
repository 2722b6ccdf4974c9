//! Re-scan the transcript

use anyhow::Result;

use crate::config::ConfigLoader;

pub fn run() -> Result<()> {
    let config = ConfigLoader::load()?;
    let importer = super::build_importer(&config);
    let transcript = importer.transcript();

    println!(
        "Reloaded {} existing messages from {}",
        transcript.ledger().len(),
        transcript.path().display()
    );
    Ok(())
}
