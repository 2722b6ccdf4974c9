//! Continuous import: clipboard polling or signal-file mode

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use tracing::{info, warn};

use crate::config::{ConfigLoader, MonitorMode};
use chatscribe_core::{
    CancellationToken, CaptureSource, ClipboardSource, CycleStats, FileSource, Monitor,
    SignalWatcher,
};

#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Seconds between clipboard polls (clamped to 5..=60)
    #[arg(short, long)]
    pub interval: Option<u64>,

    /// Trigger mode: clipboard_monitor or signal_file
    #[arg(short, long)]
    pub mode: Option<MonitorMode>,

    /// Read captures from this file instead of the clipboard
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// Signal file to watch in signal_file mode
    #[arg(long)]
    pub signal: Option<PathBuf>,
}

pub async fn run(args: WatchArgs) -> Result<()> {
    let config = ConfigLoader::load()?;
    let mode = args.mode.unwrap_or(config.monitor.mode);
    let interval = args.interval.unwrap_or(config.monitor.interval_secs);
    let signal_path = args.signal.unwrap_or_else(|| config.monitor.signal_path.clone());

    let mut importer = super::build_importer(&config);
    let mut source: Box<dyn CaptureSource> = match args.file {
        Some(path) => Box::new(FileSource::new(path)),
        None => Box::new(ClipboardSource::new()),
    };

    println!(
        "Watching {} ({} existing messages in {})",
        source.name(),
        importer.transcript().ledger().len(),
        importer.transcript().path().display()
    );
    println!("Press Ctrl+C to stop.");

    let shutdown = CancellationToken::new();
    let ctrl_c = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, stopping"),
            Err(e) => warn!(error = %e, "Failed to listen for Ctrl+C, stopping"),
        }
        ctrl_c.cancel();
    });

    let stats = match mode {
        MonitorMode::ClipboardMonitor => {
            Monitor::new(interval)
                .run(&mut importer, source.as_mut(), shutdown)
                .await
        }
        MonitorMode::SignalFile => {
            println!("Waiting for signal file {}", signal_path.display());
            SignalWatcher::new(signal_path)
                .run(&mut importer, source.as_mut(), shutdown)
                .await?
        }
    };

    println!("{}", summarize(&stats));
    Ok(())
}

fn summarize(stats: &CycleStats) -> String {
    format!(
        "Stopped after {} cycles: {} messages imported, {} failures",
        stats.cycles, stats.imported, stats.failed
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summarize() {
        let stats = CycleStats {
            cycles: 4,
            imported: 3,
            failed: 1,
        };
        assert_eq!(
            summarize(&stats),
            "Stopped after 4 cycles: 3 messages imported, 1 failures"
        );
    }
}
