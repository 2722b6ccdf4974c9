//! Signal-file watcher for external bots.
//!
//! An external automation copies the chat to the clipboard and then creates
//! a signal file. The watcher notices the file, waits for the clipboard to
//! settle, imports the capture without classifying it, and deletes the file.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{recommended_watcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{Result, ScribeError};
use crate::importer::{ImportMode, ImportOutcome, Importer};
use crate::monitor::CycleStats;
use crate::source::CaptureSource;

/// Captures this short are not worth importing even when signalled.
pub const MIN_SIGNAL_CHARS: usize = 10;

const DEFAULT_SETTLE: Duration = Duration::from_millis(500);

/// Watches for a signal file and imports on every appearance.
#[derive(Debug, Clone)]
pub struct SignalWatcher {
    signal_path: PathBuf,
    settle: Duration,
}

impl SignalWatcher {
    pub fn new(signal_path: impl Into<PathBuf>) -> Self {
        Self {
            signal_path: signal_path.into(),
            settle: DEFAULT_SETTLE,
        }
    }

    /// Delay between seeing the signal and reading the source.
    #[must_use]
    pub fn with_settle(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    pub fn signal_path(&self) -> &Path {
        &self.signal_path
    }

    fn file_name(&self) -> Result<OsString> {
        self.signal_path
            .file_name()
            .map(ToOwned::to_owned)
            .ok_or_else(|| {
                ScribeError::Config(format!(
                    "signal path has no file name: {}",
                    self.signal_path.display()
                ))
            })
    }

    fn watch_dir(&self) -> PathBuf {
        match self.signal_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    /// Run until `shutdown` is cancelled or the watcher channel closes.
    ///
    /// A signal file already present at startup is handled right away.
    pub async fn run<S>(
        &self,
        importer: &mut Importer,
        source: &mut S,
        shutdown: CancellationToken,
    ) -> Result<CycleStats>
    where
        S: CaptureSource + ?Sized,
    {
        let file_name = self.file_name()?;
        let watch_dir = self.watch_dir();
        std::fs::create_dir_all(&watch_dir)?;

        let (tx, mut rx) = mpsc::channel::<notify::Result<notify::Event>>(100);
        let mut watcher = recommended_watcher(move |event| {
            // Runs on the notify thread
            let _ = tx.blocking_send(event);
        })?;
        watcher.watch(&watch_dir, RecursiveMode::NonRecursive)?;

        info!(path = %self.signal_path.display(), "Signal watcher started");
        let mut stats = CycleStats::default();

        if self.signal_path.exists() {
            self.handle_signal(importer, source, &mut stats);
        }

        loop {
            tokio::select! {
                biased;

                _ = shutdown.cancelled() => {
                    info!("Signal watcher received shutdown signal");
                    break;
                }
                event = rx.recv() => {
                    let Some(event) = event else {
                        // Channel closed
                        break;
                    };
                    match event {
                        Ok(event) => {
                            let touches_signal = event
                                .paths
                                .iter()
                                .any(|p| p.file_name() == Some(file_name.as_os_str()));
                            if !touches_signal || !self.signal_path.exists() {
                                continue;
                            }

                            debug!(kind = ?event.kind, "Signal detected");
                            tokio::select! {
                                _ = shutdown.cancelled() => break,
                                _ = tokio::time::sleep(self.settle) => {}
                            }
                            self.handle_signal(importer, source, &mut stats);
                        }
                        Err(e) => warn!(error = %e, "Watch error"),
                    }
                }
            }
        }

        info!(
            cycles = stats.cycles,
            imported = stats.imported,
            "Signal watcher stopped"
        );
        Ok(stats)
    }

    fn handle_signal<S>(&self, importer: &mut Importer, source: &mut S, stats: &mut CycleStats)
    where
        S: CaptureSource + ?Sized,
    {
        let outcome = match source.read_text() {
            Ok(Some(text)) if text.chars().count() > MIN_SIGNAL_CHARS => {
                importer.import_text(&text, ImportMode::Forced)
            }
            Ok(_) => ImportOutcome::Empty,
            Err(e) => {
                warn!(operation = "read", source = source.name(), error = %e, "Failed to read capture");
                ImportOutcome::Failed(e.to_string())
            }
        };

        if outcome.added() > 0 {
            info!(added = outcome.added(), "Auto-exported new messages");
        }
        stats.record(&outcome);

        if let Err(e) = std::fs::remove_file(&self.signal_path) {
            debug!(error = %e, "Failed to remove signal file");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::Classifier;
    use crate::source::TextSource;
    use crate::transcript::Transcript;
    use tempfile::TempDir;

    fn importer(dir: &TempDir) -> Importer {
        Importer::new(
            Classifier::default(),
            Transcript::open(dir.path().join("chat.md")),
        )
    }

    #[test]
    fn test_signal_path_without_file_name_is_rejected() {
        let watcher = SignalWatcher::new("/");
        assert!(matches!(watcher.file_name(), Err(ScribeError::Config(_))));
    }

    #[test]
    fn test_watch_dir_defaults_to_current_dir() {
        assert_eq!(SignalWatcher::new("signal").watch_dir(), PathBuf::from("."));
        assert_eq!(
            SignalWatcher::new("/tmp/x/signal").watch_dir(),
            PathBuf::from("/tmp/x")
        );
    }

    #[tokio::test]
    async fn test_existing_signal_is_handled_at_startup() {
        let dir = TempDir::new().unwrap();
        let signal = dir.path().join("signals/.auto_export_signal");
        std::fs::create_dir_all(signal.parent().unwrap()).unwrap();
        std::fs::write(&signal, "").unwrap();

        let mut importer = importer(&dir);
        // Too short for the classifier, but signalled imports skip it
        let mut source = TextSource::new("USER: hi there\nAGENT: hello");
        let shutdown = CancellationToken::new();
        shutdown.cancel();

        let stats = SignalWatcher::new(&signal)
            .run(&mut importer, &mut source, shutdown)
            .await
            .unwrap();

        assert_eq!(stats.imported, 2);
        assert!(!signal.exists());
    }

    #[tokio::test]
    async fn test_short_capture_is_ignored() {
        let dir = TempDir::new().unwrap();
        let signal = dir.path().join(".auto_export_signal");
        std::fs::write(&signal, "").unwrap();

        let mut importer = importer(&dir);
        let mut source = TextSource::new("USER: hi");
        let shutdown = CancellationToken::new();
        shutdown.cancel();

        let stats = SignalWatcher::new(&signal)
            .run(&mut importer, &mut source, shutdown)
            .await
            .unwrap();

        assert_eq!(stats.imported, 0);
        assert_eq!(stats.cycles, 1);
        // Consumed even when nothing was imported
        assert!(!signal.exists());
    }

    #[tokio::test]
    async fn test_signal_created_while_watching() {
        let dir = TempDir::new().unwrap();
        let signal = dir.path().join(".auto_export_signal");
        let mut importer = importer(&dir);
        let mut source = TextSource::new("USER: ping from the bot\nAGENT: pong");
        let shutdown = CancellationToken::new();

        let watcher = SignalWatcher::new(&signal).with_settle(Duration::from_millis(10));
        let trigger = {
            let signal = signal.clone();
            let shutdown = shutdown.clone();
            async move {
                tokio::time::sleep(Duration::from_millis(200)).await;
                std::fs::write(&signal, "go").unwrap();
                for _ in 0..100 {
                    if !signal.exists() {
                        break;
                    }
                    tokio::time::sleep(Duration::from_millis(50)).await;
                }
                shutdown.cancel();
            }
        };

        let (stats, ()) = tokio::join!(
            watcher.run(&mut importer, &mut source, shutdown.clone()),
            trigger
        );
        let stats = stats.unwrap();

        assert_eq!(stats.imported, 2);
        assert!(!signal.exists());
        assert!(dir.path().join("chat.md").exists());
    }
}
