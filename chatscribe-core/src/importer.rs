//! Classify, parse, dedup, write: one import cycle.

use tracing::{debug, error, info, warn};

use crate::classifier::{Classification, Classifier};
use crate::hash::CaptureHash;
use crate::parser::parse;
use crate::source::CaptureSource;
use crate::transcript::{AppendReport, Transcript};

/// Polled captures shorter than this are ignored outright.
pub const MIN_POLL_CHARS: usize = 20;

/// Whether a capture must pass the classifier before it is parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportMode {
    Classified,
    /// Skip classification; the caller already knows the capture is a chat.
    Forced,
}

/// Result of one import cycle. None of these stop the caller's loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportOutcome {
    /// Nothing (or too little) to read.
    Empty,
    /// Same capture as the last accepted one.
    Unchanged,
    /// Scored below threshold.
    Rejected(Classification),
    Appended(AppendReport),
    /// The source or the transcript failed; already logged.
    Failed(String),
}

impl ImportOutcome {
    pub fn added(&self) -> usize {
        match self {
            ImportOutcome::Appended(report) => report.added,
            _ => 0,
        }
    }
}

/// Importer state owned by one process: classifier, transcript and the
/// hash of the last accepted capture.
#[derive(Debug)]
pub struct Importer {
    classifier: Classifier,
    transcript: Transcript,
    last_capture: Option<CaptureHash>,
}

impl Importer {
    pub fn new(classifier: Classifier, transcript: Transcript) -> Self {
        Self {
            classifier,
            transcript,
            last_capture: None,
        }
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Rebuild the ledger from the transcript on disk.
    pub fn reload(&mut self) -> usize {
        self.transcript.reload()
    }

    /// Run one cycle against `text`.
    pub fn import_text(&mut self, text: &str, mode: ImportMode) -> ImportOutcome {
        if text.trim().is_empty() {
            return ImportOutcome::Empty;
        }

        if mode == ImportMode::Classified {
            let verdict = self.classifier.classify(text);
            if !verdict.accepted {
                debug!(
                    score = verdict.score,
                    threshold = verdict.threshold,
                    "Capture rejected as chat content"
                );
                return ImportOutcome::Rejected(verdict);
            }
            debug!(score = verdict.score, "Chat content detected");
        }

        let turns = parse(text);
        match self.transcript.append(&turns) {
            Ok(report) => ImportOutcome::Appended(report),
            Err(e) => {
                error!(
                    operation = "append",
                    path = %self.transcript.path().display(),
                    error = %e,
                    "Failed to write transcript"
                );
                ImportOutcome::Failed(e.to_string())
            }
        }
    }

    /// Manual trigger: read `source` once and import whatever it holds.
    pub fn import_from<S>(&mut self, source: &mut S, mode: ImportMode) -> ImportOutcome
    where
        S: CaptureSource + ?Sized,
    {
        match source.read_text() {
            Ok(Some(text)) => {
                let outcome = self.import_text(&text, mode);
                if let ImportOutcome::Appended(report) = &outcome {
                    info!(
                        source = source.name(),
                        added = report.added,
                        skipped = report.skipped,
                        "Manual import"
                    );
                }
                outcome
            }
            Ok(None) => ImportOutcome::Empty,
            Err(e) => {
                warn!(operation = "read", source = source.name(), error = %e, "Failed to read capture");
                ImportOutcome::Failed(e.to_string())
            }
        }
    }

    /// One monitor tick: skip empty or unchanged captures, otherwise import.
    ///
    /// The capture hash is remembered only once its turns were written, so a
    /// rejected or failed capture is looked at again on the next tick.
    pub fn poll<S>(&mut self, source: &mut S) -> ImportOutcome
    where
        S: CaptureSource + ?Sized,
    {
        let text = match source.read_text() {
            Ok(Some(text)) => text,
            Ok(None) => return ImportOutcome::Empty,
            Err(e) => {
                warn!(operation = "read", source = source.name(), error = %e, "Failed to read capture");
                return ImportOutcome::Failed(e.to_string());
            }
        };

        if text.chars().count() < MIN_POLL_CHARS {
            return ImportOutcome::Empty;
        }

        let hash = CaptureHash::of(&text);
        if self.last_capture == Some(hash) {
            return ImportOutcome::Unchanged;
        }

        let outcome = self.import_text(&text, ImportMode::Classified);
        if let ImportOutcome::Appended(report) = &outcome {
            self.last_capture = Some(hash);
            if report.added > 0 {
                info!(source = source.name(), added = report.added, "Auto-imported new messages");
            }
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::TextSource;
    use tempfile::TempDir;

    const CHAT: &str = "USER: What is a for-loop?\n\nAGENT: It repeats code. 🔧\n\n## Loop kinds\n\nThere are for-loops, while-loops and loop blocks in Rust.\n\n## Summary\n\nThis paragraph is ordinary prose that pads the capture well past the minimum length.";

    fn importer(dir: &TempDir) -> Importer {
        Importer::new(
            Classifier::default(),
            Transcript::open(dir.path().join("chat.md")),
        )
    }

    #[test]
    fn test_import_twice_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let mut importer = importer(&dir);

        let first = importer.import_text(CHAT, ImportMode::Classified);
        let second = importer.import_text(CHAT, ImportMode::Classified);

        assert_eq!(first.added(), 2);
        assert_eq!(
            second,
            ImportOutcome::Appended(AppendReport { added: 0, skipped: 2 })
        );
    }

    #[test]
    fn test_rejected_capture_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let mut importer = importer(&dir);

        let outcome = importer.import_text("just a short note", ImportMode::Classified);
        assert!(matches!(outcome, ImportOutcome::Rejected(_)));
        assert!(!importer.transcript().path().exists());
    }

    #[test]
    fn test_forced_mode_skips_classifier() {
        let dir = TempDir::new().unwrap();
        let mut importer = importer(&dir);

        let outcome = importer.import_text("USER: hi\nAGENT: hello", ImportMode::Forced);
        assert_eq!(outcome.added(), 2);
    }

    #[test]
    fn test_blank_text_is_empty() {
        let dir = TempDir::new().unwrap();
        let mut importer = importer(&dir);
        assert_eq!(importer.import_text(" \n\t", ImportMode::Forced), ImportOutcome::Empty);
    }

    #[test]
    fn test_poll_skips_unchanged_capture() {
        let dir = TempDir::new().unwrap();
        let mut importer = importer(&dir);
        let mut source = TextSource::new(CHAT);

        assert_eq!(importer.poll(&mut source).added(), 2);
        assert_eq!(importer.poll(&mut source), ImportOutcome::Unchanged);

        source.set(format!("{CHAT}\nUSER: And a while-loop?"));
        assert_eq!(importer.poll(&mut source).added(), 1);
    }

    #[test]
    fn test_poll_ignores_tiny_captures() {
        let dir = TempDir::new().unwrap();
        let mut importer = importer(&dir);
        let mut source = TextSource::new("USER: hi");
        assert_eq!(importer.poll(&mut source), ImportOutcome::Empty);
    }

    #[test]
    fn test_write_failure_is_reported_not_raised() {
        let dir = TempDir::new().unwrap();
        let mut importer = Importer::new(Classifier::default(), Transcript::open(dir.path()));
        let mut source = TextSource::new(CHAT);

        assert!(matches!(importer.poll(&mut source), ImportOutcome::Failed(_)));
        // Not remembered, so the next tick retries
        assert!(matches!(importer.poll(&mut source), ImportOutcome::Failed(_)));
    }
}
