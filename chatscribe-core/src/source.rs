//! Where raw captures come from.

use std::io::ErrorKind;
use std::path::PathBuf;

use arboard::Clipboard;
use tracing::debug;

use crate::error::{Result, ScribeError};

/// A snapshot provider polled by the importer.
pub trait CaptureSource {
    /// Short name for log lines.
    fn name(&self) -> &'static str;

    /// Current content, or `None` when there is nothing textual to read.
    fn read_text(&mut self) -> Result<Option<String>>;
}

/// The system clipboard.
///
/// The handle is opened lazily and dropped after an error so the next read
/// reconnects.
#[derive(Default)]
pub struct ClipboardSource {
    clipboard: Option<Clipboard>,
}

impl ClipboardSource {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CaptureSource for ClipboardSource {
    fn name(&self) -> &'static str {
        "clipboard"
    }

    fn read_text(&mut self) -> Result<Option<String>> {
        if self.clipboard.is_none() {
            let clipboard = Clipboard::new()
                .map_err(|e| ScribeError::Clipboard(format!("Failed to access clipboard: {}", e)))?;
            self.clipboard = Some(clipboard);
        }
        let Some(clipboard) = self.clipboard.as_mut() else {
            return Ok(None);
        };

        match clipboard.get_text() {
            Ok(text) => Ok(Some(text)),
            Err(arboard::Error::ContentNotAvailable) => Ok(None),
            Err(e) => {
                self.clipboard = None;
                Err(ScribeError::Clipboard(format!(
                    "Failed to read clipboard: {}",
                    e
                )))
            }
        }
    }
}

/// A text file, re-read on every poll. A missing file reads as empty.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CaptureSource for FileSource {
    fn name(&self) -> &'static str {
        "file"
    }

    fn read_text(&mut self) -> Result<Option<String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "Capture file not found");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Fixed text, e.g. read once from stdin.
#[derive(Debug, Clone, Default)]
pub struct TextSource {
    text: Option<String>,
}

impl TextSource {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
        }
    }

    /// Replace the content returned by subsequent reads.
    pub fn set(&mut self, text: impl Into<String>) {
        self.text = Some(text.into());
    }
}

impl CaptureSource for TextSource {
    fn name(&self) -> &'static str {
        "text"
    }

    fn read_text(&mut self) -> Result<Option<String>> {
        Ok(self.text.clone())
    }
}
