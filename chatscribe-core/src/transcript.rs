//! Append-only transcript file.
//!
//! Layout:
//!
//! ```text
//! # Chat Conversation
//!
//! Note: _<disclaimer>_
//!
//! ### User Input
//!
//! <user turn>
//!
//! <agent turn>
//!
//! ```
//!
//! Turns are stored in canonical form (no blank lines inside a turn), so
//! blank lines separate turns and the file can be decoded back into the
//! exact turns that were written. An agent turn that would read as a user
//! header is written with a leading `\`.

use std::collections::HashSet;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::Result;
use crate::hash::TurnHash;
use crate::ledger::Ledger;
use crate::parser::{canonical_text, Role, Turn};

pub const DOCUMENT_TITLE: &str = "# Chat Conversation";

pub const DOCUMENT_NOTE: &str = "Note: _This is purely the output of the chat conversation and does not contain any raw data, codebase snippets, etc. used to generate the output._";

pub const USER_HEADER: &str = "### User Input";

/// Outcome of one [`Transcript::append`] batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AppendReport {
    pub added: usize,
    /// Turns not written: already in the ledger, repeated in the batch, or empty.
    pub skipped: usize,
}

/// Turns recovered from transcript text.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Decoded {
    pub turns: Vec<Turn>,
    pub skipped: usize,
}

fn document_header() -> String {
    format!("{DOCUMENT_TITLE}\n\n{DOCUMENT_NOTE}\n\n")
}

/// Leading character that keeps an agent block from reading as a header.
const ESCAPE: char = '\\';

const NOTE_PREFIX: &str = "Note: _";

fn first_line(text: &str) -> &str {
    text.split('\n').next().unwrap_or_default()
}

fn needs_escape(text: &str) -> bool {
    text.starts_with(ESCAPE) || first_line(text) == USER_HEADER
}

/// Render one canonical turn as it appears in the file.
///
/// An agent turn whose first line is the user header (or that already starts
/// with the escape character) gets one leading `\` so it decodes as agent text.
pub fn render(turn: &Turn) -> String {
    match turn.role {
        Role::User => format!("{USER_HEADER}\n\n{}\n\n", turn.text),
        Role::Agent if needs_escape(&turn.text) => format!("{ESCAPE}{}\n\n", turn.text),
        Role::Agent => format!("{}\n\n", turn.text),
    }
}

/// Decode transcript text back into turns.
///
/// A block whose first line is exactly `### User Input` marks a user turn:
/// either the rest of that block or, when the header stands alone, the next
/// block. Every other block is an agent turn, minus one leading escape.
/// The title and the note right after it are skipped only at the top of the
/// file. A header with nothing after it is counted in `skipped`.
pub fn decode(content: &str) -> Decoded {
    let content = content.replace("\r\n", "\n");
    let blocks: Vec<String> = content
        .split("\n\n")
        .map(canonical_text)
        .filter(|block| !block.is_empty())
        .collect();

    let mut start = 0;
    if blocks.first().is_some_and(|block| block == DOCUMENT_TITLE) {
        start = 1;
        if blocks.get(1).is_some_and(|block| block.starts_with(NOTE_PREFIX)) {
            start = 2;
        }
    }

    let mut decoded = Decoded::default();
    let mut expecting_user = false;

    for block in blocks.into_iter().skip(start) {
        if expecting_user {
            decoded.turns.push(Turn::user(block));
            expecting_user = false;
            continue;
        }

        if first_line(&block) == USER_HEADER {
            match block.split_once('\n') {
                Some((_, rest)) => decoded.turns.push(Turn::user(rest)),
                None => expecting_user = true,
            }
            continue;
        }

        let text = block.strip_prefix(ESCAPE).unwrap_or(&block);
        decoded.turns.push(Turn::agent(text));
    }

    if expecting_user {
        debug!("Transcript ends with an empty user block");
        decoded.skipped += 1;
    }

    decoded
}

/// The persisted conversation plus the ledger guarding it.
///
/// No file handle is kept between batches.
#[derive(Debug)]
pub struct Transcript {
    path: PathBuf,
    ledger: Ledger,
}

impl Transcript {
    /// Open (without creating) a transcript, bootstrapping its ledger.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let ledger = Ledger::bootstrap(&path);
        Self { path, ledger }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Drop the in-memory ledger and rebuild it from disk.
    pub fn reload(&mut self) -> usize {
        self.ledger.clear();
        self.ledger.load(&self.path)
    }

    /// Append the turns not seen before, in order, with a single write.
    ///
    /// Hashes are recorded only after the write succeeds, so a failed batch
    /// is retried in full next time.
    pub fn append(&mut self, turns: &[Turn]) -> Result<AppendReport> {
        let mut report = AppendReport::default();
        let mut body = String::new();
        let mut fresh = Vec::new();
        let mut in_batch = HashSet::new();

        for turn in turns {
            let turn = turn.canonical();
            if turn.text.is_empty() {
                report.skipped += 1;
                continue;
            }

            let hash = TurnHash::of(&turn);
            if self.ledger.seen(&hash) || !in_batch.insert(hash) {
                debug!(%hash, role = %turn.role, "Skipping duplicate turn");
                report.skipped += 1;
                continue;
            }

            body.push_str(&render(&turn));
            fresh.push(hash);
        }

        if fresh.is_empty() {
            return Ok(report);
        }

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let mut chunk = if file.metadata()?.len() == 0 {
            document_header()
        } else {
            String::new()
        };
        chunk.push_str(&body);
        file.write_all(chunk.as_bytes())?;
        file.flush()?;

        report.added = fresh.len();
        for hash in fresh {
            self.ledger.record(hash);
        }

        info!(
            path = %self.path.display(),
            added = report.added,
            skipped = report.skipped,
            "Appended turns to transcript"
        );

        Ok(report)
    }
}
