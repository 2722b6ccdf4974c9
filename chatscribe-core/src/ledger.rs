//! Dedup ledger: hashes of every turn already present in the transcript.

use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::hash::TurnHash;
use crate::transcript;

/// In-memory set of seen turn hashes. Only grows, except for explicit reloads.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    seen: HashSet<TurnHash>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the ledger from an existing transcript.
    ///
    /// Never fails: a missing file is the normal first run, and an unreadable
    /// one degrades to an empty ledger with a warning.
    pub fn bootstrap(path: &Path) -> Self {
        let mut ledger = Self::new();
        ledger.load(path);
        ledger
    }

    /// Re-read `path` into this ledger, returning the number of recovered hashes.
    pub fn load(&mut self, path: &Path) -> usize {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "No existing transcript, starting fresh");
                return 0;
            }
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "Failed to read transcript, starting with empty ledger"
                );
                return 0;
            }
        };

        let decoded = transcript::decode(&content);
        let before = self.seen.len();
        for turn in &decoded.turns {
            self.seen.insert(TurnHash::of(turn));
        }
        let recovered = self.seen.len() - before;

        if decoded.skipped > 0 {
            debug!(skipped = decoded.skipped, "Skipped malformed transcript segments");
        }
        info!(
            path = %path.display(),
            recovered,
            "Loaded existing messages"
        );

        recovered
    }

    pub fn seen(&self, hash: &TurnHash) -> bool {
        self.seen.contains(hash)
    }

    /// Record a hash. Returns `false` if it was already present.
    pub fn record(&mut self, hash: TurnHash) -> bool {
        self.seen.insert(hash)
    }

    pub fn clear(&mut self) {
        self.seen.clear();
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
