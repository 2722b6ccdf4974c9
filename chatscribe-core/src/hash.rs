//! Content digests used for deduplication.
//!
//! Turn hashes are computed over one canonical form, `"<role>\n<text>"`, both
//! when importing and when re-deriving turns from an existing transcript. If
//! those two paths ever disagree, old turns get re-imported after a restart.

use std::fmt;

use sha2::{Digest, Sha256};

use crate::parser::Turn;

fn sha256(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}

/// SHA-256 identity of a [`Turn`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TurnHash([u8; 32]);

impl TurnHash {
    pub fn of(turn: &Turn) -> Self {
        Self(sha256(&[
            turn.role.as_str().as_bytes(),
            b"\n",
            turn.text.as_bytes(),
        ]))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for TurnHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Short form is enough for log lines
        f.write_str(&self.to_hex()[..12])
    }
}

/// SHA-256 of a whole raw capture, used to skip unchanged clipboard content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CaptureHash([u8; 32]);

impl CaptureHash {
    pub fn of(text: &str) -> Self {
        Self(sha256(&[text.as_bytes()]))
    }
}
