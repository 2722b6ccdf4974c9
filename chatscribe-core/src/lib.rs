//! chatscribe-core: clipboard chat importer
//!
//! Detects chat transcripts in captured text, splits them into role-tagged
//! turns, and appends the turns not seen before to a Markdown transcript.
//!
//! - **Classification** - [`Classifier`] scores a capture with weighted [`Rule`]s
//! - **Parsing** - [`parse`] turns accepted text into [`Turn`]s
//! - **Deduplication** - [`Ledger`] holds a [`TurnHash`] per stored turn
//! - **Persistence** - [`Transcript`] appends new turns in a single write
//! - **Driving** - [`Importer`] ties these together; [`Monitor`] polls a
//!   [`CaptureSource`] on an interval and [`SignalWatcher`] reacts to a
//!   signal file
//!
//! # Quick Start
//!
//! ```no_run
//! use chatscribe_core::{Classifier, ImportMode, Importer, Transcript};
//!
//! let transcript = Transcript::open("exports/Chat_Conversation.md");
//! let mut importer = Importer::new(Classifier::default(), transcript);
//!
//! let outcome = importer.import_text("USER: hi\nAGENT: hello", ImportMode::Forced);
//! println!("added {}", outcome.added());
//! ```

pub mod classifier;
pub mod error;
pub mod hash;
pub mod importer;
pub mod ledger;
pub mod monitor;
pub mod parser;
pub mod signal;
pub mod source;
pub mod transcript;

pub use classifier::{Classification, Classifier, Rule, RuleHit, Signals, Weight};
pub use error::{Result, ScribeError};
pub use hash::{CaptureHash, TurnHash};
pub use importer::{ImportMode, ImportOutcome, Importer};
pub use ledger::Ledger;
pub use monitor::{clamp_interval, CycleStats, Monitor};
pub use parser::{parse, Role, Turn};
pub use signal::SignalWatcher;
pub use source::{CaptureSource, ClipboardSource, FileSource, TextSource};
pub use transcript::{AppendReport, Transcript};
pub use tokio_util::sync::CancellationToken;
