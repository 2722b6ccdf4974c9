use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use chatscribe_core::classifier::DEFAULT_THRESHOLD;
use chatscribe_core::monitor::DEFAULT_INTERVAL_SECS;

/// Default transcript file name
pub const DEFAULT_HISTORY_FILE: &str = "Chat_Conversation.md";

/// Keys accepted by `chatscribe config set`
pub const SETTABLE_KEYS: &[&str] = &[
    "export.dir",
    "export.file",
    "monitor.mode",
    "monitor.interval_secs",
    "monitor.signal_path",
    "classifier.threshold",
];

/// How `chatscribe watch` decides when to import
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonitorMode {
    /// Poll the clipboard and classify what is there
    #[default]
    ClipboardMonitor,
    /// Import whenever an external tool creates the signal file
    SignalFile,
}

impl std::str::FromStr for MonitorMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "clipboard_monitor" | "clipboard" => Ok(Self::ClipboardMonitor),
            "signal_file" | "signal" => Ok(Self::SignalFile),
            other => bail!("unknown monitor mode '{}' (expected clipboard_monitor or signal_file)", other),
        }
    }
}

/// Configuration as stored in TOML files (with optional fields for merging)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawScribeConfig {
    #[serde(default)]
    pub export: RawExportConfig,

    #[serde(default)]
    pub monitor: RawMonitorConfig,

    #[serde(default)]
    pub classifier: RawClassifierConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawExportConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawMonitorConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<MonitorMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval_secs: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signal_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawClassifierConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold: Option<i32>,
}

impl RawScribeConfig {
    /// Set one dotted key from its string form
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "export.dir" => self.export.dir = Some(PathBuf::from(value)),
            "export.file" => {
                if value.trim().is_empty() {
                    bail!("export.file must not be empty");
                }
                self.export.file = Some(value.to_string());
            }
            "monitor.mode" => self.monitor.mode = Some(value.parse()?),
            "monitor.interval_secs" => {
                let secs: u64 = value
                    .parse()
                    .map_err(|e| anyhow::anyhow!("invalid interval '{}': {}", value, e))?;
                self.monitor.interval_secs = Some(secs);
            }
            "monitor.signal_path" => self.monitor.signal_path = Some(PathBuf::from(value)),
            "classifier.threshold" => {
                let threshold: i32 = value
                    .parse()
                    .map_err(|e| anyhow::anyhow!("invalid threshold '{}': {}", value, e))?;
                self.classifier.threshold = Some(threshold);
            }
            other => bail!(
                "unknown config key '{}' (expected one of: {})",
                other,
                SETTABLE_KEYS.join(", ")
            ),
        }
        Ok(())
    }
}

/// Final configuration with defaults applied
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScribeConfig {
    pub export: ExportConfig,
    pub monitor: MonitorConfig,
    pub classifier: ClassifierConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Directory the transcript lives in
    pub dir: PathBuf,
    /// Transcript file name
    pub file: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorConfig {
    pub mode: MonitorMode,
    /// Poll interval, clamped to 5..=60 when the monitor starts
    pub interval_secs: u64,
    /// Signal file watched in `signal_file` mode
    pub signal_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierConfig {
    pub threshold: i32,
}

impl Default for ScribeConfig {
    fn default() -> Self {
        Self {
            export: ExportConfig {
                dir: chatscribe_paths::default_export_dir(),
                file: DEFAULT_HISTORY_FILE.to_string(),
            },
            monitor: MonitorConfig {
                mode: MonitorMode::default(),
                interval_secs: DEFAULT_INTERVAL_SECS,
                signal_path: chatscribe_paths::default_signal_path(),
            },
            classifier: ClassifierConfig {
                threshold: DEFAULT_THRESHOLD,
            },
        }
    }
}

impl ScribeConfig {
    /// Full path of the transcript file
    pub fn transcript_path(&self) -> PathBuf {
        self.export.dir.join(&self.export.file)
    }
}
