//! XDG Base Directory paths for chatscribe.
//!
//! The exporter runs as a long-lived CLI process, so it follows XDG paths
//! on every platform instead of platform-native application directories.

use std::path::{Path, PathBuf};

const APP_NAME: &str = "chatscribe";

/// Get the chatscribe config directory.
///
/// Returns `$XDG_CONFIG_HOME/chatscribe` if set, otherwise `~/.config/chatscribe`.
///
/// # Examples
///
/// ```
/// use chatscribe_paths::config_dir;
///
/// let config_file = config_dir().join("config.toml");
/// ```
pub fn config_dir() -> PathBuf {
    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
        PathBuf::from(xdg_config).join(APP_NAME)
    } else if let Some(home) = dirs::home_dir() {
        home.join(".config").join(APP_NAME)
    } else {
        PathBuf::from(".config").join(APP_NAME)
    }
}

/// Get the chatscribe data directory.
///
/// Returns `$XDG_DATA_HOME/chatscribe` if set, otherwise `~/.local/share/chatscribe`.
pub fn data_dir() -> PathBuf {
    if let Ok(xdg_data) = std::env::var("XDG_DATA_HOME") {
        PathBuf::from(xdg_data).join(APP_NAME)
    } else if let Some(home) = dirs::home_dir() {
        home.join(".local/share").join(APP_NAME)
    } else {
        PathBuf::from(".local/share").join(APP_NAME)
    }
}

/// Default directory transcripts are exported to.
pub fn default_export_dir() -> PathBuf {
    data_dir().join("exports")
}

/// Default location of the signal file external bots touch to request an export.
pub fn default_signal_path() -> PathBuf {
    data_dir().join(".auto_export_signal")
}

/// Expand a leading `~` to the home directory. Other paths are returned as-is.
pub fn expand_home(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), dirs::home_dir()) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}
