use super::types::{
    ClassifierConfig, DEFAULT_HISTORY_FILE, ExportConfig, MonitorConfig, RawClassifierConfig,
    RawExportConfig, RawMonitorConfig, RawScribeConfig, ScribeConfig,
};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load merged configuration (user + project)
    pub fn load() -> Result<ScribeConfig> {
        Self::load_from(&Self::user_config_path(), &Self::project_config_path())
    }

    /// Load and merge the two layers from explicit paths. Missing files are skipped.
    pub fn load_from(user_path: &Path, project_path: &Path) -> Result<ScribeConfig> {
        let mut raw = RawScribeConfig::default();

        // Layer 1: User config
        if user_path.exists() {
            raw = Self::merge_raw(raw, Self::read_raw(user_path)?);
        }

        // Layer 2: Project config
        if project_path.exists() {
            raw = Self::merge_raw(raw, Self::read_raw(project_path)?);
        }

        Ok(Self::finalize(raw))
    }

    /// Get user config path
    pub fn user_config_path() -> PathBuf {
        chatscribe_paths::config_dir().join("config.toml")
    }

    /// Get project config path
    /// Can be overridden with CHATSCRIBE_PROJECT_CONFIG_DIR env var (useful for isolated e2e tests)
    pub fn project_config_path() -> PathBuf {
        if let Ok(dir) = std::env::var("CHATSCRIBE_PROJECT_CONFIG_DIR") {
            PathBuf::from(dir).join("config.toml")
        } else {
            PathBuf::from(".chatscribe/config.toml")
        }
    }

    fn read_raw(path: &Path) -> Result<RawScribeConfig> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        toml::from_str(&contents).with_context(|| format!("Invalid config {}", path.display()))
    }

    /// Merge two raw configs (overlay values override base only if explicitly set)
    fn merge_raw(base: RawScribeConfig, overlay: RawScribeConfig) -> RawScribeConfig {
        RawScribeConfig {
            export: RawExportConfig {
                dir: overlay.export.dir.or(base.export.dir),
                file: overlay.export.file.or(base.export.file),
            },
            monitor: RawMonitorConfig {
                mode: overlay.monitor.mode.or(base.monitor.mode),
                interval_secs: overlay.monitor.interval_secs.or(base.monitor.interval_secs),
                signal_path: overlay.monitor.signal_path.or(base.monitor.signal_path),
            },
            classifier: RawClassifierConfig {
                threshold: overlay.classifier.threshold.or(base.classifier.threshold),
            },
        }
    }

    /// Convert raw config to final config with defaults applied
    fn finalize(raw: RawScribeConfig) -> ScribeConfig {
        let defaults = ScribeConfig::default();
        ScribeConfig {
            export: ExportConfig {
                dir: raw
                    .export
                    .dir
                    .map(|dir| chatscribe_paths::expand_home(&dir))
                    .unwrap_or(defaults.export.dir),
                file: raw
                    .export
                    .file
                    .unwrap_or_else(|| DEFAULT_HISTORY_FILE.to_string()),
            },
            monitor: MonitorConfig {
                mode: raw.monitor.mode.unwrap_or(defaults.monitor.mode),
                interval_secs: raw
                    .monitor
                    .interval_secs
                    .unwrap_or(defaults.monitor.interval_secs),
                signal_path: raw
                    .monitor
                    .signal_path
                    .map(|path| chatscribe_paths::expand_home(&path))
                    .unwrap_or(defaults.monitor.signal_path),
            },
            classifier: ClassifierConfig {
                threshold: raw
                    .classifier
                    .threshold
                    .unwrap_or(defaults.classifier.threshold),
            },
        }
    }

    /// Set one key in the config file at `path`, keeping every other value.
    ///
    /// Creates the file and its parent directories if they don't exist.
    pub fn set_value(path: &Path, key: &str, value: &str) -> Result<()> {
        let mut raw = if path.exists() {
            Self::read_raw(path)?
        } else {
            RawScribeConfig::default()
        };
        raw.set(key, value)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, toml::to_string_pretty(&raw)?)?;

        Ok(())
    }
}
