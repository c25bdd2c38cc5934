use crate::index::BuildOptions;
use crate::new_note::{DEFAULT_CONTENT_TEMPLATE, DEFAULT_FILENAME_TEMPLATE};
use crate::query::recency::DEFAULT_RECENCY_FIELD;
use crate::query::RecencyConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

const APP_NAME: &str = "notefind";
const CONFIG_FILE: &str = "config.json";
const LOG_FILE: &str = "notefind.log";

/// Application configuration stored in the app data directory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub recency: RecencySettings,

    #[serde(default)]
    pub new_note: NewNoteSettings,

    /// Globs selecting note files, relative to the notes root
    #[serde(default = "default_note_globs")]
    pub note_globs: Vec<String>,

    /// Show the preview pane in interactive search
    #[serde(default = "default_show_preview")]
    pub show_preview: bool,

    /// Number of results printed by `filter` when no limit is given
    #[serde(default = "default_filter_limit")]
    pub filter_limit: usize,

    /// Index writer memory budget in megabytes
    #[serde(default = "default_writer_memory_mb")]
    pub writer_memory_mb: usize,
}

/// Recency re-ranking knobs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecencySettings {
    /// Date field whose newest value counts
    #[serde(default = "default_recency_field")]
    pub field: String,

    #[serde(default = "default_half_life_hours")]
    pub half_life_hours: f64,

    /// Weight of recency against the text score
    #[serde(default = "default_recency_boost")]
    pub boost: f32,
}

/// Templates used by the `new` command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewNoteSettings {
    /// Path of a new note relative to the notes root
    #[serde(default = "default_filename_template")]
    pub filename: String,

    /// Initial content of a new note
    #[serde(default = "default_content_template")]
    pub template: String,
}

fn default_filename_template() -> String {
    DEFAULT_FILENAME_TEMPLATE.to_string()
}

fn default_content_template() -> String {
    DEFAULT_CONTENT_TEMPLATE.to_string()
}

impl Default for NewNoteSettings {
    fn default() -> Self {
        Self {
            filename: default_filename_template(),
            template: default_content_template(),
        }
    }
}

fn default_note_globs() -> Vec<String> {
    vec!["*.md".to_string(), "*.markdown".to_string()]
}

fn default_show_preview() -> bool {
    true
}

fn default_filter_limit() -> usize {
    100
}

fn default_writer_memory_mb() -> usize {
    50
}

fn default_recency_field() -> String {
    DEFAULT_RECENCY_FIELD.to_string()
}

fn default_half_life_hours() -> f64 {
    168.0 // 7 days
}

fn default_recency_boost() -> f32 {
    0.1
}

impl Default for RecencySettings {
    fn default() -> Self {
        Self {
            field: default_recency_field(),
            half_life_hours: default_half_life_hours(),
            boost: default_recency_boost(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            recency: RecencySettings::default(),
            new_note: NewNoteSettings::default(),
            note_globs: default_note_globs(),
            show_preview: default_show_preview(),
            filter_limit: default_filter_limit(),
            writer_memory_mb: default_writer_memory_mb(),
        }
    }
}

impl AppConfig {
    /// Load config from the app data directory, or return default if not found
    pub fn load() -> Result<Self> {
        Self::load_from(&get_config_path()?)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let content = fs::read_to_string(config_path)
                .context("Failed to read config file")?;
            let config: AppConfig = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse {}", config_path.display()))?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to the app data directory. An existing file is only
    /// replaced when `overwrite` is set.
    pub fn save(&self, overwrite: bool) -> Result<PathBuf> {
        let config_path = get_config_path()?;
        self.save_to(&config_path, overwrite)?;
        Ok(config_path)
    }

    pub fn save_to(&self, config_path: &Path, overwrite: bool) -> Result<()> {
        let content = serde_json::to_string_pretty(self)
            .context("Failed to serialize config")?;
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .create_new(!overwrite)
            .open(config_path)
            .with_context(|| format!("Failed to write {}", config_path.display()))?;
        file.write_all(content.as_bytes())
            .context("Failed to write config file")?;
        Ok(())
    }

    /// Recency settings as the query compiler wants them.
    /// Negative or non-finite half-lives become zero; half-lives too long
    /// for a `Duration` saturate.
    pub fn recency_config(&self) -> RecencyConfig {
        let hours = self.recency.half_life_hours;
        let half_life = if hours.is_finite() && hours > 0.0 {
            Duration::try_from_secs_f64(hours * 3600.0).unwrap_or(Duration::MAX)
        } else {
            Duration::ZERO
        };
        RecencyConfig {
            field: self.recency.field.clone(),
            half_life,
            boost: self.recency.boost,
        }
    }

    pub fn build_options(&self, show_progress: bool) -> BuildOptions {
        BuildOptions {
            note_globs: self.note_globs.clone(),
            writer_memory_mb: self.writer_memory_mb,
            show_progress,
        }
    }
}

/// Get the path to the config file
pub fn get_config_path() -> Result<PathBuf> {
    let app_dir = get_app_data_dir()?;
    Ok(app_dir.join(CONFIG_FILE))
}

/// Get the path of the log file written while the TUI owns the terminal
pub fn get_log_path() -> Result<PathBuf> {
    let app_dir = get_app_data_dir()?;
    Ok(app_dir.join(LOG_FILE))
}

/// Get the application data directory
pub fn get_app_data_dir() -> Result<PathBuf> {
    let base = if cfg!(target_os = "macos") {
        dirs::home_dir()
            .map(|h| h.join("Library").join("Application Support"))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
    } else {
        // Linux/Unix: use XDG_DATA_HOME or ~/.local/share
        dirs::data_dir()
    };

    let base = base.context("Could not determine app data directory")?;
    let app_dir = base.join(APP_NAME);

    fs::create_dir_all(&app_dir)?;
    Ok(app_dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_config_default() {
        let config = AppConfig::default();
        assert_eq!(config.recency.field, "modified");
        assert_eq!(config.recency.half_life_hours, 168.0);
        assert_eq!(config.note_globs, vec!["*.md", "*.markdown"]);
        assert!(config.show_preview);
        assert_eq!(config.filter_limit, 100);
    }

    #[test]
    fn test_default_recency_matches_compiler_default() {
        assert_eq!(AppConfig::default().recency_config(), RecencyConfig::default());
    }

    #[test]
    fn test_negative_half_life_is_zero() {
        let mut config = AppConfig::default();
        config.recency.half_life_hours = -3.0;
        assert_eq!(config.recency_config().half_life, Duration::ZERO);
    }

    #[test]
    fn test_huge_half_life_saturates() {
        let mut config = AppConfig::default();
        config.recency.half_life_hours = 1e300;
        assert_eq!(config.recency_config().half_life, Duration::MAX);

        config.recency.half_life_hours = f64::MAX;
        assert_eq!(config.recency_config().half_life, Duration::MAX);
    }

    #[test]
    fn test_app_config_serialization() {
        let mut config = AppConfig::default();
        config.recency.boost = 0.5;
        config.note_globs = vec!["*.txt".into()];

        let json = serde_json::to_string(&config).unwrap();
        let parsed: AppConfig = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed, config);
    }

    #[test]
    fn test_app_config_partial_json() {
        // Should use defaults for missing fields
        let json = r#"{"recency": {"boost": 0.3}, "show_preview": false}"#;
        let config: AppConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.recency.boost, 0.3);
        assert_eq!(config.recency.field, "modified");
        assert!(!config.show_preview);
        assert_eq!(config.writer_memory_mb, 50);
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        let mut config = AppConfig::default();
        config.new_note.filename = "inbox/{slug}.md".into();

        config.save_to(&path, false).unwrap();
        assert_eq!(AppConfig::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_save_refuses_to_overwrite_unless_asked() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        AppConfig::default().save_to(&path, false).unwrap();

        let mut changed = AppConfig::default();
        changed.filter_limit = 7;
        assert!(changed.save_to(&path, false).is_err());
        assert_eq!(AppConfig::load_from(&path).unwrap().filter_limit, 100);

        changed.save_to(&path, true).unwrap();
        assert_eq!(AppConfig::load_from(&path).unwrap().filter_limit, 7);
    }

    #[test]
    fn test_load_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_from(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_app_config_empty_json() {
        let config: AppConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, AppConfig::default());
    }
}
