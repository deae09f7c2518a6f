use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::Result;

const APP_DIR: &str = "vocab";
const DEFAULT_DB_NAME: &str = "vocab.db";
pub const DEFAULT_ITEMS_KEY: &str = "vocab_items_v1";

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct VocabConfig {
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
    pub srs: SrsConfig,
    pub display: DisplayConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub db_path: String,
    pub items_key: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct SrsConfig {
    /// Cap ease at 3.5 after each passing review.
    pub clamp_max_ease: bool,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DisplayConfig {
    pub recent_words: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: default_data_dir()
                .join(DEFAULT_DB_NAME)
                .to_string_lossy()
                .into_owned(),
            items_key: DEFAULT_ITEMS_KEY.into(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".into(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self { recent_words: 10 }
    }
}

/// Returns `<config_dir>/vocab/`, or `./vocab` when the platform has no
/// config directory.
pub fn default_data_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

/// `VOCAB_CONFIG` if set, else `<config_dir>/vocab/config.toml`.
pub fn default_config_path() -> PathBuf {
    if let Ok(path) = std::env::var("VOCAB_CONFIG") {
        return PathBuf::from(path);
    }
    default_data_dir().join("config.toml")
}

impl VocabConfig {
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides. A missing file
    /// means defaults.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            toml::from_str(&contents)?
        } else {
            info!("no config file at {}, using defaults", path.display());
            VocabConfig::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    // VOCAB_DB, VOCAB_LOG_LEVEL
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("VOCAB_DB") {
            self.storage.db_path = val;
        }
        if let Ok(val) = std::env::var("VOCAB_LOG_LEVEL") {
            self.logging.level = val;
        }
    }

    pub fn resolved_db_path(&self) -> PathBuf {
        expand_tilde(&self.storage.db_path)
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_is_valid() {
        let config = VocabConfig::default();
        assert_eq!(config.logging.level, "warn");
        assert_eq!(config.storage.items_key, "vocab_items_v1");
        assert!(config.storage.db_path.ends_with("vocab.db"));
        assert!(!config.srs.clamp_max_ease);
        assert_eq!(config.display.recent_words, 10);
    }

    #[test]
    fn parse_toml_config() {
        let toml_str = r#"
[storage]
db_path = "/tmp/words.db"

[srs]
clamp_max_ease = true
"#;
        let config: VocabConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.storage.db_path, "/tmp/words.db");
        assert!(config.srs.clamp_max_ease);
        // defaults still apply for unset fields
        assert_eq!(config.storage.items_key, DEFAULT_ITEMS_KEY);
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn load_from_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = VocabConfig::load_from(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.display.recent_words, 10);
    }

    #[test]
    fn load_from_rejects_bad_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[display]\nrecent_words = \"many\"").unwrap();
        assert!(VocabConfig::load_from(file.path()).is_err());
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = VocabConfig::default();
        std::env::set_var("VOCAB_DB", "/tmp/override.db");
        std::env::set_var("VOCAB_LOG_LEVEL", "trace");

        config.apply_env_overrides();

        assert_eq!(config.storage.db_path, "/tmp/override.db");
        assert_eq!(config.logging.level, "trace");

        std::env::remove_var("VOCAB_DB");
        std::env::remove_var("VOCAB_LOG_LEVEL");
    }

    #[test]
    fn expand_tilde_leaves_absolute_paths() {
        assert_eq!(expand_tilde("/var/vocab.db"), PathBuf::from("/var/vocab.db"));
    }
}
