//! Application configuration
//!
//! Configuration is loaded from:
//! 1. Default values
//! 2. Config file (~/.config/shoplist/config.toml)
//! 3. Environment variables (SHOPLIST_* prefix)
//!
//! Environment variables take precedence over config file values.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable prefix
const ENV_PREFIX: &str = "SHOPLIST";

/// Key the list collection is stored under
pub const DEFAULT_STORAGE_KEY: &str = "shopping_lists";

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory for the settings store
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Key the serialized lists are written under
    #[serde(default = "default_storage_key")]
    pub storage_key: String,

    /// Log level for the CLI (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Apply dictation autocorrection to new item names
    #[serde(default = "default_autocorrect")]
    pub autocorrect: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            storage_key: default_storage_key(),
            log_level: default_log_level(),
            autocorrect: default_autocorrect(),
        }
    }
}

impl Config {
    /// Load configuration from default location and environment
    ///
    /// Order of precedence (highest to lowest):
    /// 1. Environment variables (SHOPLIST_DATA_DIR, SHOPLIST_STORAGE_KEY, SHOPLIST_LOG_LEVEL)
    /// 2. Config file (~/.config/shoplist/config.toml or SHOPLIST_CONFIG)
    /// 3. Default values
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::config_file_path())
    }

    /// Load from `path` when given (the CLI's `--config`), else the default location
    pub fn load_with_cli_override(path: Option<&PathBuf>) -> Result<Self> {
        match path {
            Some(p) => Self::load_from_path(p),
            None => Self::load(),
        }
    }

    /// Load configuration from a specific path
    ///
    /// Environment variables are still applied as overrides.
    /// If the file doesn't exist, defaults are used.
    pub fn load_from_path(path: &PathBuf) -> Result<Self> {
        if !path.exists() {
            let mut config = Self::default();
            config.apply_env_overrides();
            return Ok(config);
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        Self::load_from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    /// Load configuration from a TOML string
    ///
    /// Environment variables are applied as overrides.
    pub fn load_from_str(toml_content: &str) -> Result<Self> {
        let mut config: Config =
            toml::from_str(toml_content).context("Failed to parse config TOML")?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var(format!("{}_DATA_DIR", ENV_PREFIX)) {
            self.data_dir = PathBuf::from(val);
        }

        if let Ok(val) = std::env::var(format!("{}_STORAGE_KEY", ENV_PREFIX)) {
            if !val.is_empty() {
                self.storage_key = val;
            }
        }

        if let Ok(val) = std::env::var(format!("{}_LOG_LEVEL", ENV_PREFIX)) {
            if !val.is_empty() {
                self.log_level = val;
            }
        }

        if let Ok(val) = std::env::var(format!("{}_AUTOCORRECT", ENV_PREFIX)) {
            self.autocorrect = val.eq_ignore_ascii_case("true") || val == "1";
        }
    }

    /// Set a value by key name, as used by `shoplist config set`
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "data_dir" => self.data_dir = PathBuf::from(value),
            "storage_key" => {
                if value.is_empty() {
                    anyhow::bail!("storage_key cannot be empty");
                }
                self.storage_key = value.to_string();
            }
            "log_level" => self.log_level = value.to_string(),
            "autocorrect" => {
                self.autocorrect = match value.to_lowercase().as_str() {
                    "true" | "1" | "yes" | "on" => true,
                    "false" | "0" | "no" | "off" => false,
                    _ => anyhow::bail!("Invalid boolean value: {}", value),
                }
            }
            _ => anyhow::bail!(
                "Unknown config key: {}. Valid keys: data_dir, storage_key, log_level, autocorrect",
                key
            ),
        }
        Ok(())
    }

    /// Save configuration to a specific path
    pub fn save_to_path(&self, config_path: &PathBuf) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(config_path, content)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;
        Ok(())
    }

    /// Get the config file path
    ///
    /// Can be overridden with SHOPLIST_CONFIG environment variable
    pub fn config_file_path() -> PathBuf {
        if let Ok(path) = std::env::var(format!("{}_CONFIG", ENV_PREFIX)) {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("shoplist")
            .join("config.toml")
    }
}

/// Get the default data directory
fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("shoplist")
}

fn default_storage_key() -> String {
    DEFAULT_STORAGE_KEY.to_string()
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_autocorrect() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;
    use tempfile::TempDir;

    // Mutex to serialize tests that touch environment variables
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    /// Guard that locks env access and saves/restores env vars
    struct EnvGuard<'a> {
        _lock: std::sync::MutexGuard<'a, ()>,
        saved: Vec<(String, Option<String>)>,
    }

    impl<'a> EnvGuard<'a> {
        fn new(vars: &[&str]) -> Self {
            let lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
            let saved = vars
                .iter()
                .map(|&name| (name.to_string(), env::var(name).ok()))
                .collect();
            for name in vars {
                env::remove_var(name);
            }
            Self { _lock: lock, saved }
        }
    }

    impl Drop for EnvGuard<'_> {
        fn drop(&mut self) {
            for (name, value) in &self.saved {
                match value {
                    Some(v) => env::set_var(name, v),
                    None => env::remove_var(name),
                }
            }
        }
    }

    const ENV_VARS: &[&str] = &[
        "SHOPLIST_DATA_DIR",
        "SHOPLIST_STORAGE_KEY",
        "SHOPLIST_LOG_LEVEL",
        "SHOPLIST_AUTOCORRECT",
    ];

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.storage_key, "shopping_lists");
        assert_eq!(config.log_level, "warn");
        assert!(config.autocorrect);
        assert!(config.data_dir.ends_with("shoplist"));
    }

    #[test]
    fn test_env_override_data_dir() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();
        env::set_var("SHOPLIST_DATA_DIR", "/tmp/shoplist-test");
        config.apply_env_overrides();

        assert_eq!(config.data_dir, PathBuf::from("/tmp/shoplist-test"));
    }

    #[test]
    fn test_env_override_storage_key_ignores_empty() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();
        env::set_var("SHOPLIST_STORAGE_KEY", "");
        config.apply_env_overrides();
        assert_eq!(config.storage_key, "shopping_lists");

        env::set_var("SHOPLIST_STORAGE_KEY", "lists_v2");
        config.apply_env_overrides();
        assert_eq!(config.storage_key, "lists_v2");
    }

    #[test]
    fn test_env_override_autocorrect() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();
        env::set_var("SHOPLIST_AUTOCORRECT", "false");
        config.apply_env_overrides();
        assert!(!config.autocorrect);

        env::set_var("SHOPLIST_AUTOCORRECT", "1");
        config.apply_env_overrides();
        assert!(config.autocorrect);
    }

    #[test]
    fn test_set_value() {
        let mut config = Config::default();

        config.set_value("storage_key", "groceries").unwrap();
        assert_eq!(config.storage_key, "groceries");

        config.set_value("autocorrect", "off").unwrap();
        assert!(!config.autocorrect);

        config.set_value("data_dir", "/data/shop").unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/data/shop"));

        assert!(config.set_value("autocorrect", "maybe").is_err());
        assert!(config.set_value("storage_key", "").is_err());
        assert!(config.set_value("unknown", "x").is_err());
    }

    #[test]
    fn test_load_from_str_fills_defaults() {
        let _guard = EnvGuard::new(ENV_VARS);

        let toml = r#"
            data_dir = "/custom/data"
            log_level = "debug"
        "#;

        let config = Config::load_from_str(toml).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/custom/data"));
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.storage_key, "shopping_lists");
        assert!(config.autocorrect);
    }

    #[test]
    fn test_load_from_path_missing_file() {
        let _guard = EnvGuard::new(ENV_VARS);

        let path = PathBuf::from("/nonexistent/config.toml");
        let config = Config::load_from_path(&path).unwrap();
        assert_eq!(config.storage_key, "shopping_lists");
    }

    #[test]
    fn test_save_and_reload() {
        let _guard = EnvGuard::new(ENV_VARS);
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.data_dir = PathBuf::from("/data/shoplist");
        config.autocorrect = false;
        config.save_to_path(&path).unwrap();

        let loaded = Config::load_from_path(&path).unwrap();
        assert_eq!(loaded.data_dir, config.data_dir);
        assert!(!loaded.autocorrect);
    }

    #[test]
    fn test_load_from_path_reports_bad_toml() {
        let _guard = EnvGuard::new(ENV_VARS);
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "autocorrect = maybe").unwrap();

        let err = Config::load_from_path(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
