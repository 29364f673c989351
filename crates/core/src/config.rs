//! Configuration management
//!
//! Settings live in `config.toml` under `$OSC_CONFIG_DIR`, falling back to
//! the platform config directory. A missing file yields defaults. Credentials
//! are never stored here.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::wait::WaitConfig;

/// Environment variable overriding the config directory
pub const CONFIG_DIR_ENV: &str = "OSC_CONFIG_DIR";

const CONFIG_FILE: &str = "config.toml";

/// Single-put ceiling of the S3 protocol family (5 GiB)
pub const DEFAULT_SINGLE_PUT_LIMIT: u64 = 5 * 1024 * 1024 * 1024;

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub store: StoreConfig,
    pub list: ListConfig,
    pub upload: UploadConfig,
    pub wait: WaitSettings,
}

/// Connection settings for the store backend
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Custom endpoint for S3-compatible services
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,

    /// Use path-style addressing (`endpoint/bucket/key`)
    pub force_path_style: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListConfig {
    /// Buckets requested per page; `None` lets the store decide
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Largest object accepted for a single put, in bytes. `0` disables the local check.
    pub single_put_limit: u64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            single_put_limit: DEFAULT_SINGLE_PUT_LIMIT,
        }
    }
}

impl UploadConfig {
    pub fn limit(&self) -> Option<u64> {
        (self.single_put_limit > 0).then_some(self.single_put_limit)
    }
}

/// On-disk form of [`WaitConfig`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaitSettings {
    pub timeout_secs: u64,
    pub interval_ms: u64,
}

impl Default for WaitSettings {
    fn default() -> Self {
        let defaults = WaitConfig::default();
        Self {
            timeout_secs: defaults.timeout().as_secs(),
            interval_ms: defaults.interval().as_millis() as u64,
        }
    }
}

impl WaitSettings {
    pub fn to_wait_config(&self) -> Result<WaitConfig> {
        WaitConfig::new(
            Duration::from_secs(self.timeout_secs),
            Duration::from_millis(self.interval_ms),
        )
    }
}

impl Config {
    /// Check values that cannot be expressed in the type system
    pub fn validate(&self) -> Result<()> {
        if let Some(endpoint) = &self.store.endpoint {
            let url = url::Url::parse(endpoint)
                .map_err(|e| Error::Config(format!("invalid endpoint '{endpoint}': {e}")))?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(Error::Config(format!(
                    "endpoint must use http or https: {endpoint}"
                )));
            }
        }

        if let Some(size) = self.list.page_size
            && size <= 0
        {
            return Err(Error::Config(format!(
                "list.page_size must be positive, got {size}"
            )));
        }

        self.wait.to_wait_config()?;
        Ok(())
    }
}

/// Loads and saves [`Config`] from a directory
#[derive(Debug, Clone)]
pub struct ConfigManager {
    dir: PathBuf,
}

impl ConfigManager {
    /// Use `$OSC_CONFIG_DIR`, or `<platform config dir>/osc`
    pub fn new() -> Result<Self> {
        if let Ok(dir) = std::env::var(CONFIG_DIR_ENV)
            && !dir.is_empty()
        {
            return Ok(Self::with_dir(dir));
        }

        let base = dirs::config_dir()
            .ok_or_else(|| Error::Config("could not determine config directory".to_string()))?;
        Ok(Self::with_dir(base.join("osc")))
    }

    pub fn with_dir(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn config_path(&self) -> PathBuf {
        self.dir.join(CONFIG_FILE)
    }

    /// Load the config file, returning defaults when it does not exist
    pub fn load(&self) -> Result<Config> {
        let path = self.config_path();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(&path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, config: &Config) -> Result<()> {
        config.validate()?;
        std::fs::create_dir_all(&self.dir)?;
        let content = toml::to_string_pretty(config)?;
        std::fs::write(self.config_path(), content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let manager = ConfigManager::with_dir(dir.path());

        let config = manager.load().unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.upload.limit(), Some(DEFAULT_SINGLE_PUT_LIMIT));
        assert_eq!(config.wait.timeout_secs, 60);
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let manager = ConfigManager::with_dir(dir.path().join("nested"));

        let mut config = Config::default();
        config.store.endpoint = Some("http://localhost:9000".to_string());
        config.store.force_path_style = true;
        config.list.page_size = Some(50);
        config.wait.interval_ms = 250;

        manager.save(&config).unwrap();
        assert_eq!(manager.load().unwrap(), config);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("config.toml"),
            "[upload]\nsingle_put_limit = 0\n",
        )
        .unwrap();

        let config = ConfigManager::with_dir(dir.path()).load().unwrap();
        assert_eq!(config.upload.limit(), None);
        assert_eq!(config.wait, WaitSettings::default());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut config = Config::default();
        config.store.endpoint = Some("ftp://example.com".to_string());
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let mut config = Config::default();
        config.list.page_size = Some(0);
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.wait.interval_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_malformed_toml() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("config.toml"), "[store\n").unwrap();

        let result = ConfigManager::with_dir(dir.path()).load();
        assert!(matches!(result, Err(Error::TomlParse(_))));
    }
}
