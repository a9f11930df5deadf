//! Configuration management for gsmacquire using the prefer crate.
//!
//! Settings come from three layers: built-in defaults, an optional config
//! file (discovered by prefer or given with `--config`), and command-line
//! flags applied last by the CLI.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::scrapers::fetcher::{DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_BASE_DELAY};
use crate::scrapers::http_client::DEFAULT_TIMEOUT;
use crate::scrapers::pipeline::DEFAULT_REQUEST_DELAY;
use crate::scrapers::{PipelineConfig, RetryPolicy, SelectorError, SelectorProfileConfig};

/// Name used for config file discovery.
pub const CONFIG_NAME: &str = "gsmacquire";

/// Top-level catalog page listing all manufacturers.
pub const DEFAULT_CATALOG_URL: &str = "https://www.gsmarena.com/makers.php3";

/// Default database filename.
pub const DEFAULT_DATABASE_FILENAME: &str = "gsmacquire.db";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse {format} config: {message}")]
    Parse {
        format: &'static str,
        message: String,
    },
    #[error(transparent)]
    Selector(#[from] SelectorError),
}

/// Application settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Base data directory.
    pub data_dir: PathBuf,
    /// Database filename inside `data_dir`.
    pub database_filename: String,
    /// Database URL (overrides data_dir/database_filename if set).
    pub database_url: Option<String>,
    /// Top-level catalog page.
    pub catalog_url: String,
    /// User agent override (None = default desktop browser agent).
    pub user_agent: Option<String>,
    /// Per-attempt request timeout in seconds.
    pub request_timeout: u64,
    /// Attempts per page before giving up.
    pub max_attempts: u32,
    /// Base retry delay in milliseconds (multiplied by the attempt number).
    pub retry_base_delay_ms: u64,
    /// Delay between product pages in milliseconds.
    pub request_delay_ms: u64,
    /// Maximum products to attempt (0 = unlimited).
    pub limit: usize,
    /// Manufacturer links on the catalog page.
    pub manufacturers: SelectorProfileConfig,
    /// Product links on a manufacturer page.
    pub products: SelectorProfileConfig,
}

impl Default for Settings {
    fn default() -> Self {
        // Falls back gracefully: data dir -> home dir -> current dir
        let data_dir = dirs::data_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join(CONFIG_NAME);

        Self {
            data_dir,
            database_filename: DEFAULT_DATABASE_FILENAME.to_string(),
            database_url: None,
            catalog_url: DEFAULT_CATALOG_URL.to_string(),
            user_agent: None,
            request_timeout: DEFAULT_TIMEOUT.as_secs(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_base_delay_ms: DEFAULT_RETRY_BASE_DELAY.as_millis() as u64,
            request_delay_ms: DEFAULT_REQUEST_DELAY.as_millis() as u64,
            limit: 0,
            manufacturers: SelectorProfileConfig::manufacturers(),
            products: SelectorProfileConfig::products(),
        }
    }
}

impl Settings {
    /// Get the database URL, constructing from path if not explicitly set.
    pub fn database_url(&self) -> String {
        if let Some(ref url) = self.database_url {
            url.clone()
        } else {
            format!("sqlite:{}", self.database_path().display())
        }
    }

    /// Get the full path to the database file in the data directory.
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(&self.database_filename)
    }

    /// Ensure the data directory exists when the database lives there.
    pub fn ensure_directories(&self) -> std::io::Result<()> {
        if self.database_url.is_some() {
            return Ok(());
        }
        fs::create_dir_all(&self.data_dir).map_err(|e| {
            std::io::Error::new(
                e.kind(),
                format!(
                    "Failed to create data directory '{}': {}",
                    self.data_dir.display(),
                    e
                ),
            )
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts.max(1),
            base_delay: Duration::from_millis(self.retry_base_delay_ms),
        }
    }

    /// Compile selector profiles and build the crawl configuration.
    pub fn pipeline_config(&self) -> Result<PipelineConfig, ConfigError> {
        Ok(PipelineConfig {
            catalog_url: self.catalog_url.clone(),
            manufacturers: self.manufacturers.compile()?,
            products: self.products.compile()?,
            request_delay: Duration::from_millis(self.request_delay_ms),
            limit: self.limit,
        })
    }
}

/// Configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Data directory path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<String>,
    /// Database filename.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    /// Database URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_url: Option<String>,
    /// Top-level catalog page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog_url: Option<String>,
    /// User agent string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    /// Request timeout in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout: Option<u64>,
    /// Attempts per page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_attempts: Option<u32>,
    /// Base retry delay in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_base_delay_ms: Option<u64>,
    /// Delay between product pages in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_delay_ms: Option<u64>,
    /// Maximum products to attempt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
    /// Manufacturer link selector profile.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manufacturers: Option<SelectorProfileConfig>,
    /// Product link selector profile.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub products: Option<SelectorProfileConfig>,
    /// Path to the config file this was loaded from (not serialized).
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration using prefer crate for discovery.
    /// Falls back to defaults when no config file is found.
    pub async fn load() -> Self {
        match prefer::load(CONFIG_NAME).await {
            Ok(pref_config) => {
                if let Some(path) = pref_config.source_path() {
                    match Self::load_from_path(path).await {
                        Ok(config) => config,
                        Err(e) => {
                            warn!("Ignoring config file: {}", e);
                            Self::default()
                        }
                    }
                } else {
                    Self::default()
                }
            }
            // No config file found
            Err(_) => Self::default(),
        }
    }

    /// Load configuration from a specific file path.
    /// Supports JSON, TOML, and YAML based on file extension.
    pub async fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents =
            tokio::fs::read_to_string(path)
                .await
                .map_err(|source| ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

        let mut config: Config = match ext {
            "toml" => toml::from_str(&contents).map_err(|e| ConfigError::Parse {
                format: "TOML",
                message: e.to_string(),
            })?,
            "yaml" | "yml" => serde_yaml::from_str(&contents).map_err(|e| ConfigError::Parse {
                format: "YAML",
                message: e.to_string(),
            })?,
            _ => serde_json::from_str(&contents).map_err(|e| ConfigError::Parse {
                format: "JSON",
                message: e.to_string(),
            })?,
        };

        config.source_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Directory of the config file, used to resolve relative paths.
    pub fn base_dir(&self) -> Option<PathBuf> {
        self.source_path
            .as_ref()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    /// Resolve a path that may be relative to the config file.
    /// - Absolute paths are returned as-is
    /// - Paths starting with ~ are expanded
    /// - Relative paths are resolved relative to `base_dir`
    pub fn resolve_path(&self, path_str: &str, base_dir: &Path) -> PathBuf {
        let expanded = shellexpand::tilde(path_str);
        let path = Path::new(expanded.as_ref());

        if path.is_absolute() {
            path.to_path_buf()
        } else {
            base_dir.join(path)
        }
    }

    /// Apply configuration to settings.
    pub fn apply_to_settings(&self, settings: &mut Settings, base_dir: &Path) {
        if let Some(ref data_dir) = self.data_dir {
            settings.data_dir = self.resolve_path(data_dir, base_dir);
        }
        if let Some(ref database) = self.database {
            settings.database_filename = database.clone();
        }
        if let Some(ref url) = self.database_url {
            settings.database_url = Some(url.clone());
        }
        if let Some(ref catalog_url) = self.catalog_url {
            settings.catalog_url = catalog_url.clone();
        }
        if let Some(ref user_agent) = self.user_agent {
            settings.user_agent = Some(user_agent.clone());
        }
        if let Some(timeout) = self.request_timeout {
            settings.request_timeout = timeout;
        }
        if let Some(attempts) = self.max_attempts {
            settings.max_attempts = attempts;
        }
        if let Some(delay) = self.retry_base_delay_ms {
            settings.retry_base_delay_ms = delay;
        }
        if let Some(delay) = self.request_delay_ms {
            settings.request_delay_ms = delay;
        }
        if let Some(limit) = self.limit {
            settings.limit = limit;
        }
        if let Some(ref profile) = self.manufacturers {
            settings.manufacturers = profile.clone();
        }
        if let Some(ref profile) = self.products {
            settings.products = profile.clone();
        }
    }
}

/// Options for loading settings.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Explicit config file path (overrides auto-discovery).
    pub config_path: Option<PathBuf>,
}

/// Load settings from defaults and the config file.
pub async fn load_settings(options: &LoadOptions) -> Result<Settings, ConfigError> {
    let config = match options.config_path {
        Some(ref path) => Config::load_from_path(path).await?,
        None => Config::load().await,
    };

    let base_dir = config
        .base_dir()
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."));

    let mut settings = Settings::default();
    config.apply_to_settings(&mut settings, &base_dir);
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.catalog_url, DEFAULT_CATALOG_URL);
        assert_eq!(settings.request_timeout(), Duration::from_secs(10));
        assert_eq!(settings.retry_policy(), RetryPolicy::default());
        assert_eq!(settings.request_delay_ms, 500);
        assert!(settings.database_url().starts_with("sqlite:"));
        assert!(settings.database_url().ends_with(DEFAULT_DATABASE_FILENAME));
    }

    #[tokio::test]
    async fn test_load_toml_and_apply() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("gsmacquire.toml");
        std::fs::write(
            &path,
            r#"
data_dir = "./data"
catalog_url = "https://catalog.example.com/makers.php"
request_delay_ms = 50
limit = 10

[products]
container = "div.listing"
"#,
        )
        .unwrap();

        let settings = load_settings(&LoadOptions {
            config_path: Some(path),
        })
        .await
        .unwrap();

        assert_eq!(settings.data_dir, dir.path().join("./data"));
        assert_eq!(settings.catalog_url, "https://catalog.example.com/makers.php");
        assert_eq!(settings.request_delay_ms, 50);
        assert_eq!(settings.limit, 10);
        assert_eq!(settings.products.css(), "div.listing ul li a");
        assert_eq!(settings.manufacturers, SelectorProfileConfig::manufacturers());
    }

    #[tokio::test]
    async fn test_load_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("gsmacquire.json");
        std::fs::write(&path, r#"{"database_url": "sqlite::memory:", "max_attempts": 5}"#)
            .unwrap();

        let config = Config::load_from_path(&path).await.unwrap();
        let mut settings = Settings::default();
        config.apply_to_settings(&mut settings, dir.path());

        assert_eq!(settings.database_url(), "sqlite::memory:");
        assert_eq!(settings.retry_policy().max_attempts, 5);
    }

    #[tokio::test]
    async fn test_invalid_config_is_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("gsmacquire.yaml");
        std::fs::write(&path, "limit: [not a number").unwrap();

        let err = Config::load_from_path(&path).await.unwrap_err();
        assert!(matches!(err, ConfigError::Parse { format: "YAML", .. }));
    }

    #[test]
    fn test_invalid_selector_rejected_at_startup() {
        let mut settings = Settings::default();
        settings.manufacturers = SelectorProfileConfig::new("div[", "ul", "li", "a");
        assert!(matches!(
            settings.pipeline_config(),
            Err(ConfigError::Selector(_))
        ));
    }

    #[test]
    fn test_resolve_absolute_path_unchanged() {
        let config = Config::default();
        let resolved = config.resolve_path("/var/lib/gsm", Path::new("/etc"));
        assert_eq!(resolved, PathBuf::from("/var/lib/gsm"));
    }
}
