//! Bootstrap configuration loading
//!
//! Configuration file resolution follows a fixed priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable (`CALICO_CONFIG`)
//! 3. Platform config directory (`<config_dir>/calico/config.toml`)
//! 4. Compiled defaults (fallback)
//!
//! A missing TOML file is never fatal: a warning is logged and the
//! compiled defaults are used. A file that exists but fails to parse is
//! reported as [`Error::Config`].

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "CALICO_CONFIG";

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TomlConfig {
    /// sqlx connection URL for the SQLite database
    #[serde(default = "default_database_url")]
    pub database_url: String,

    /// Address the HTTP server binds to
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Origins allowed by the CORS layer
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Remote station metadata endpoints
    #[serde(default)]
    pub metadata: MetadataConfig,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Remote now-playing and history endpoints
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct MetadataConfig {
    /// Live now-playing metadata document
    #[serde(default = "default_now_playing_url")]
    pub now_playing_url: String,

    /// Album art served alongside live metadata
    #[serde(default = "default_album_art_url")]
    pub album_art_url: String,

    /// History candidates, tried in order until one answers with a track list
    #[serde(default = "default_history_urls")]
    pub history_urls: Vec<String>,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl MetadataConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_database_url() -> String {
    "sqlite://calico.db?mode=rwc".to_string()
}

fn default_bind_addr() -> String {
    "0.0.0.0:5000".to_string()
}

fn default_cors_origins() -> Vec<String> {
    vec!["http://localhost:3000".to_string()]
}

fn default_now_playing_url() -> String {
    "https://d3d4yli4hf5bmh.cloudfront.net/metadata.json".to_string()
}

fn default_album_art_url() -> String {
    "https://d3d4yli4hf5bmh.cloudfront.net/cover.jpg".to_string()
}

fn default_history_urls() -> Vec<String> {
    vec![
        "https://d3d4yli4hf5bmh.cloudfront.net/hls/history.json".to_string(),
        "https://d3d4yli4hf5bmh.cloudfront.net/api/history".to_string(),
        "https://radiocalico.com/api/trackhistory.json".to_string(),
        "https://radiocalico.com/api/recent-tracks".to_string(),
    ]
}

fn default_timeout_secs() -> u64 {
    5
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            bind_addr: default_bind_addr(),
            cors_origins: default_cors_origins(),
            metadata: MetadataConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            now_playing_url: default_now_playing_url(),
            album_art_url: default_album_art_url(),
            history_urls: default_history_urls(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl TomlConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Invalid config TOML: {}", e)))
    }

    /// Load configuration from a file, falling back to defaults if it does not exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            warn!(
                "Config file not found at {}, using built-in defaults",
                path.display()
            );
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Apply command-line / environment overrides on top of file values
    pub fn with_overrides(mut self, database_url: Option<String>, bind_addr: Option<String>) -> Self {
        if let Some(url) = database_url {
            self.database_url = url;
        }
        if let Some(addr) = bind_addr {
            self.bind_addr = addr;
        }
        self
    }
}

/// Resolve which config file to read, by priority order
///
/// Returns `None` when neither an explicit path nor a platform config file exists.
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3: Platform config directory
    default_config_path().filter(|path| path.exists())
}

/// Load bootstrap configuration following the resolution order
pub fn load_config(cli_arg: Option<&Path>) -> Result<TomlConfig> {
    match resolve_config_path(cli_arg) {
        Some(path) => TomlConfig::load_from(&path),
        None => {
            // Priority 4: Compiled defaults
            info!("No config file found, using built-in defaults");
            Ok(TomlConfig::default())
        }
    }
}

/// `<config_dir>/calico/config.toml` for the current platform
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("calico").join("config.toml"))
}
