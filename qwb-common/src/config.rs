//! Configuration loading and API endpoint resolution
//!
//! Bootstrap configuration is a small TOML file. Each setting is resolved
//! in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! A missing config file is not an error: a warning is logged and the
//! compiled defaults are used. A config file that exists but does not
//! parse is an error.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "QWB_CONFIG";

/// Environment variable overriding the API base URL
pub const API_URL_ENV_VAR: &str = "QWB_API_URL";

/// Environment variable providing the API bearer token
pub const API_TOKEN_ENV_VAR: &str = "QWB_API_TOKEN";

/// Compiled default for the API base URL
pub const DEFAULT_API_URL: &str = "http://localhost:8080";

/// Compiled default for the HTTP request timeout
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    /// Remote API settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// `[api]` section of the config file
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the questionnaire API (e.g. `http://localhost:8080`)
    #[serde(default)]
    pub base_url: Option<String>,

    /// Bearer token sent with every request
    #[serde(default)]
    pub token: Option<String>,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            token: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// `[logging]` section of the config file
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_log_level() -> String {
    "info".to_string()
}

impl TomlConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from a file
    ///
    /// Missing file → warning + defaults. Unreadable or malformed file → error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            warn!(
                "Config file {} not found, using compiled defaults",
                path.display()
            );
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content).map_err(|e| match e {
            Error::TomlParse(inner) => {
                Error::Config(format!("{}: {}", path.display(), inner))
            }
            other => other,
        })?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }
}

/// Locate the config file following the priority order
///
/// Returns `None` when no explicit path is given and the per-user default
/// file does not exist.
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Some(path) = non_empty_env(CONFIG_ENV_VAR) {
        return Some(PathBuf::from(path));
    }

    // Priority 3: Per-user config directory
    let user_config = default_config_path()?;
    if user_config.exists() {
        Some(user_config)
    } else {
        debug!("No config file at {}", user_config.display());
        None
    }
}

/// Default per-user config file location (`<config dir>/qwb/config.toml`)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("qwb").join("config.toml"))
}

/// Resolve and load the bootstrap configuration
pub fn load_config(cli_arg: Option<&Path>) -> Result<TomlConfig> {
    match resolve_config_path(cli_arg) {
        Some(path) => TomlConfig::load(&path),
        // Priority 4: compiled defaults
        None => Ok(TomlConfig::default()),
    }
}

/// Fully resolved settings for the API client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiSettings {
    /// Base URL without trailing slash
    pub base_url: String,
    /// Optional bearer token
    pub token: Option<String>,
    /// Per-request timeout
    pub timeout: Duration,
}

impl ApiSettings {
    /// Resolve API settings: CLI → ENV → TOML → compiled default
    pub fn resolve(cli_url: Option<&str>, cli_token: Option<&str>, config: &TomlConfig) -> Self {
        let base_url = first_non_empty([
            cli_url.map(str::to_string),
            non_empty_env(API_URL_ENV_VAR),
            config.api.base_url.clone(),
        ])
        .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let token = first_non_empty([
            cli_token.map(str::to_string),
            non_empty_env(API_TOKEN_ENV_VAR),
            config.api.token.clone(),
        ]);

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            timeout: Duration::from_secs(config.api.timeout_secs),
        }
    }
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            token: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn first_non_empty<const N: usize>(candidates: [Option<String>; N]) -> Option<String> {
    candidates
        .into_iter()
        .flatten()
        .find(|v| !v.trim().is_empty())
}
