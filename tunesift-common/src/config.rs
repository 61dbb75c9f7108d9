//! Configuration loading and resolution
//!
//! Settings sources, highest priority first:
//! 1. Command-line arguments
//! 2. Environment variables
//! 3. TOML configuration file
//! 4. Built-in defaults (code constants)

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Environment variable overriding the songs folder
pub const SONGS_FOLDER_ENV: &str = "TUNESIFT_SONGS_FOLDER";

/// Environment variable carrying the acoustic search API key
pub const AUDD_API_KEY_ENV: &str = "TUNESIFT_AUDD_API_KEY";

const DEFAULT_SONGS_FOLDER: &str = "./songs";
const DEFAULT_RESULTS_FILE: &str = "music_identifier_results.txt";
const DEFAULT_SEPARATOR: &str = " :: ";
const DEFAULT_PADDING: usize = 9;
const DEFAULT_INTERVAL_SECS: f64 = 5.0;
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_FINGERPRINT_ENDPOINT: &str = "http://127.0.0.1:8765/recognize";
const DEFAULT_AUDD_ENDPOINT: &str = "https://api.audd.io/";

/// Configuration loaded from TOML file
///
/// Every field is optional in the file; missing values fall back to
/// built-in defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Folder holding the songs to identify
    #[serde(default)]
    pub songs_folder: Option<PathBuf>,

    /// Descend into subfolders when listing songs
    #[serde(default)]
    pub recursive: bool,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Report output configuration
    #[serde(default)]
    pub report: ReportConfig,

    /// Recognition provider settings
    #[serde(default)]
    pub providers: ProvidersConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
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

/// Output format of the final report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// Padded `label :: value` blocks
    #[default]
    Text,
    /// Serialized report structure
    Json,
}

/// Report output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Results file path
    #[serde(default = "default_results_file")]
    pub file: PathBuf,

    /// Separator between a field label and its value
    #[serde(default = "default_separator")]
    pub separator: String,

    /// Width labels are right-padded to
    #[serde(default = "default_padding")]
    pub padding: usize,

    /// Output format
    #[serde(default)]
    pub format: ReportFormat,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            file: default_results_file(),
            separator: default_separator(),
            padding: default_padding(),
            format: ReportFormat::default(),
        }
    }
}

/// Settings for both recognition providers
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub fingerprint: FingerprintConfig,

    #[serde(default)]
    pub acoustic_search: AcousticSearchConfig,
}

/// Fingerprint provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FingerprintConfig {
    /// Recognition endpoint URL
    #[serde(default = "default_fingerprint_endpoint")]
    pub endpoint: String,

    /// Minimum spacing between two calls, in seconds
    #[serde(default = "default_interval_secs")]
    pub interval_secs: f64,

    /// HTTP request timeout, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for FingerprintConfig {
    fn default() -> Self {
        Self {
            endpoint: default_fingerprint_endpoint(),
            interval_secs: DEFAULT_INTERVAL_SECS,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl FingerprintConfig {
    /// Rate-limit interval; zero, negative or NaN means no wait
    pub fn interval(&self) -> Duration {
        interval_from_secs(self.interval_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// AudD acoustic search settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcousticSearchConfig {
    /// AudD API endpoint URL
    #[serde(default = "default_audd_endpoint")]
    pub endpoint: String,

    /// Minimum spacing between two calls, in seconds
    #[serde(default = "default_interval_secs")]
    pub interval_secs: f64,

    /// HTTP request timeout, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// AudD API token (lowest priority, see [`resolve_api_key`])
    #[serde(default)]
    pub api_key: Option<String>,
}

impl Default for AcousticSearchConfig {
    fn default() -> Self {
        Self {
            endpoint: default_audd_endpoint(),
            interval_secs: DEFAULT_INTERVAL_SECS,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            api_key: None,
        }
    }
}

impl AcousticSearchConfig {
    /// Rate-limit interval; zero, negative or NaN means no wait
    pub fn interval(&self) -> Duration {
        interval_from_secs(self.interval_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Convert a seconds value into an interval
///
/// Zero, negative and NaN values mean no wait. Values too large for a
/// `Duration` saturate to `Duration::MAX`.
pub fn interval_from_secs(secs: f64) -> Duration {
    if secs.is_nan() || secs <= 0.0 {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_results_file() -> PathBuf {
    PathBuf::from(DEFAULT_RESULTS_FILE)
}

fn default_separator() -> String {
    DEFAULT_SEPARATOR.to_string()
}

fn default_padding() -> usize {
    DEFAULT_PADDING
}

fn default_interval_secs() -> f64 {
    DEFAULT_INTERVAL_SECS
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_fingerprint_endpoint() -> String {
    DEFAULT_FINGERPRINT_ENDPOINT.to_string()
}

fn default_audd_endpoint() -> String {
    DEFAULT_AUDD_ENDPOINT.to_string()
}

/// Load TOML configuration
///
/// An explicit path must exist. Without one, the per-user config file is
/// used when present, otherwise built-in defaults.
pub fn load_toml_config(explicit_path: Option<&Path>) -> Result<TomlConfig> {
    let path = match explicit_path {
        Some(path) => {
            if !path.exists() {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            path.to_path_buf()
        }
        None => match default_config_path() {
            Some(path) if path.exists() => path,
            _ => {
                debug!("No config file found, using built-in defaults");
                return Ok(TomlConfig::default());
            }
        },
    };

    let content = std::fs::read_to_string(&path)?;
    let config = parse_toml_config(&content)?;
    info!("Configuration loaded from {}", path.display());
    Ok(config)
}

/// Parse TOML configuration text
pub fn parse_toml_config(content: &str) -> Result<TomlConfig> {
    toml::from_str(content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
}

/// Per-user config file location (`~/.config/tunesift/config.toml` on Linux)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("tunesift").join("config.toml"))
}

/// Resolve the songs folder
///
/// **Priority:** CLI → ENV → TOML → `./songs`
pub fn resolve_songs_folder(cli_arg: Option<&Path>, toml_config: &TomlConfig) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(SONGS_FOLDER_ENV) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    if let Some(path) = &toml_config.songs_folder {
        return path.clone();
    }

    PathBuf::from(DEFAULT_SONGS_FOLDER)
}

/// Resolve the acoustic search API key
///
/// **Priority:** CLI → ENV → TOML
///
/// A missing key is not an error: the provider then reports every call as
/// unauthorized and the run continues without it.
pub fn resolve_api_key(cli_arg: Option<&str>, toml_config: &TomlConfig) -> Option<String> {
    let env_key = std::env::var(AUDD_API_KEY_ENV).ok();
    let toml_key = toml_config.providers.acoustic_search.api_key.as_deref();

    let candidates = [
        ("command line", cli_arg),
        ("environment", env_key.as_deref()),
        ("TOML", toml_key),
    ];

    let sources: Vec<&str> = candidates
        .iter()
        .filter(|(_, key)| key.is_some_and(is_valid_key))
        .map(|(source, _)| *source)
        .collect();

    if sources.len() > 1 {
        warn!(
            "AudD API key found in multiple sources: {}. Using {} (highest priority).",
            sources.join(", "),
            sources[0]
        );
    }

    for (source, key) in candidates {
        if let Some(key) = key.filter(|k| is_valid_key(k)) {
            info!("AudD API key loaded from {}", source);
            return Some(key.trim().to_string());
        }
    }

    warn!("AudD API key not configured, acoustic search will find nothing");
    None
}

/// Validate API key (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}
