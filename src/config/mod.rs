//! Configuration
//!
//! Configuration is loaded in order of precedence:
//! 1. Environment variables (highest priority)
//! 2. Config file (~/.config/pagesel/config.toml)
//! 3. Built-in defaults (lowest priority)

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

mod logging;


pub use logging::{FileLogging, LogRotation, LoggingConfig};

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

const DEFAULT_API_URL: &str = "https://api.artic.edu/api/v1/artworks";
const DEFAULT_PAGE_SIZE: u32 = 12;
const DEFAULT_RECORD_CEILING: u64 = 1000;
const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_BULK_SELECT_LIMIT: u64 = 100;

// ─────────────────────────────────────────────────────────────────────────────
// Application Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Application configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Artworks endpoint queried by the HTTP record source
    pub api_url: String,

    /// Records per page (fixed for the session)
    pub page_size: u32,

    /// Cap applied to the collection size reported by the API (None = no cap)
    pub record_ceiling: Option<u64>,

    /// Per-request timeout for page fetches
    pub request_timeout: Duration,

    /// Largest "select first N" target accepted (None = no limit)
    pub bulk_select_limit: Option<u64>,

    /// Demo mode: serve a generated collection instead of calling the API
    pub demo_mode: bool,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            record_ceiling: Some(DEFAULT_RECORD_CEILING),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            bulk_select_limit: Some(DEFAULT_BULK_SELECT_LIMIT),
            demo_mode: false,
            logging: LoggingConfig::default(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// File Configuration (deserialization layer)
// ─────────────────────────────────────────────────────────────────────────────

/// Config file structure
#[derive(Debug, Deserialize, Default)]
pub(crate) struct FileConfig {
    pub api_url: Option<String>,
    pub page_size: Option<u32>,
    /// 0 disables the ceiling
    pub record_ceiling: Option<u64>,
    pub request_timeout_secs: Option<u64>,
    /// 0 disables the limit
    pub bulk_select_limit: Option<u64>,

    /// Optional [logging] section
    pub logging: Option<FileLogging>,
}

/// Zero means "no limit" in the file format
fn zero_as_none(value: u64) -> Option<u64> {
    (value > 0).then_some(value)
}

fn env_flag(value: Option<String>) -> bool {
    value
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

// ─────────────────────────────────────────────────────────────────────────────
// Configuration Loading
// ─────────────────────────────────────────────────────────────────────────────

impl Config {
    /// Get the config file path: ~/.config/pagesel/config.toml
    /// Uses Unix-style ~/.config on all platforms for consistency
    pub fn config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|p| p.join(".config").join("pagesel").join("config.toml"))
    }

    /// Create config file with defaults if it doesn't exist
    pub fn ensure_config_exists() {
        let Some(path) = Self::config_path() else {
            return;
        };
        if path.exists() {
            return;
        }
        if let Err(e) = Self::default().write_to(&path) {
            // Config is optional; keep running on defaults
            tracing::debug!("Could not write config template: {:#}", e);
        }
    }

    /// Write this configuration as TOML, creating parent directories
    pub fn write_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        std::fs::write(path, self.to_toml())
            .with_context(|| format!("Failed to write {}", path.display()))
    }

    /// Load file config if it exists
    ///
    /// A config file that exists but cannot be read or parsed is an error.
    fn load_file_config() -> Result<FileConfig> {
        let Some(path) = Self::config_path() else {
            return Ok(FileConfig::default());
        };
        Self::load_file_config_from(&path)
    }

    pub(crate) fn load_file_config_from(path: &Path) -> Result<FileConfig> {
        match std::fs::read_to_string(path) {
            Ok(contents) => toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config file {}", path.display())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(FileConfig::default()),
            Err(e) => {
                Err(e).with_context(|| format!("Failed to read config file {}", path.display()))
            }
        }
    }

    /// Load configuration: env vars > file > defaults
    pub fn from_env() -> Result<Self> {
        let file = Self::load_file_config()?;
        Self::resolve(file, |key| std::env::var(key).ok())
    }

    /// Merge file values and environment lookups over the defaults
    pub(crate) fn resolve(
        file: FileConfig,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let defaults = Self::default();

        // API URL: env > file > default
        let api_url = env("PAGESEL_API_URL")
            .or(file.api_url)
            .unwrap_or(defaults.api_url);

        // Page size: env > file > default
        let page_size = match env("PAGESEL_PAGE_SIZE") {
            Some(raw) => raw
                .parse::<u32>()
                .with_context(|| format!("PAGESEL_PAGE_SIZE is not a number: {:?}", raw))?,
            None => file.page_size.unwrap_or(defaults.page_size),
        };
        if page_size == 0 {
            anyhow::bail!("page_size must be at least 1");
        }

        let record_ceiling = match file.record_ceiling {
            Some(value) => zero_as_none(value),
            None => defaults.record_ceiling,
        };

        let request_timeout = file
            .request_timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(defaults.request_timeout);

        let bulk_select_limit = match file.bulk_select_limit {
            Some(value) => zero_as_none(value),
            None => defaults.bulk_select_limit,
        };

        // Demo mode: env only (runtime flag, also settable with --demo)
        let demo_mode = env_flag(env("PAGESEL_DEMO"));

        Ok(Self {
            api_url,
            page_size,
            record_ceiling,
            request_timeout,
            bulk_select_limit,
            demo_mode,
            logging: LoggingConfig::from_file(file.logging),
        })
    }

    /// Serialize config to TOML string (single source of truth for format)
    pub fn to_toml(&self) -> String {
        format!(
            r#"# pagesel configuration

# Artworks endpoint (PAGESEL_API_URL overrides)
api_url = "{api_url}"

# Records per page (PAGESEL_PAGE_SIZE overrides)
page_size = {page_size}

# Cap on the collection size reported by the API; deep pages are refused upstream
# 0 = no cap
record_ceiling = {record_ceiling}

# Per-request timeout in seconds
request_timeout_secs = {timeout}

# Largest accepted "select first N rows" request, 0 = no limit
bulk_select_limit = {bulk_limit}

[logging]
level = "{level}"  # trace, debug, info, warn, error (RUST_LOG env var overrides this)
file_enabled = {file_enabled}
file_dir = "{file_dir}"
file_rotation = "{file_rotation}"  # hourly, daily, never
file_prefix = "{file_prefix}"
"#,
            api_url = self.api_url,
            page_size = self.page_size,
            record_ceiling = self.record_ceiling.unwrap_or(0),
            timeout = self.request_timeout.as_secs(),
            bulk_limit = self.bulk_select_limit.unwrap_or(0),
            level = self.logging.level,
            file_enabled = self.logging.file_enabled,
            file_dir = self.logging.file_dir.display().to_string().replace('\\', "/"),
            file_rotation = self.logging.file_rotation.as_str(),
            file_prefix = self.logging.file_prefix,
        )
    }
}
