//! Configuration loading and typed config structures.
//!
//! The configuration lives in `agritrace.yaml` next to the binary (or
//! wherever `--config` points). Every section and field has a default, so
//! an absent file or a partial file is fine.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AgritraceConfig {
    /// Durable JSON store settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// CSV export settings.
    #[serde(default)]
    pub export: ExportConfig,

    /// KPI report settings.
    #[serde(default)]
    pub reporting: ReportingConfig,

    /// Optional relational mirror.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AgritraceConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values:
    /// - `DATABASE_URL` overrides `database.url`
    /// - `AGRITRACE_DATA_PATH` overrides `storage.data_path`
    /// - `AGRITRACE_LOG_FILE` overrides `logging.file`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::parse(&contents)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Like [`AgritraceConfig::from_file`], but a missing file yields the
    /// defaults (with environment overrides applied).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file exists but cannot be read or parsed.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            return Self::from_file(path);
        }
        let mut config = Self::default();
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a YAML string. No environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        // An empty document deserializes as unit, not as an empty mapping.
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yml::from_str(yaml)?)
    }

    /// Override settings with environment variables when set.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("DATABASE_URL") {
            self.database.url = Some(val);
        }
        if let Ok(val) = std::env::var("AGRITRACE_DATA_PATH") {
            self.storage.data_path = PathBuf::from(val);
        }
        if let Ok(val) = std::env::var("AGRITRACE_LOG_FILE") {
            self.logging.file = Some(PathBuf::from(val));
        }
    }
}

/// Durable JSON store settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StorageConfig {
    /// Path of the JSON data file.
    #[serde(default = "default_data_path")]
    pub data_path: PathBuf,

    /// How many timestamped backups to keep next to the data file.
    #[serde(default = "default_max_backups")]
    pub max_backups: usize,

    /// Extension appended to backup file names.
    #[serde(default = "default_backup_suffix")]
    pub backup_suffix: String,

    /// Extension of the integrity digest side-car file.
    #[serde(default = "default_digest_suffix")]
    pub digest_suffix: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_path: default_data_path(),
            max_backups: default_max_backups(),
            backup_suffix: default_backup_suffix(),
            digest_suffix: default_digest_suffix(),
        }
    }
}

/// CSV export settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExportConfig {
    /// Destination of the CSV export.
    #[serde(default = "default_csv_path")]
    pub csv_path: PathBuf,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            csv_path: default_csv_path(),
        }
    }
}

/// KPI report settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReportingConfig {
    /// A lot is stale when its last activity is more than this many days old.
    #[serde(default = "default_stale_after_days")]
    pub stale_after_days: i64,
}

impl Default for ReportingConfig {
    fn default() -> Self {
        Self {
            stale_after_days: default_stale_after_days(),
        }
    }
}

/// Relational mirror settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DatabaseConfig {
    /// Whether to try connecting at all.
    #[serde(default = "default_database_enabled")]
    pub enabled: bool,

    /// `PostgreSQL` connection string. Absent means no mirror.
    #[serde(default)]
    pub url: Option<String>,

    /// Pool size.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Timeout for establishing a connection, in seconds.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            enabled: default_database_enabled(),
            url: None,
            max_connections: default_max_connections(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins when set.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Append log output to this file instead of stderr.
    #[serde(default = "default_log_file")]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

fn default_data_path() -> PathBuf {
    PathBuf::from("data/lots.json")
}

const fn default_max_backups() -> usize {
    3
}

fn default_backup_suffix() -> String {
    "bak".to_owned()
}

fn default_digest_suffix() -> String {
    "sha256".to_owned()
}

fn default_csv_path() -> PathBuf {
    PathBuf::from("data/lots.csv")
}

const fn default_stale_after_days() -> i64 {
    crate::report::DEFAULT_STALE_AFTER_DAYS
}

const fn default_database_enabled() -> bool {
    true
}

const fn default_max_connections() -> u32 {
    5
}

const fn default_connect_timeout_secs() -> u64 {
    5
}

fn default_log_level() -> String {
    "info".to_owned()
}

#[allow(clippy::unnecessary_wraps)]
fn default_log_file() -> Option<PathBuf> {
    Some(PathBuf::from("logs/agritrace.log"))
}
