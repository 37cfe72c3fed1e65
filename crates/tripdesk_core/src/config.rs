//! Process configuration.
//!
//! # Responsibility
//! - Collect database, logging and listing settings from the environment.
//! - Fall back to defaults that run fully in memory without file logs.
//!
//! # Invariants
//! - `list_limit` is always within `1..=MAX_LIST_LIMIT`.
//! - `log_dir`, when set, is absolute.

use crate::logging::default_log_level;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const ENV_DB_PATH: &str = "TRIPDESK_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "TRIPDESK_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "TRIPDESK_LOG_DIR";
pub const ENV_LIST_LIMIT: &str = "TRIPDESK_LIST_LIMIT";

/// Page size used by `GET /trips` when nothing is configured.
pub const DEFAULT_LIST_LIMIT: u32 = 100;
pub const MAX_LIST_LIMIT: u32 = 1_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidListLimit(String),
    RelativeLogDir(PathBuf),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidListLimit(value) => write!(
                f,
                "{ENV_LIST_LIMIT} must be an integer in 1..={MAX_LIST_LIMIT}, got `{value}`"
            ),
            Self::RelativeLogDir(path) => write!(
                f,
                "{ENV_LOG_DIR} must be an absolute path, got `{}`",
                path.display()
            ),
        }
    }
}

impl Error for ConfigError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// SQLite file; `None` keeps everything in memory.
    pub db_path: Option<PathBuf>,
    pub log_level: String,
    /// Rolling log directory; `None` disables file logging.
    pub log_dir: Option<PathBuf>,
    pub list_limit: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            log_level: default_log_level().to_string(),
            log_dir: None,
            list_limit: DEFAULT_LIST_LIMIT,
        }
    }
}

impl AppConfig {
    /// Reads `TRIPDESK_*` variables from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any key lookup; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let mut config = Self::default();

        if let Some(path) = read(ENV_DB_PATH) {
            config.db_path = Some(PathBuf::from(path));
        }
        if let Some(level) = read(ENV_LOG_LEVEL) {
            config.log_level = level;
        }
        if let Some(dir) = read(ENV_LOG_DIR) {
            let dir = PathBuf::from(dir);
            if !dir.is_absolute() {
                return Err(ConfigError::RelativeLogDir(dir));
            }
            config.log_dir = Some(dir);
        }
        if let Some(limit) = read(ENV_LIST_LIMIT) {
            config.list_limit = parse_list_limit(&limit)?;
        }

        Ok(config)
    }
}

fn parse_list_limit(value: &str) -> Result<u32, ConfigError> {
    match value.parse::<u32>() {
        Ok(limit) if (1..=MAX_LIST_LIMIT).contains(&limit) => Ok(limit),
        _ => Err(ConfigError::InvalidListLimit(value.to_string())),
    }
}
