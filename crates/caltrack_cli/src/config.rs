//! Settings resolution: flags and env first, then the TOML file, then defaults.

use anyhow::{Context, Result};
use caltrack_core::{default_log_level, DEFAULT_TABLE, REMINDER_HORIZON_DAYS};
use serde::Deserialize;
use std::path::{Path, PathBuf};

const DEFAULT_DATABASE: &str = "device_database.db";
const DEFAULT_LOG_SUBDIR: &str = "logs";

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default, Debug)]
#[serde(default)]
pub struct ConfigFile {
    pub database: Option<PathBuf>,
    pub table: Option<String>,
    pub horizon_days: Option<i64>,
    pub log_dir: Option<PathBuf>,
    pub log_level: Option<String>,
    pub sender: Option<String>,
}

impl ConfigFile {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("parsing config file {}", path.display()))
    }
}

/// Values given on the command line or through the environment.
#[derive(Debug, Default)]
pub struct Overrides {
    pub database: Option<PathBuf>,
    pub table: Option<String>,
    pub horizon_days: Option<i64>,
    pub log_dir: Option<PathBuf>,
    pub log_level: Option<String>,
    pub sender: Option<String>,
}

/// Fully resolved settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub database: PathBuf,
    pub table: String,
    pub horizon_days: i64,
    pub log_dir: PathBuf,
    pub log_level: String,
    pub sender: Option<String>,
}

impl Settings {
    pub fn resolve(overrides: Overrides, file: ConfigFile, cwd: &Path) -> Self {
        let log_dir = overrides
            .log_dir
            .or(file.log_dir)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_SUBDIR));

        Self {
            database: overrides
                .database
                .or(file.database)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE)),
            table: overrides
                .table
                .or(file.table)
                .unwrap_or_else(|| DEFAULT_TABLE.to_string()),
            horizon_days: overrides
                .horizon_days
                .or(file.horizon_days)
                .unwrap_or(REMINDER_HORIZON_DAYS),
            log_dir: if log_dir.is_absolute() {
                log_dir
            } else {
                cwd.join(log_dir)
            },
            log_level: overrides
                .log_level
                .or(file.log_level)
                .unwrap_or_else(|| default_log_level().to_string()),
            sender: overrides.sender.or(file.sender),
        }
    }
}
