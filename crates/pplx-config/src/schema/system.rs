//! Storage, event and logging settings.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Where sessions and conversations are persisted.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StorageConfig {
    /// Empty means the platform data directory (`~/.local/share/pplx` on Linux).
    pub data_dir: String,
}

impl StorageConfig {
    pub fn resolve_data_dir(&self) -> Option<PathBuf> {
        if self.data_dir.is_empty() {
            dirs::data_dir().map(|d| d.join("pplx"))
        } else {
            Some(PathBuf::from(&self.data_dir))
        }
    }
}

/// Notification bus sizing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EventsConfig {
    /// Broadcast capacity (valid range: 16-65536). Slow subscribers that
    /// fall further behind than this lose the oldest events.
    pub capacity: u32,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self { capacity: 1024 }
    }
}

/// Log level.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
#[derive(Default)]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warning,
    Error,
}

impl LogLevel {
    /// The matching `tracing` filter directive.
    pub fn as_directive(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warning => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: LogLevel,
}
