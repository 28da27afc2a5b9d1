//! Configuration types shared across the workspace

use serde::{Deserialize, Serialize};

/// Log levels accepted by [`LoggingConfig::level`]
pub const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Whether to emit ANSI colour codes
    pub ansi: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            ansi: true,
        }
    }
}

impl LoggingConfig {
    /// Whether `level` names one of [`LOG_LEVELS`]
    pub fn is_valid_level(&self) -> bool {
        LOG_LEVELS.contains(&self.level.as_str())
    }
}
