//! Error handling shared across the workspace
//!
//! Library errors derive `thiserror::Error`; binaries wrap them with
//! `anyhow` at the top level.

use thiserror::Error;

/// Configuration-related errors
///
/// These errors occur during configuration loading, parsing, or validation.
#[derive(Error, Debug)]
pub enum ConfigurationError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },

    /// Configuration parsing failed
    #[error("Failed to parse configuration: {details}")]
    ParseError { details: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for {key}: {value} ({reason})")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    /// Environment variable error
    #[error("Environment variable error for {var}: {details}")]
    EnvironmentError { var: String, details: String },
}

impl ConfigurationError {
    /// Shorthand for [`ConfigurationError::InvalidValue`]
    pub fn invalid_value(
        key: impl Into<String>,
        value: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            key: key.into(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_value_message() {
        let err = ConfigurationError::invalid_value("device.platform_index", 7, "only 2 platforms");
        assert_eq!(
            err.to_string(),
            "Invalid configuration value for device.platform_index: 7 (only 2 platforms)"
        );
    }

    #[test]
    fn test_boxed_error_downcasts() {
        let err: Box<dyn std::error::Error + Send + Sync> =
            Box::new(ConfigurationError::FileNotFound {
                path: "bench.toml".into(),
            });
        assert!(matches!(
            err.downcast_ref::<ConfigurationError>(),
            Some(ConfigurationError::FileNotFound { .. })
        ));
    }
}
