//! Error types for the formrender configuration loader

use std::path::PathBuf;
use thiserror::Error;

/// Result type for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Configuration file format not supported
    #[error("Unsupported configuration file format: {path}")]
    UnsupportedFormat { path: PathBuf },

    /// Configuration parsing failed
    #[error("Failed to parse configuration: {source}")]
    ParseError {
        #[source]
        source: Box<figment::Error>,
    },

    /// Invalid configuration value
    #[error("Invalid configuration value for key '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

impl From<figment::Error> for ConfigError {
    fn from(error: figment::Error) -> Self {
        ConfigError::ParseError {
            source: Box::new(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ConfigError::FileNotFound {
            path: PathBuf::from("/tmp/formrender.toml"),
        };
        assert_eq!(
            err.to_string(),
            "Configuration file not found: /tmp/formrender.toml"
        );
    }

    #[test]
    fn test_invalid_value_mentions_key() {
        let err = ConfigError::InvalidValue {
            key: "propagation.max_depth".into(),
            message: "must be at least 1".into(),
        };
        assert!(err.to_string().contains("propagation.max_depth"));
    }
}
