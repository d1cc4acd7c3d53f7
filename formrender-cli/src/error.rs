//! Error types for the formrender CLI

use formrender_config::ConfigError;
use formrender_fields::FieldsError;
use thiserror::Error;

/// Errors surfaced by CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// Engine configuration could not be loaded
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The form engine failed
    #[error(transparent)]
    Fields(#[from] FieldsError),

    /// Values file could not be read
    #[error("cannot read values file {path}: {source}")]
    ReadValues {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Values file is not a JSON or YAML object
    #[error("invalid values file {path}: {message}")]
    InvalidValues { path: String, message: String },

    /// Output could not be serialized
    #[error("cannot serialize output: {0}")]
    Output(#[from] serde_json::Error),
}

/// Result type for CLI commands
pub type CliResult<T> = std::result::Result<T, CliError>;
