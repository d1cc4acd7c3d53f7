//! Error types for the field engine

use thiserror::Error;

/// Result type for field engine operations
pub type Result<T> = std::result::Result<T, FieldsError>;

/// Errors that can occur inside the field engine.
///
/// Most of these never reach callers of the public form API: async binding
/// and lifecycle failures are logged at the boundary and dropped.
#[derive(Debug, Error)]
pub enum FieldsError {
    /// Outbound request for an async binding failed
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Binding URL could not be parsed after token substitution
    #[error("invalid request URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// Async binding endpoint answered with a non-success status
    #[error("request to {url} returned status {status}")]
    HttpStatus { url: String, status: u16 },

    /// Async binding endpoint answered with a body that is not JSON
    #[error("response from {url} is not valid JSON: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The configured fetch backend does not issue requests
    #[error("fetching is disabled (url: {url})")]
    FetchDisabled { url: String },

    /// A binding `transform` callback rejected the response
    #[error("transform failed for field '{field}': {message}")]
    Transform { field: String, message: String },

    /// HTTP client could not be constructed
    #[error("HTTP client error: {0}")]
    Client(#[source] reqwest::Error),

    /// A lifecycle hook returned an error
    #[error("hook '{hook}' failed: {message}")]
    HookFailed { hook: String, message: String },

    /// A lifecycle hook panicked
    #[error("hook '{hook}' panicked")]
    HookPanicked { hook: String },

    /// Nested propagation went deeper than the configured limit
    #[error("propagation from '{path}' exceeded depth {max_depth}")]
    PropagationDepth { path: String, max_depth: usize },

    /// Schema file has an extension we cannot parse
    #[error("unsupported schema format: {path}")]
    UnsupportedSchemaFormat { path: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FieldsError::HttpStatus {
            url: "http://localhost/api".into(),
            status: 503,
        };
        assert_eq!(
            err.to_string(),
            "request to http://localhost/api returned status 503"
        );
    }

    #[test]
    fn test_hook_error() {
        let err = FieldsError::HookFailed {
            hook: "onMounted".into(),
            message: "boom".into(),
        };
        assert!(err.to_string().contains("onMounted"));
        assert!(err.to_string().contains("boom"));
    }
}
