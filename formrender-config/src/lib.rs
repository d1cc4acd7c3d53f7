//! Configuration management for formrender using Figment
//!
//! Engine settings are layered with a clear precedence order:
//! defaults → configuration file → `FORMRENDER_` environment variables.
//!
//! # Quick Start
//!
//! ```no_run
//! use formrender_config::ConfigLoader;
//!
//! let config = ConfigLoader::new().with_file("formrender.toml").load()?;
//! println!("max propagation depth: {}", config.propagation.max_depth);
//! # Ok::<(), formrender_config::ConfigError>(())
//! ```
//!
//! # Environment Variables
//!
//! Nested keys are separated by a double underscore:
//!
//! ```bash
//! export FORMRENDER_PROPAGATION__MAX_DEPTH=8   # → propagation.max_depth
//! export FORMRENDER_HTTP__BACKEND=disabled     # → http.backend
//! export FORMRENDER_HTTP__TIMEOUT_MS=5000      # → http.timeout_ms
//! ```

/// File format detection
pub mod discovery;
/// Error types and handling
pub mod error;
/// Layered loader built on figment
pub mod provider;
/// Typed configuration structures
pub mod types;

pub use discovery::ConfigFormat;
pub use error::{ConfigError, ConfigResult};
pub use provider::{ConfigLoader, ENV_PREFIX};
pub use types::{
    EngineConfig, FetchBackend, HttpConfig, PropagationConfig, DEFAULT_MAX_DEPTH,
    DEFAULT_TIMEOUT_MS,
};
