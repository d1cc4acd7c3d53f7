//! Strongly typed engine settings.
//!
//! Every field has a default so a partial file (or no file at all) still
//! produces a complete [`EngineConfig`].

use serde::{Deserialize, Serialize};

/// Default bound on nested dependency propagation.
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Default HTTP timeout for async bindings, in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Top-level settings for one form engine instance.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    pub propagation: PropagationConfig,
    pub http: HttpConfig,
}

/// Limits applied while change notifications fan out through the
/// dependency graph.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PropagationConfig {
    /// How many nested propagation levels are allowed before further
    /// notifications are dropped. Guards against dependency cycles.
    pub max_depth: usize,
}

impl Default for PropagationConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Which fetch backend resolves async bindings.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum FetchBackend {
    /// Real HTTP requests.
    #[default]
    Http,
    /// Every async binding fails immediately; useful offline and in tests.
    Disabled,
}

/// Outbound HTTP settings for async bindings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HttpConfig {
    pub backend: FetchBackend,
    /// Prefix for binding URLs that start with `/`.
    pub base_url: Option<String>,
    pub timeout_ms: u64,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            backend: FetchBackend::Http,
            base_url: None,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            user_agent: concat!("formrender/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}
