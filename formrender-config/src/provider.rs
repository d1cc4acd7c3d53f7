//! Configuration provider using Figment

use crate::discovery::ConfigFormat;
use crate::error::{ConfigError, ConfigResult};
use crate::types::EngineConfig;
use figment::{
    providers::{Env, Format, Json, Serialized, Toml, Yaml},
    Figment,
};
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Prefix for environment overrides, e.g. `FORMRENDER_HTTP__TIMEOUT_MS`.
pub const ENV_PREFIX: &str = "FORMRENDER_";

/// Loads [`EngineConfig`] from layered sources.
///
/// Sources are merged in precedence order (later sources override earlier ones):
/// 1. Default values
/// 2. An optional configuration file (TOML, YAML or JSON)
/// 3. Environment variables prefixed with `FORMRENDER_`, nested keys split on `__`
#[derive(Debug)]
pub struct ConfigLoader {
    file: Option<PathBuf>,
    use_env: bool,
}

impl ConfigLoader {
    /// Create a loader that reads defaults and environment variables
    pub fn new() -> Self {
        Self {
            file: None,
            use_env: true,
        }
    }

    /// Layer a configuration file on top of the defaults
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    /// Skip environment variables entirely
    pub fn without_env(mut self) -> Self {
        self.use_env = false;
        self
    }

    /// Build the merged figment and extract the typed configuration
    pub fn load(&self) -> ConfigResult<EngineConfig> {
        let figment = self.build_figment()?;
        let config: EngineConfig = figment.extract()?;
        validate(&config)?;
        debug!(
            max_depth = config.propagation.max_depth,
            backend = ?config.http.backend,
            "engine configuration loaded"
        );
        Ok(config)
    }

    fn build_figment(&self) -> ConfigResult<Figment> {
        let mut figment = Figment::from(Serialized::defaults(EngineConfig::default()));

        if let Some(path) = &self.file {
            trace!(path = %path.display(), "merging configuration file");
            figment = figment.merge(file_provider(path)?);
        }

        if self.use_env {
            figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));
        }

        Ok(figment)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn file_provider(path: &Path) -> ConfigResult<Figment> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    match ConfigFormat::from_path(path) {
        Some(ConfigFormat::Toml) => Ok(Figment::from(Toml::file(path))),
        Some(ConfigFormat::Yaml) => Ok(Figment::from(Yaml::file(path))),
        Some(ConfigFormat::Json) => Ok(Figment::from(Json::file(path))),
        None => Err(ConfigError::UnsupportedFormat {
            path: path.to_path_buf(),
        }),
    }
}

fn validate(config: &EngineConfig) -> ConfigResult<()> {
    if config.propagation.max_depth == 0 {
        return Err(ConfigError::InvalidValue {
            key: "propagation.max_depth".into(),
            message: "must be at least 1".into(),
        });
    }
    if config.http.timeout_ms == 0 {
        return Err(ConfigError::InvalidValue {
            key: "http.timeout_ms".into(),
            message: "must be greater than zero".into(),
        });
    }
    Ok(())
}
