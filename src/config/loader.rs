//! Configuration Loader
//!
//! Layered loading on top of the `config` crate: built-in defaults, then an optional
//! file, then `FLOWLANE_*` environment variables (`__` separates nested keys, e.g.
//! `FLOWLANE_POOL__MAX_TOTAL=20`). The merged result is validated before it is handed
//! out.

use config::{Config, Environment, File};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::error::{ConfigResult, ConfigurationError};
use super::RuntimeConfig;

const DEFAULT_FILE_STEM: &str = "flowlane";
const ENV_PREFIX: &str = "FLOWLANE";
const ENV_SEPARATOR: &str = "__";

#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    file: Option<PathBuf>,
    use_environment: bool,
}

impl ConfigLoader {
    /// Defaults, optional `./flowlane.*`, environment
    pub fn new() -> Self {
        Self {
            file: None,
            use_environment: true,
        }
    }

    /// Require a specific configuration file instead of the optional default
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        self.file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Skip environment overrides; useful in tests
    pub fn without_environment(mut self) -> Self {
        self.use_environment = false;
        self
    }

    pub fn load(&self) -> ConfigResult<RuntimeConfig> {
        let defaults = Config::try_from(&RuntimeConfig::default())
            .map_err(|e| ConfigurationError::load_error("defaults", e))?;

        let mut builder = Config::builder().add_source(defaults);

        builder = match &self.file {
            Some(path) => {
                debug!(path = %path.display(), "⚙️ CONFIG: Loading configuration file");
                builder.add_source(File::from(path.as_path()).required(true))
            }
            None => builder.add_source(File::with_name(DEFAULT_FILE_STEM).required(false)),
        };

        if self.use_environment {
            builder = builder.add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator(ENV_SEPARATOR)
                    .try_parsing(true),
            );
        }

        let source_name = self
            .file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| DEFAULT_FILE_STEM.to_string());

        let merged = builder
            .build()
            .map_err(|e| ConfigurationError::load_error(source_name, e))?;

        let config: RuntimeConfig = merged
            .try_deserialize()
            .map_err(ConfigurationError::parse_error)?;

        config.validate()?;

        info!(
            pool_max_total = config.pool.max_total,
            pool_min_idle = config.pool.min_idle,
            poller = ?config.poller,
            produce_failure = ?config.produce_failure,
            "⚙️ CONFIG: Configuration loaded"
        );

        Ok(config)
    }
}
