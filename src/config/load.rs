//! Configuration loading from files and the environment.
//!
//! The config file is optional; environment variables prefixed with
//! `FENCESITE__` override individual keys (`FENCESITE__SITE__OUTPUT=dist`).

use std::path::Path;

use super::{ConfigError, RootConfig};

/// Default config file name, resolved against the working directory.
pub const CONFIG_FILE: &str = "fencesite.yaml";

/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "FENCESITE";

impl RootConfig {
    /// Load the config from the command line argument, defaulting to `fencesite.yaml`
    pub fn load_from_arg(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let config_file = config_file.unwrap_or(Path::new(CONFIG_FILE));
        let config_file = if config_file.is_relative() {
            std::env::current_dir()
                .map_err(ConfigError::CwdFailure)?
                .join(config_file)
        } else {
            config_file.to_path_buf()
        };

        Self::load_from_file(&config_file)
    }

    /// Load the config from a file path, layering environment overrides on top.
    ///
    /// A missing file is not an error: every key has a default.
    pub(crate) fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let path_str = path
            .to_str()
            .ok_or_else(|| ConfigError::EncodePath(path.to_path_buf()))?;

        let settings = config::Config::builder()
            .add_source(config::File::new(path_str, config::FileFormat::Yaml).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: RootConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }
}
