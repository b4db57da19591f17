//! Configuration loading and types for fencesite.
//!
//! This module handles all aspects of configuration:
//! - Type definitions for config structures (`types`)
//! - Loading configs from files and the environment (`load`)

mod load;
mod types;

// Re-export all types for convenient access
pub use load::CONFIG_FILE;
pub use types::{BusinessInfo, OutputFormat, ProxyConfig, RootConfig};

// =============================================================================
// Errors
// =============================================================================

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("failed to deserialize config: {0}")]
    Deserialize(#[from] config::ConfigError),

    #[error("failed to get current working directory: {0}")]
    CwdFailure(std::io::Error),

    #[error("failed to encode config file path as a unicode string: {0}")]
    EncodePath(std::path::PathBuf),

    #[error("{0}")]
    Validation(String),
}

impl RootConfig {
    /// Check cross-field constraints that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.site.url_prefix.starts_with('/') {
            return Err(ConfigError::Validation(format!(
                "invalid config: 'site.url_prefix' must start with '/', got '{}'",
                self.site.url_prefix
            )));
        }
        if self.business.url.ends_with('/') {
            return Err(ConfigError::Validation(
                "invalid config: 'business.url' must not end with '/'".to_string(),
            ));
        }
        if self.business.service_radius_m == 0 {
            return Err(ConfigError::Validation(
                "invalid config: 'business.service_radius_m' must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
