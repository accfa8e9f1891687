//! Configuration module for wpqm.
//!
//! Centralized configuration loading from environment variables.
//!
//! # Example
//!
//! ```rust,ignore
//! use wpqm::config::Config;
//!
//! let config = Config::from_env()?;
//! println!("WP-CLI binary: {}", config.host.wp_bin);
//! ```

mod api;
mod error;
mod host;
mod logging;
mod parse;

pub use api::ApiConfig;
pub use error::ConfigError;
pub use host::HostConfig;
pub use logging::LoggingConfig;

/// Complete application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    /// WordPress host configuration.
    pub host: HostConfig,
    /// HTTP API configuration.
    pub api: ApiConfig,
    /// Logging configuration.
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            host: HostConfig::from_env()?,
            api: ApiConfig::from_env()?,
            logging: LoggingConfig::from_env()?,
        })
    }

    /// Print configuration summary to log.
    pub fn log_summary(&self) {
        use tracing::info;

        info!("Configuration loaded:");
        info!("  WP-CLI binary: {}", self.host.wp_bin);
        if let Some(ref path) = self.host.wp_path {
            info!("  WordPress path: {}", path);
        }
        info!("  API listen: {}", self.api.listen_addr);
        info!(
            "  API auth: {}",
            if self.api.token.is_some() {
                "token"
            } else {
                "disabled"
            }
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        std::env::remove_var("WPQM_WP_BIN");
        std::env::remove_var("WPQM_WP_PATH");
        std::env::remove_var("WPQM_API_ADDR");
        std::env::remove_var("WPQM_API_TOKEN");

        let config = Config::from_env().expect("Should load config");

        assert_eq!(config.host.wp_bin, "wp");
        assert!(config.host.wp_path.is_none());
        assert_eq!(
            config.api.listen_addr,
            "127.0.0.1:9180".parse().unwrap()
        );
        assert!(config.api.token.is_none());
    }
}
