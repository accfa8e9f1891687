//! WordPress host configuration.

use super::parse::{env_opt, env_or};
use super::ConfigError;

/// How to reach the WordPress installation under diagnosis.
#[derive(Clone, Debug)]
pub struct HostConfig {
    /// WP-CLI binary (WPQM_WP_BIN, default "wp").
    pub wp_bin: String,
    /// WordPress installation path passed as --path (WPQM_WP_PATH).
    pub wp_path: Option<String>,
}

impl HostConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            wp_bin: env_or("WPQM_WP_BIN", "wp"),
            wp_path: env_opt("WPQM_WP_PATH"),
        })
    }
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            wp_bin: "wp".to_string(),
            wp_path: None,
        }
    }
}
