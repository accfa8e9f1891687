//! HTTP API configuration.

use std::net::SocketAddr;

use super::parse::env_opt;
use super::ConfigError;

/// HTTP API server configuration.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Listen address (WPQM_API_ADDR, default 127.0.0.1:9180).
    pub listen_addr: SocketAddr,
    /// Bearer token required on every request (WPQM_API_TOKEN).
    /// None disables authentication.
    pub token: Option<String>,
}

impl ApiConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let raw = super::parse::env_or("WPQM_API_ADDR", "127.0.0.1:9180");
        let listen_addr = raw.parse().map_err(|_| ConfigError::Invalid {
            key: "WPQM_API_ADDR".into(),
            message: format!("'{}' is not a valid socket address", raw),
        })?;

        Ok(Self {
            listen_addr,
            token: env_opt("WPQM_API_TOKEN"),
        })
    }
}
