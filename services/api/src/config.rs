use safeclass_core::config::ProviderConfig;
use std::net::SocketAddr;
use tracing::Level;

pub use safeclass_core::config::{ConfigError, Provider};

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub log_level: Level,
    pub provider: ProviderConfig,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        let bind_address = match std::env::var("BIND_ADDRESS") {
            Ok(bind_address_str) => bind_address_str.parse::<SocketAddr>().map_err(|e| {
                ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
            })?,
            Err(_) => {
                let port_str = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
                let port = port_str.parse::<u16>().map_err(|_| {
                    ConfigError::InvalidValue(
                        "PORT".to_string(),
                        format!("'{}' is not a valid port", port_str),
                    )
                })?;
                SocketAddr::from(([0, 0, 0, 0], port))
            }
        };

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let provider = ProviderConfig::from_env()?;

        Ok(Self {
            bind_address,
            log_level,
            provider,
        })
    }
}
