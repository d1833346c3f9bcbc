use std::fs;
use tracing::{debug, error, info, warn};

use crate::types::server_config::{AppConfig, ConfigError};

pub fn load_config(path: &str) -> Result<AppConfig, ConfigError> {
    info!("Loading configuration from: {}", path);

    let contents = fs::read_to_string(path)?;
    debug!("Processing file: {}", path);

    parse_config(&contents)
}

/// Parse and validate a config document already in memory.
pub fn parse_config(contents: &str) -> Result<AppConfig, ConfigError> {
    if contents.trim().is_empty() {
        error!("Configuration file is empty");
        return Err(ConfigError::InvalidConfig("empty file".into()));
    }

    let config: AppConfig = toml::from_str(contents)?;

    validate_config(&config)?;

    info!("Config validated");

    Ok(config)
}

fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.auth.token_ttl_days == 0 {
        return Err(ConfigError::InvalidConfig(
            "token_ttl_days must be greater than 0".into(),
        ));
    }

    if config.auth.token_ttl_secs().is_none() {
        return Err(ConfigError::InvalidConfig(format!(
            "token_ttl_days is too large: {}",
            config.auth.token_ttl_days
        )));
    }

    if config.server.request_timeout_secs == 0 {
        return Err(ConfigError::InvalidConfig(
            "request_timeout_secs must be greater than 0".into(),
        ));
    }

    // The signing secret has no default: a server without one must not start.
    match config.auth.resolved_jwt_secret() {
        None => {
            return Err(ConfigError::InvalidConfig(
                "jwt_secret must be set via the JWT_SECRET env var or auth.jwt_secret config field"
                    .into(),
            ));
        }
        Some(secret) if secret.len() < 32 => {
            warn!("jwt_secret is shorter than the recommended 32 bytes");
        }
        _ => {}
    }

    Ok(())
}
