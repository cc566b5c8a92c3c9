use super::{
    types::{AuthMethod, Config},
    ConfigError,
};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Engine URL is http(s) and an engine API key is set
/// - Timeouts and the snapshot interval are non-zero
/// - An inbound API key exists when api_key auth is selected
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    let url = config.engine.url.trim();
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(ConfigError::ValidationError(format!(
            "engine.url must be an http(s) URL, got '{}'",
            config.engine.url
        )));
    }

    if config.engine.api_key.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "engine.api_key cannot be empty".to_string(),
        ));
    }

    if config.engine.api_key_header.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "engine.api_key_header cannot be empty".to_string(),
        ));
    }

    if config.engine.timeout_secs == 0 || config.engine.health_timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "engine timeouts must be greater than 0".to_string(),
        ));
    }

    if config.snapshots.interval_secs == 0 {
        return Err(ConfigError::ValidationError(
            "snapshots.interval_secs must be greater than 0".to_string(),
        ));
    }

    if config.auth.method == AuthMethod::ApiKey
        && config.auth.api_key.as_deref().unwrap_or("").is_empty()
    {
        return Err(ConfigError::ValidationError(
            "auth.api_key must be set when auth.method = \"api_key\"".to_string(),
        ));
    }

    Ok(())
}
