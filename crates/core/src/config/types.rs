use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub auth: AuthConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    pub engine: EngineConfig,
    #[serde(default)]
    pub snapshots: SnapshotConfig,
    #[serde(default)]
    pub defaults: OrderDefaults,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8080
}

/// Inbound authentication configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    pub method: AuthMethod,
    /// Required when `method = "api_key"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    None,
    ApiKey,
}

/// Database configuration. Campaigns and snapshots share one SQLite file.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("fixer.db")
}

/// Connection settings for the external ordering engine.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EngineConfig {
    /// Engine base URL (e.g., "http://localhost:5001")
    pub url: String,
    /// Static API key sent on every engine request
    pub api_key: String,
    /// Header carrying the API key (default: X-API-Key)
    #[serde(default = "default_api_key_header")]
    pub api_key_header: String,
    /// Deadline for create/status/stop calls in seconds (default: 15)
    #[serde(default = "default_engine_timeout")]
    pub timeout_secs: u64,
    /// Deadline for the liveness probe in seconds (default: 5)
    #[serde(default = "default_health_timeout")]
    pub health_timeout_secs: u64,
}

fn default_api_key_header() -> String {
    "X-API-Key".to_string()
}

fn default_engine_timeout() -> u64 {
    15
}

fn default_health_timeout() -> u64 {
    5
}

/// Snapshot persistence settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SnapshotConfig {
    /// Minimum seconds between two polled snapshots of one campaign (default: 300)
    #[serde(default = "default_snapshot_interval")]
    pub interval_secs: u64,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_snapshot_interval(),
        }
    }
}

fn default_snapshot_interval() -> u64 {
    300
}

/// Ordering parameters applied when a start request leaves them out.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct OrderDefaults {
    #[serde(default = "default_wait_time")]
    pub wait_time: u32,
    #[serde(default = "default_minimum_engagement")]
    pub minimum_engagement: u32,
    #[serde(default = "default_server_id")]
    pub comment_server_id: u32,
    #[serde(default = "default_server_id")]
    pub like_server_id: u32,
    #[serde(default = "default_tier")]
    pub tier: String,
    #[serde(default = "default_comments_source")]
    pub comments_source: String,
}

impl Default for OrderDefaults {
    fn default() -> Self {
        Self {
            wait_time: default_wait_time(),
            minimum_engagement: default_minimum_engagement(),
            comment_server_id: default_server_id(),
            like_server_id: default_server_id(),
            tier: default_tier(),
            comments_source: default_comments_source(),
        }
    }
}

fn default_wait_time() -> u32 {
    36
}

fn default_minimum_engagement() -> u32 {
    500
}

fn default_server_id() -> u32 {
    1
}

fn default_tier() -> String {
    "standard".to_string()
}

fn default_comments_source() -> String {
    "default".to_string()
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub auth: SanitizedAuthConfig,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub engine: SanitizedEngineConfig,
    pub snapshots: SnapshotConfig,
    pub defaults: OrderDefaults,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedAuthConfig {
    pub method: String,
    pub api_key_configured: bool,
}

/// Engine settings with the API key hidden
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedEngineConfig {
    pub url: String,
    pub api_key_header: String,
    pub api_key_configured: bool,
    pub timeout_secs: u64,
    pub health_timeout_secs: u64,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            auth: SanitizedAuthConfig {
                method: match config.auth.method {
                    AuthMethod::None => "none".to_string(),
                    AuthMethod::ApiKey => "api_key".to_string(),
                },
                api_key_configured: config
                    .auth
                    .api_key
                    .as_ref()
                    .is_some_and(|k| !k.is_empty()),
            },
            server: config.server.clone(),
            database: config.database.clone(),
            engine: SanitizedEngineConfig {
                url: config.engine.url.clone(),
                api_key_header: config.engine.api_key_header.clone(),
                api_key_configured: !config.engine.api_key.is_empty(),
                timeout_secs: config.engine.timeout_secs,
                health_timeout_secs: config.engine.health_timeout_secs,
            },
            snapshots: config.snapshots.clone(),
            defaults: config.defaults.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ENGINE: &str = r#"
[engine]
url = "http://localhost:5001"
api_key = "engine-secret"
"#;

    fn parse(extra: &str) -> Config {
        toml::from_str(&format!("{}\n{}", extra, ENGINE)).unwrap()
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let config = parse("[auth]\nmethod = \"none\"\n");
        assert_eq!(config.auth.method, AuthMethod::None);
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host.to_string(), "0.0.0.0");
        assert_eq!(config.database.path.to_str().unwrap(), "fixer.db");
        assert_eq!(config.engine.api_key_header, "X-API-Key");
        assert_eq!(config.engine.timeout_secs, 15);
        assert_eq!(config.engine.health_timeout_secs, 5);
        assert_eq!(config.snapshots.interval_secs, 300);
        assert_eq!(config.defaults, OrderDefaults::default());
    }

    #[test]
    fn test_deserialize_missing_auth_fails() {
        let result: Result<Config, _> = toml::from_str(ENGINE);
        assert!(result.is_err());
    }

    #[test]
    fn test_deserialize_partial_defaults() {
        let config = parse(
            r#"
[auth]
method = "api_key"
api_key = "inbound"

[defaults]
tier = "premium"
wait_time = 90
"#,
        );
        assert_eq!(config.auth.method, AuthMethod::ApiKey);
        assert_eq!(config.defaults.tier, "premium");
        assert_eq!(config.defaults.wait_time, 90);
        assert_eq!(config.defaults.minimum_engagement, 500);
        assert_eq!(config.defaults.comments_source, "default");
    }

    #[test]
    fn test_sanitized_config_hides_keys() {
        let config = parse("[auth]\nmethod = \"api_key\"\napi_key = \"inbound\"\n");
        let sanitized = SanitizedConfig::from(&config);

        assert_eq!(sanitized.auth.method, "api_key");
        assert!(sanitized.auth.api_key_configured);
        assert!(sanitized.engine.api_key_configured);

        let json = serde_json::to_string(&sanitized).unwrap();
        assert!(!json.contains("engine-secret"));
        assert!(!json.contains("inbound"));
    }
}
