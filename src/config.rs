//! Configuration management for Codepulse.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use crate::error::{CodepulseError, Result};
use crate::store::DEFAULT_MEMORY_CAPACITY;

/// Main configuration for the Codepulse service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CodepulseConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limiting: RateLimitingConfig,

    /// CORS configuration
    #[serde(default)]
    pub cors: CorsConfig,

    /// Request store configuration
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP listen address
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,

    /// Largest request body accepted, in bytes
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

fn default_max_body_bytes() -> usize {
    1024 * 1024
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitingConfig {
    /// Requests a single client may make within one window
    #[serde(default = "default_max_requests")]
    pub max_requests_per_window: u64,

    /// Window length in seconds
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
}

impl RateLimitingConfig {
    /// Window length as a `Duration`.
    pub fn window_duration(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

impl Default for RateLimitingConfig {
    fn default() -> Self {
        Self {
            max_requests_per_window: default_max_requests(),
            window_secs: default_window_secs(),
        }
    }
}

fn default_max_requests() -> u64 {
    2
}

fn default_window_secs() -> u64 {
    60
}

/// CORS configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Whether the CORS stage wraps the pipeline at all
    #[serde(default = "default_cors_enabled")]
    pub enabled: bool,

    #[serde(default = "default_allow_origin")]
    pub allow_origin: String,

    #[serde(default = "default_allow_methods")]
    pub allow_methods: String,

    #[serde(default = "default_allow_headers")]
    pub allow_headers: String,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: default_cors_enabled(),
            allow_origin: default_allow_origin(),
            allow_methods: default_allow_methods(),
            allow_headers: default_allow_headers(),
        }
    }
}

fn default_cors_enabled() -> bool {
    true
}

fn default_allow_origin() -> String {
    "*".to_string()
}

fn default_allow_methods() -> String {
    "GET, POST, OPTIONS".to_string()
}

fn default_allow_headers() -> String {
    "Content-Type".to_string()
}

/// Request store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Path to the SQLite database; visits are kept in memory when unset
    pub database_path: Option<PathBuf>,

    /// Most recent visits retained by the in-memory store
    #[serde(default = "default_memory_capacity")]
    pub memory_capacity: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            memory_capacity: default_memory_capacity(),
        }
    }
}

fn default_memory_capacity() -> usize {
    DEFAULT_MEMORY_CAPACITY
}

impl CodepulseConfig {
    /// Load configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!(path = %path.display(), "Loading configuration");

        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Load configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: CodepulseConfig = serde_yaml::from_str(yaml)
            .map_err(|e| CodepulseError::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.rate_limiting.window_secs == 0 {
            return Err(CodepulseError::Config(
                "rate_limiting.window_secs must be greater than zero".to_string(),
            ));
        }
        if self.server.max_body_bytes == 0 {
            return Err(CodepulseError::Config(
                "server.max_body_bytes must be greater than zero".to_string(),
            ));
        }
        if self.storage.memory_capacity == 0 {
            return Err(CodepulseError::Config(
                "storage.memory_capacity must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CodepulseConfig::default();
        assert_eq!(config.server.listen_addr.port(), 8080);
        assert_eq!(config.rate_limiting.max_requests_per_window, 2);
        assert_eq!(
            config.rate_limiting.window_duration(),
            Duration::from_secs(60)
        );
        assert!(config.cors.enabled);
        assert_eq!(config.cors.allow_origin, "*");
        assert!(config.storage.database_path.is_none());
        assert_eq!(config.storage.memory_capacity, 1000);
    }

    #[test]
    fn test_from_yaml_partial() {
        let yaml = r#"
server:
  listen_addr: "127.0.0.1:9000"
rate_limiting:
  max_requests_per_window: 10
"#;
        let config = CodepulseConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.server.listen_addr.port(), 9000);
        assert_eq!(config.server.max_body_bytes, 1024 * 1024);
        assert_eq!(config.rate_limiting.max_requests_per_window, 10);
        assert_eq!(config.rate_limiting.window_secs, 60);
        assert_eq!(config.cors.allow_methods, "GET, POST, OPTIONS");
    }

    #[test]
    fn test_from_yaml_storage_and_cors() {
        let yaml = r#"
cors:
  enabled: false
storage:
  database_path: "data/codepulse.db"
"#;
        let config = CodepulseConfig::from_yaml(yaml).unwrap();
        assert!(!config.cors.enabled);
        assert_eq!(
            config.storage.database_path,
            Some(PathBuf::from("data/codepulse.db"))
        );
    }

    #[test]
    fn test_zero_window_rejected() {
        let yaml = "rate_limiting:\n  window_secs: 0\n";
        let result = CodepulseConfig::from_yaml(yaml);
        assert!(matches!(result, Err(CodepulseError::Config(_))));
    }

    #[test]
    fn test_memory_capacity() {
        let config = CodepulseConfig::from_yaml("storage:\n  memory_capacity: 50\n").unwrap();
        assert_eq!(config.storage.memory_capacity, 50);

        let result = CodepulseConfig::from_yaml("storage:\n  memory_capacity: 0\n");
        assert!(matches!(result, Err(CodepulseError::Config(_))));
    }

    #[test]
    fn test_invalid_yaml_rejected() {
        let result = CodepulseConfig::from_yaml("server: [not, a, map]");
        assert!(matches!(result, Err(CodepulseError::Config(_))));
    }

    #[test]
    fn test_from_missing_file() {
        let result = CodepulseConfig::from_file("/nonexistent/codepulse.yaml");
        assert!(matches!(result, Err(CodepulseError::Io(_))));
    }
}
