//! Configuration management

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

// ============================================================================
// Server Configuration Constants
// ============================================================================

/// Default server host binding.
pub const DEFAULT_SERVER_HOST: &str = "127.0.0.1";

/// Default server port.
pub const DEFAULT_SERVER_PORT: u16 = 8000;

/// Default shutdown timeout in seconds.
pub const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 30;

/// Default request body limit for multipart uploads (50 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Default shared folder holding run staging directories.
pub const DEFAULT_SHARED_INPUT_FOLDER: &str = "/shared/input";

/// Default base address of the workflow engine REST API.
pub const DEFAULT_ENGINE_API_URL: &str = "http://airflow-webserver:8080/api/v1";

/// Default engine basic-auth user.
pub const DEFAULT_ENGINE_USER: &str = "airflow";

/// Default engine basic-auth password.
pub const DEFAULT_ENGINE_PASSWORD: &str = "airflow";

/// Default per-call engine timeout in seconds.
pub const DEFAULT_ENGINE_TIMEOUT_SECS: u64 = 30;

/// Default wait between status polls in seconds.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;

/// Default number of status calls a single poll may make.
pub const DEFAULT_MAX_POLL_ATTEMPTS: u32 = 120;

/// Default CORS allowed origin for local development.
pub const DEFAULT_CORS_ALLOWED_ORIGIN: &str = "http://localhost:3000";

/// Gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub staging: StagingConfig,
    pub engine: EngineConfig,
    pub polling: PollingConfig,
    pub cors: CorsConfig,
}

/// Server-specific configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub shutdown_timeout_secs: u64,
    pub max_upload_bytes: usize,
}

/// Shared staging filesystem configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StagingConfig {
    pub shared_root: PathBuf,
}

/// Workflow engine connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub base_url: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub timeout_secs: u64,
}

impl EngineConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Run status polling configuration
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PollingConfig {
    pub interval_secs: u64,
    pub max_attempts: u32,
}

impl PollingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
    pub allow_credentials: bool,
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

fn env_string(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

impl Config {
    /// Load configuration from environment (and `.env`) over the defaults
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Config {
            server: ServerConfig {
                host: env_string("GATEWAY_HOST", DEFAULT_SERVER_HOST),
                port: env_or("GATEWAY_PORT", DEFAULT_SERVER_PORT),
                shutdown_timeout_secs: env_or(
                    "GATEWAY_SHUTDOWN_TIMEOUT",
                    DEFAULT_SHUTDOWN_TIMEOUT_SECS,
                ),
                max_upload_bytes: env_or("GATEWAY_MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES),
            },
            staging: StagingConfig {
                shared_root: PathBuf::from(env_string(
                    "SHARED_INPUT_FOLDER",
                    DEFAULT_SHARED_INPUT_FOLDER,
                )),
            },
            engine: EngineConfig {
                base_url: env_string("AIRFLOW_API_URL", DEFAULT_ENGINE_API_URL),
                username: env_string("AIRFLOW_API_USER", DEFAULT_ENGINE_USER),
                password: env_string("AIRFLOW_API_PASS", DEFAULT_ENGINE_PASSWORD),
                timeout_secs: env_or("API_TIMEOUT", DEFAULT_ENGINE_TIMEOUT_SECS),
            },
            polling: PollingConfig {
                interval_secs: env_or("POLL_INTERVAL_SECONDS", DEFAULT_POLL_INTERVAL_SECS),
                max_attempts: env_or("MAX_POLL_ATTEMPTS", DEFAULT_MAX_POLL_ATTEMPTS),
            },
            cors: CorsConfig {
                allowed_origins: env_string("CORS_ALLOWED_ORIGINS", DEFAULT_CORS_ALLOWED_ORIGIN)
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
                allow_credentials: env_or("CORS_ALLOW_CREDENTIALS", false),
            },
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.server.port == 0 {
            anyhow::bail!("Server port must be greater than 0");
        }

        if self.server.max_upload_bytes == 0 {
            anyhow::bail!("GATEWAY_MAX_UPLOAD_BYTES must be greater than 0");
        }

        if self.staging.shared_root.as_os_str().is_empty() {
            anyhow::bail!("SHARED_INPUT_FOLDER cannot be empty");
        }

        if !self.engine.base_url.starts_with("http://")
            && !self.engine.base_url.starts_with("https://")
        {
            anyhow::bail!(
                "AIRFLOW_API_URL must start with http:// or https:// (got '{}')",
                self.engine.base_url
            );
        }

        if self.engine.timeout_secs == 0 {
            anyhow::bail!("API_TIMEOUT must be at least 1 second");
        }

        if self.polling.interval_secs == 0 {
            anyhow::bail!("POLL_INTERVAL_SECONDS must be at least 1 second");
        }

        if self.polling.max_attempts == 0 {
            anyhow::bail!("MAX_POLL_ATTEMPTS must be at least 1");
        }

        if self.cors.allowed_origins.is_empty() {
            tracing::warn!("No CORS origins configured - all origins will be allowed");
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: DEFAULT_SERVER_HOST.to_string(),
                port: DEFAULT_SERVER_PORT,
                shutdown_timeout_secs: DEFAULT_SHUTDOWN_TIMEOUT_SECS,
                max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            },
            staging: StagingConfig {
                shared_root: PathBuf::from(DEFAULT_SHARED_INPUT_FOLDER),
            },
            engine: EngineConfig {
                base_url: DEFAULT_ENGINE_API_URL.to_string(),
                username: DEFAULT_ENGINE_USER.to_string(),
                password: DEFAULT_ENGINE_PASSWORD.to_string(),
                timeout_secs: DEFAULT_ENGINE_TIMEOUT_SECS,
            },
            polling: PollingConfig {
                interval_secs: DEFAULT_POLL_INTERVAL_SECS,
                max_attempts: DEFAULT_MAX_POLL_ATTEMPTS,
            },
            cors: CorsConfig {
                allowed_origins: vec![DEFAULT_CORS_ALLOWED_ORIGIN.to_string()],
                allow_credentials: false,
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: &[&str] = &[
        "SHARED_INPUT_FOLDER",
        "AIRFLOW_API_URL",
        "POLL_INTERVAL_SECONDS",
        "MAX_POLL_ATTEMPTS",
        "CORS_ALLOWED_ORIGINS",
    ];

    fn clear_env() {
        for var in VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    #[serial]
    fn test_load_reads_environment() {
        clear_env();
        std::env::set_var("SHARED_INPUT_FOLDER", "/tmp/gateway-shared");
        std::env::set_var("AIRFLOW_API_URL", "https://engine.internal/api/v1");
        std::env::set_var("POLL_INTERVAL_SECONDS", "2");
        std::env::set_var("MAX_POLL_ATTEMPTS", "7");
        std::env::set_var("CORS_ALLOWED_ORIGINS", "https://a.example, https://b.example");

        let config = Config::load().unwrap();
        clear_env();

        assert_eq!(config.staging.shared_root, PathBuf::from("/tmp/gateway-shared"));
        assert_eq!(config.engine.base_url, "https://engine.internal/api/v1");
        assert_eq!(config.polling.interval(), Duration::from_secs(2));
        assert_eq!(config.polling.max_attempts, 7);
        assert_eq!(
            config.cors.allowed_origins,
            vec!["https://a.example".to_string(), "https://b.example".to_string()]
        );
    }

    #[test]
    #[serial]
    fn test_load_rejects_zero_poll_attempts() {
        clear_env();
        std::env::set_var("MAX_POLL_ATTEMPTS", "0");
        let result = Config::load();
        clear_env();
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_rejects_non_http_engine_url() {
        let mut config = Config::default();
        config.engine.base_url = "airflow:8080".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_interval() {
        let mut config = Config::default();
        config.polling.interval_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_engine_password_is_not_serialized() {
        let json = serde_json::to_value(Config::default()).unwrap();
        assert!(json["engine"].get("password").is_none());
        assert_eq!(json["engine"]["username"], DEFAULT_ENGINE_USER);
    }
}
