use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub server: ServerConfig,

    pub security: SecurityConfig,

    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_path: String,

    pub log_level: String,

    /// Directory snapshots are written to.
    pub backup_path: String,

    /// Legacy flat-file export checked once at startup. Missing file is a
    /// no-op.
    pub legacy_data_path: String,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,

    /// Maximum database connections (default: 5)
    pub max_db_connections: u32,

    /// Minimum database connections (default: 1)
    pub min_db_connections: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: "sqlite:data/raffler.db".to_string(),
            log_level: "info".to_string(),
            backup_path: "backups".to_string(),
            legacy_data_path: "raffle_data.json".to_string(),
            worker_threads: 2,
            max_db_connections: 5,
            min_db_connections: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,

    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 6780,
            cors_allowed_origins: vec![
                "http://localhost:6780".to_string(),
                "http://127.0.0.1:6780".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Argon2 memory cost in KiB (default: 8192 = 8MB)
    /// Lower values reduce memory usage but decrease GPU resistance.
    pub argon2_memory_cost_kib: u32,

    /// Argon2 time cost (iterations) - higher = more CPU work
    pub argon2_time_cost: u32,

    /// Argon2 parallelism (default: 1)
    pub argon2_parallelism: u32,

    /// Failed logins before the account is temporarily locked.
    pub max_login_attempts: i32,

    /// How long a locked account stays locked.
    pub lockout_seconds: i64,

    /// Session token lifetime. Tokens are stateless; expiry is the only
    /// bound on their validity.
    pub token_ttl_minutes: i64,

    /// HMAC secret for session tokens. When unset a random secret is
    /// generated at startup, which invalidates outstanding tokens on
    /// restart.
    pub token_secret: Option<String>,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            argon2_memory_cost_kib: 8192,
            argon2_time_cost: 3,
            argon2_parallelism: 1,
            max_login_attempts: 3,
            lockout_seconds: 15 * 60,
            token_ttl_minutes: 30,
            token_secret: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Login attempts allowed per source address per minute.
    pub login_per_minute: u32,

    /// Bulk resets allowed per source address per hour.
    pub reset_all_per_hour: u32,

    /// Name imports allowed per source address per hour.
    pub imports_per_hour: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            login_per_minute: 5,
            reset_all_per_hour: 1,
            imports_per_hour: 5,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            server: ServerConfig::default(),
            security: SecurityConfig::default(),
            rate_limit: RateLimitConfig::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let paths = Self::config_paths();

        for path in &paths {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                return Self::load_from_path(path);
            }
        }

        info!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let mut config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        // Secrets never live in the config file checked into a share; the
        // environment wins when set.
        if let Ok(secret) = std::env::var("RAFFLER_TOKEN_SECRET") {
            config.security.token_secret = Some(secret);
        }

        Ok(config)
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("config.toml")];

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("raffler").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".raffler").join("config.toml"));
        }

        paths
    }

    pub fn validate(&self) -> Result<()> {
        if self.security.max_login_attempts < 1 {
            anyhow::bail!("max_login_attempts must be at least 1");
        }

        if self.security.token_ttl_minutes < 1 {
            anyhow::bail!("token_ttl_minutes must be at least 1");
        }

        if self.rate_limit.login_per_minute == 0 {
            anyhow::bail!("login_per_minute must be > 0");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.security.max_login_attempts, 3);
        assert_eq!(config.security.lockout_seconds, 900);
        assert_eq!(config.security.token_ttl_minutes, 30);
        assert_eq!(config.rate_limit.login_per_minute, 5);
        assert_eq!(config.rate_limit.reset_all_per_hour, 1);
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[security]"));
        assert!(toml_str.contains("[rate_limit]"));
    }

    #[test]
    fn test_config_deserialization() {
        let toml_str = r#"
            [general]
            log_level = "debug"

            [security]
            max_login_attempts = 5
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.security.max_login_attempts, 5);

        assert_eq!(config.security.lockout_seconds, 900);
    }

    #[test]
    fn test_validate_rejects_zero_attempts() {
        let mut config = Config::default();
        config.security.max_login_attempts = 0;
        assert!(config.validate().is_err());
    }
}
