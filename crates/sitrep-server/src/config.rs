//! Server configuration loading from file and environment variables.

use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};
use thiserror::Error;

/// Top-level server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Server network settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Database settings.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Authentication settings.
    #[serde(default)]
    pub auth: AuthConfig,
}

/// Network configuration for the HTTP server.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,

    /// Busy timeout for SQLite connections, in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,

    /// Maximum number of pooled connections.
    #[serde(default = "default_pool_max_size")]
    pub pool_max_size: u32,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "sitrep_server=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

/// Authentication configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Email for the bootstrap operator account, created at startup when no
    /// account exists yet. Leave unset to skip bootstrapping.
    #[serde(default)]
    pub bootstrap_email: Option<String>,

    /// Password for the bootstrap operator account.
    #[serde(default)]
    pub bootstrap_password: Option<String>,

    /// Lifetime of issued session tokens, in minutes.
    #[serde(default = "default_session_ttl_minutes")]
    pub session_ttl_minutes: u32,
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))
}

fn default_port() -> u16 {
    3000
}

fn default_db_path() -> String {
    "sitrep.db".to_string()
}

fn default_busy_timeout_ms() -> u64 {
    5_000
}

fn default_pool_max_size() -> u32 {
    8
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_session_ttl_minutes() -> u32 {
    12 * 60
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            busy_timeout_ms: default_busy_timeout_ms(),
            pool_max_size: default_pool_max_size(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            bootstrap_email: None,
            bootstrap_password: None,
            session_ttl_minutes: default_session_ttl_minutes(),
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Loads configuration from a TOML file, falling back to defaults.
///
/// Environment variable overrides:
/// - `SITREP_HOST` overrides `server.host`
/// - `SITREP_PORT` overrides `server.port`
/// - `SITREP_DB_PATH` overrides `database.path`
/// - `SITREP_LOG_LEVEL` overrides `logging.level`
/// - `SITREP_LOG_JSON` overrides `logging.json` (set to "true" to enable)
/// - `SITREP_BOOTSTRAP_EMAIL` overrides `auth.bootstrap_email`
/// - `SITREP_BOOTSTRAP_PASSWORD` overrides `auth.bootstrap_password`
/// - `SITREP_SESSION_TTL_MINUTES` overrides `auth.session_ttl_minutes`
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let mut config = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = p, "config file not found, using defaults");
                Config::default()
            }
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => Config::default(),
    };

    // Environment variable overrides
    if let Ok(host) = std::env::var("SITREP_HOST") {
        if let Ok(parsed) = host.parse() {
            config.server.host = parsed;
        }
    }
    if let Ok(port) = std::env::var("SITREP_PORT") {
        if let Ok(parsed) = port.parse() {
            config.server.port = parsed;
        }
    }
    if let Ok(db_path) = std::env::var("SITREP_DB_PATH") {
        config.database.path = db_path;
    }
    if let Ok(level) = std::env::var("SITREP_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Ok(json) = std::env::var("SITREP_LOG_JSON") {
        config.logging.json = json == "true" || json == "1";
    }
    if let Ok(email) = std::env::var("SITREP_BOOTSTRAP_EMAIL") {
        config.auth.bootstrap_email = Some(email);
    }
    if let Ok(password) = std::env::var("SITREP_BOOTSTRAP_PASSWORD") {
        config.auth.bootstrap_password = Some(password);
    }
    if let Ok(ttl) = std::env::var("SITREP_SESSION_TTL_MINUTES") {
        if let Ok(parsed) = ttl.parse() {
            config.auth.session_ttl_minutes = parsed;
        }
    }

    Ok(config)
}
