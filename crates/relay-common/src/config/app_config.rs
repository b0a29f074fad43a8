//! Application configuration
//!
//! All settings are read from environment variables. Binaries call
//! [`AppConfig::from_env`] once at startup; everything downstream receives
//! the parsed config by reference.

use serde::Deserialize;
use std::env;
use std::fmt;
use std::str::FromStr;

/// Errors raised while reading configuration from the environment.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required variable was not set.
    #[error("missing required environment variable: {0}")]
    MissingVar(&'static str),

    /// A variable was set but could not be parsed.
    #[error("invalid value for {var}: {value}")]
    InvalidValue { var: &'static str, value: String },
}

/// Deployment environment the process runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Staging,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }

    #[must_use]
    pub fn is_development(self) -> bool {
        matches!(self, Self::Development)
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "staging" => Ok(Self::Staging),
            "production" | "prod" => Ok(Self::Production),
            other => Err(format!("unknown environment: {other}")),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Development => "development",
            Self::Staging => "staging",
            Self::Production => "production",
        };
        f.write_str(name)
    }
}

/// Top-level process identity.
#[derive(Debug, Clone)]
pub struct AppSettings {
    pub name: String,
    pub env: Environment,
}

/// Bind address for the HTTP API server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Bind address and handshake tuning for the websocket gateway.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
    /// Seconds a new connection may spend authenticating before the
    /// handshake is abandoned.
    pub auth_timeout_secs: u64,
}

impl GatewayConfig {
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Postgres connection settings.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

/// Token signing settings.
#[derive(Clone)]
pub struct JwtConfig {
    pub secret: String,
    /// Token lifetime in seconds.
    pub token_expiry: i64,
}

impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("token_expiry", &self.token_expiry)
            .finish()
    }
}

/// Sliding-window limit on authentication attempts per client address.
#[derive(Debug, Clone)]
pub struct ThrottleConfig {
    pub max_attempts: u32,
    pub window_secs: u64,
}

/// History pagination bounds.
#[derive(Debug, Clone)]
pub struct HistoryConfig {
    /// Default (and maximum requestable) page size for history queries.
    pub page_limit: i64,
}

/// HTTP request rate limiting for the API server.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub requests_per_second: u64,
    pub burst: u32,
}

/// Cross-origin settings for browser clients.
#[derive(Debug, Clone)]
pub struct CorsConfig {
    /// Exact origins allowed to call the API. Empty means allow any.
    pub allowed_origins: Vec<String>,
}

/// Snowflake id generation settings.
#[derive(Debug, Clone)]
pub struct SnowflakeConfig {
    pub worker_id: u16,
}

/// Complete application configuration shared by both binaries.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub app: AppSettings,
    pub api: ServerConfig,
    pub gateway: GatewayConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub throttle: ThrottleConfig,
    pub history: HistoryConfig,
    pub rate_limit: RateLimitConfig,
    pub cors: CorsConfig,
    pub snowflake: SnowflakeConfig,
}

impl AppConfig {
    /// Reads the full configuration from the environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingVar`] when `API_PORT`, `GATEWAY_PORT`,
    /// `DATABASE_URL`, or `JWT_SECRET` is unset, and
    /// [`ConfigError::InvalidValue`] when a variable fails to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Ok(Self {
            app: AppSettings {
                name: var_or("APP_NAME", "message-relay"),
                env: parse_or("APP_ENV", Environment::Development)?,
            },
            api: ServerConfig {
                host: var_or("API_HOST", "0.0.0.0"),
                port: required_parse("API_PORT")?,
            },
            gateway: GatewayConfig {
                host: var_or("GATEWAY_HOST", "0.0.0.0"),
                port: required_parse("GATEWAY_PORT")?,
                auth_timeout_secs: parse_or("GATEWAY_AUTH_TIMEOUT_SECS", 10)?,
            },
            database: DatabaseConfig {
                url: required("DATABASE_URL")?,
                max_connections: parse_or("DATABASE_MAX_CONNECTIONS", 20)?,
                min_connections: parse_or("DATABASE_MIN_CONNECTIONS", 5)?,
            },
            jwt: JwtConfig {
                secret: required("JWT_SECRET")?,
                token_expiry: parse_or("JWT_TOKEN_EXPIRY_SECS", 86_400)?,
            },
            throttle: ThrottleConfig {
                max_attempts: parse_or("AUTH_THROTTLE_MAX_ATTEMPTS", 5)?,
                window_secs: parse_or("AUTH_THROTTLE_WINDOW_SECS", 900)?,
            },
            history: HistoryConfig {
                page_limit: parse_or("HISTORY_PAGE_LIMIT", 50)?,
            },
            rate_limit: RateLimitConfig {
                requests_per_second: parse_or("RATE_LIMIT_PER_SECOND", 10)?,
                burst: parse_or("RATE_LIMIT_BURST", 50)?,
            },
            cors: CorsConfig {
                allowed_origins: list_or("CORS_ALLOWED_ORIGINS", &[]),
            },
            snowflake: SnowflakeConfig {
                worker_id: parse_or("SNOWFLAKE_WORKER_ID", 0)?,
            },
        })
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name).map_err(|_| ConfigError::MissingVar(name))
}

fn required_parse<T: FromStr>(name: &'static str) -> Result<T, ConfigError> {
    let raw = required(name)?;
    raw.parse()
        .map_err(|_| ConfigError::InvalidValue { var: name, value: raw })
}

fn var_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_owned())
}

fn parse_or<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| ConfigError::InvalidValue { var: name, value: raw }),
        Err(_) => Ok(default),
    }
}

fn list_or(name: &str, default: &[&str]) -> Vec<String> {
    match env::var(name) {
        Ok(raw) => raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
            .collect(),
        Err(_) => default.iter().map(|s| (*s).to_owned()).collect(),
    }
}
