//! Application configuration structs
//!
//! Loads configuration from environment variables.

use serde::Deserialize;
use std::env;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub app: AppSettings,
    pub gateway: ServerConfig,
    pub presence: PresenceConfig,
}

/// General application settings
#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_app_name")]
    pub name: String,
    #[serde(default = "default_env")]
    pub env: Environment,
}

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }
}

/// Gateway server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl ServerConfig {
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Presence coordination configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PresenceConfig {
    /// Fallback window before a provisional identity is bound, in milliseconds
    #[serde(default = "default_handshake_timeout_ms")]
    pub handshake_timeout_ms: u64,

    /// Quiet period before typing state decays, in milliseconds
    #[serde(default = "default_typing_decay_ms")]
    pub typing_decay_ms: u64,

    /// Room every identity joins when binding completes
    #[serde(default = "default_room")]
    pub default_room: String,

    /// Number of recent messages delivered when joining a room
    #[serde(default = "default_backlog_limit")]
    pub backlog_limit: usize,

    /// Per-connection outbound channel capacity
    #[serde(default = "default_outbound_buffer")]
    pub outbound_buffer: usize,
}

impl PresenceConfig {
    #[must_use]
    pub fn handshake_timeout(&self) -> Duration {
        Duration::from_millis(self.handshake_timeout_ms)
    }

    #[must_use]
    pub fn typing_decay(&self) -> Duration {
        Duration::from_millis(self.typing_decay_ms)
    }
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            handshake_timeout_ms: default_handshake_timeout_ms(),
            typing_decay_ms: default_typing_decay_ms(),
            default_room: default_room(),
            backlog_limit: default_backlog_limit(),
            outbound_buffer: default_outbound_buffer(),
        }
    }
}

// Default value functions
fn default_app_name() -> String {
    "chatd".to_string()
}

fn default_env() -> Environment {
    Environment::Development
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    9090
}

fn default_handshake_timeout_ms() -> u64 {
    10_000
}

fn default_typing_decay_ms() -> u64 {
    3_000
}

fn default_room() -> String {
    "lobby".to_string()
}

fn default_backlog_limit() -> usize {
    50
}

fn default_outbound_buffer() -> usize {
    100
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// Every variable has a default; a variable that is set but unparseable
    /// is an error rather than silently falling back.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Ok(Self {
            app: AppSettings {
                name: env::var("APP_NAME").unwrap_or_else(|_| default_app_name()),
                env: parse_environment()?,
            },
            gateway: ServerConfig {
                host: env::var("GATEWAY_HOST").unwrap_or_else(|_| default_host()),
                port: parse_var("GATEWAY_PORT", default_port())?,
            },
            presence: PresenceConfig {
                handshake_timeout_ms: parse_var(
                    "HANDSHAKE_TIMEOUT_MS",
                    default_handshake_timeout_ms(),
                )?,
                typing_decay_ms: parse_var("TYPING_DECAY_MS", default_typing_decay_ms())?,
                default_room: env::var("DEFAULT_ROOM").unwrap_or_else(|_| default_room()),
                backlog_limit: parse_var("BACKLOG_LIMIT", default_backlog_limit())?,
                outbound_buffer: parse_var("OUTBOUND_BUFFER", default_outbound_buffer())?,
            },
        })
    }
}

/// Parse `APP_ENV`, erroring on values that name no environment
fn parse_environment() -> Result<Environment, ConfigError> {
    match env::var("APP_ENV") {
        Ok(raw) => match raw.to_lowercase().as_str() {
            "production" => Ok(Environment::Production),
            "staging" => Ok(Environment::Staging),
            "development" => Ok(Environment::Development),
            _ => Err(ConfigError::InvalidValue("APP_ENV", raw)),
        },
        Err(_) => Ok(Environment::default()),
    }
}

/// Parse an optional environment variable, erroring on bad values
fn parse_var<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| ConfigError::InvalidValue(name, raw)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}
