//! Session controller configuration.
//!
//! Configuration is loaded from environment variables. The engine API key
//! is redacted in Debug output.

use crate::engine::{CameraPosition, EngineLogLevel, MediaConstraints, PeerOptions};
use secrecy::SecretString;
use std::collections::HashMap;
use std::env;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Default engine application domain.
pub const DEFAULT_DOMAIN: &str = "localhost";

/// Default capture width in pixels.
pub const DEFAULT_CAPTURE_MAX_WIDTH: u32 = 960;

/// Default capture height in pixels.
pub const DEFAULT_CAPTURE_MAX_HEIGHT: u32 = 540;

/// Default per-session event channel capacity.
pub const DEFAULT_EVENT_BUFFER: usize = 256;

/// Default host mailbox capacity.
pub const DEFAULT_COMMAND_BUFFER: usize = 100;

/// Default wait for the engine to open a peer, in seconds.
pub const DEFAULT_CONNECT_TIMEOUT_SECONDS: u64 = 30;

/// Session controller configuration.
#[derive(Clone)]
pub struct Config {
    /// Engine API key.
    /// Protected by `SecretString` to prevent accidental logging.
    pub api_key: SecretString,

    /// Engine application domain (default: "localhost").
    pub domain: String,

    /// Local capture width limit (default: 960).
    pub capture_max_width: u32,

    /// Local capture height limit (default: 540).
    pub capture_max_height: u32,

    /// Camera used for local capture (default: front).
    pub camera_position: CameraPosition,

    /// Engine-side log verbosity (default: all).
    pub engine_log_level: EngineLogLevel,

    /// Capacity of each session's event channel (default: 256).
    pub event_buffer: usize,

    /// Capacity of the host command mailbox (default: 100).
    pub command_buffer: usize,

    /// How long `connect` waits for the peer to open (default: 30).
    pub connect_timeout_seconds: u64,
}

/// Custom Debug implementation that redacts sensitive fields.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &"[REDACTED]")
            .field("domain", &self.domain)
            .field("capture_max_width", &self.capture_max_width)
            .field("capture_max_height", &self.capture_max_height)
            .field("camera_position", &self.camera_position)
            .field("engine_log_level", &self.engine_log_level)
            .field("event_buffer", &self.event_buffer)
            .field("command_buffer", &self.command_buffer)
            .field("connect_timeout_seconds", &self.connect_timeout_seconds)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a `HashMap` (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let api_key = vars
            .get("SESSION_API_KEY")
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar("SESSION_API_KEY".to_string()))?;
        let api_key = SecretString::from(api_key.clone());

        let domain = vars
            .get("SESSION_DOMAIN")
            .cloned()
            .unwrap_or_else(|| DEFAULT_DOMAIN.to_string());

        let capture_max_width = vars
            .get("SESSION_CAPTURE_MAX_WIDTH")
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_CAPTURE_MAX_WIDTH);

        let capture_max_height = vars
            .get("SESSION_CAPTURE_MAX_HEIGHT")
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_CAPTURE_MAX_HEIGHT);

        let camera_position = match vars.get("SESSION_CAMERA_POSITION").map(String::as_str) {
            None | Some("front") => CameraPosition::Front,
            Some("back") => CameraPosition::Back,
            Some(other) => {
                return Err(ConfigError::InvalidValue(format!(
                    "SESSION_CAMERA_POSITION must be front or back, got {other}"
                )))
            }
        };

        let engine_log_level = match vars.get("SESSION_ENGINE_LOG_LEVEL").map(String::as_str) {
            None | Some("all") => EngineLogLevel::All,
            Some("warn") => EngineLogLevel::Warn,
            Some("error") => EngineLogLevel::Error,
            Some("none") => EngineLogLevel::None,
            Some(other) => {
                return Err(ConfigError::InvalidValue(format!(
                    "SESSION_ENGINE_LOG_LEVEL must be none, error, warn or all, got {other}"
                )))
            }
        };

        let event_buffer = vars
            .get("SESSION_EVENT_BUFFER")
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_EVENT_BUFFER);

        let command_buffer = vars
            .get("SESSION_COMMAND_BUFFER")
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_COMMAND_BUFFER);

        let connect_timeout_seconds = vars
            .get("SESSION_CONNECT_TIMEOUT_SECONDS")
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_CONNECT_TIMEOUT_SECONDS);

        Ok(Config {
            api_key,
            domain,
            capture_max_width,
            capture_max_height,
            camera_position,
            engine_log_level,
            event_buffer,
            command_buffer,
            connect_timeout_seconds,
        })
    }

    /// Options for creating a peer with this configuration.
    #[must_use]
    pub fn peer_options(&self) -> PeerOptions {
        PeerOptions {
            api_key: self.api_key.clone(),
            domain: self.domain.clone(),
            log_level: self.engine_log_level,
        }
    }

    /// Local capture profile.
    #[must_use]
    pub fn media_constraints(&self) -> MediaConstraints {
        MediaConstraints {
            max_width: self.capture_max_width,
            max_height: self.capture_max_height,
            camera_position: self.camera_position,
        }
    }

    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_seconds)
    }
}

impl Default for Config {
    /// Defaults with an empty API key; `connect` refuses it.
    fn default() -> Self {
        Self {
            api_key: SecretString::from(String::new()),
            domain: DEFAULT_DOMAIN.to_string(),
            capture_max_width: DEFAULT_CAPTURE_MAX_WIDTH,
            capture_max_height: DEFAULT_CAPTURE_MAX_HEIGHT,
            camera_position: CameraPosition::Front,
            engine_log_level: EngineLogLevel::All,
            event_buffer: DEFAULT_EVENT_BUFFER,
            command_buffer: DEFAULT_COMMAND_BUFFER,
            connect_timeout_seconds: DEFAULT_CONNECT_TIMEOUT_SECONDS,
        }
    }
}
