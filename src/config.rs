// MIT License - Copyright (c) 2026 Peter Wright
// Client configuration

use secrecy::SecretString;

use crate::constants::{
    APPLICATION_ID, APPLICATION_VERSION, DEFAULT_ENDPOINT, DEFAULT_KEEP_ALIVE_INTERVAL_MS,
    DEFAULT_REQUEST_TIMEOUT_MS, DEFAULT_SESSION_TIMEOUT_MS,
};

/// Arm mode for `ArmSecuritySystem`. The discriminant is the wire opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArmType {
    /// Full/away arm
    Away = 0,
    /// Partial/stay arm
    Stay = 1,
    /// Stay arm with no entry delay
    StayInstant = 2,
    /// Away arm with no entry delay
    AwayInstant = 3,
    /// Night stay arm
    StayNight = 4,
}

impl ArmType {
    /// Opcode sent as the `ArmType` parameter.
    pub fn opcode(self) -> u8 {
        self as u8
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Away => "Away",
            Self::Stay => "Stay",
            Self::StayInstant => "Stay-Instant",
            Self::AwayInstant => "Away-Instant",
            Self::StayNight => "Stay-Night",
        }
    }
}

/// Configuration for a Total Connect client.
#[derive(Debug)]
pub struct ClientConfig {
    /// Total Connect account user name
    pub username: String,
    /// Total Connect account password
    pub password: SecretString,
    /// SOAP endpoint URL
    pub endpoint: String,
    /// Application ID sent at login
    pub application_id: String,
    /// Application version sent at login
    pub application_version: String,
    /// HTTP request timeout in milliseconds
    pub request_timeout_ms: u64,
    /// A token idle for longer than this is considered expired
    pub session_timeout_ms: u64,
    /// Idle time after which the run loop sends a keep-alive
    pub keep_alive_interval_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            username: String::new(),
            password: SecretString::from(String::new()),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            application_id: APPLICATION_ID.to_string(),
            application_version: APPLICATION_VERSION.to_string(),
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            session_timeout_ms: DEFAULT_SESSION_TIMEOUT_MS,
            keep_alive_interval_ms: DEFAULT_KEEP_ALIVE_INTERVAL_MS,
        }
    }
}

impl ClientConfig {
    /// Create a new config builder starting from defaults.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }
}

/// Builder for ClientConfig.
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.config.username = username.into();
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.config.password = SecretString::from(password.into());
        self
    }

    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.endpoint = endpoint.into();
        self
    }

    pub fn application_id(mut self, id: impl Into<String>) -> Self {
        self.config.application_id = id.into();
        self
    }

    pub fn application_version(mut self, version: impl Into<String>) -> Self {
        self.config.application_version = version.into();
        self
    }

    pub fn request_timeout_ms(mut self, ms: u64) -> Self {
        self.config.request_timeout_ms = ms;
        self
    }

    pub fn session_timeout_ms(mut self, ms: u64) -> Self {
        self.config.session_timeout_ms = ms;
        self
    }

    pub fn keep_alive_interval_ms(mut self, ms: u64) -> Self {
        self.config.keep_alive_interval_ms = ms;
        self
    }

    pub fn build(self) -> ClientConfig {
        self.config
    }
}
