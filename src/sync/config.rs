//! Synchronization settings.

use std::net::SocketAddr;
use std::time::Duration;

use crate::core::{
    ConfigError, DEFAULT_SERVER, NTP_PORT, POLL_INTERVAL, RESEND_TIMEOUT, RESOLVE_TIMEOUT,
};

/// Environment variable names read by [`SyncConfig::from_env`].
pub mod env {
    /// Server hostname.
    pub const SERVER: &str = "SNTP_SERVER";
    /// Server port.
    pub const PORT: &str = "SNTP_PORT";
    /// Poll interval in milliseconds.
    pub const POLL_MS: &str = "SNTP_POLL_MS";
    /// Resend timeout in milliseconds.
    pub const RESEND_MS: &str = "SNTP_RESEND_MS";
    /// Resolve timeout in milliseconds.
    pub const RESOLVE_MS: &str = "SNTP_RESOLVE_MS";
    /// Local bind address.
    pub const BIND_ADDR: &str = "SNTP_BIND_ADDR";
}

/// Client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// Time server hostname (or IP literal).
    pub server_host: String,

    /// Time server port; responses from any other port are rejected.
    pub server_port: u16,

    /// Delay between the end of one attempt and the start of the next.
    pub poll_interval: Duration,

    /// How long to wait for a response once the request is sent.
    pub resend_timeout: Duration,

    /// Upper bound on a hostname lookup (runtime resolver only).
    pub resolve_timeout: Duration,

    /// Local socket address (runtime transport only).
    pub bind_addr: SocketAddr,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            server_host: DEFAULT_SERVER.to_string(),
            server_port: NTP_PORT,
            poll_interval: POLL_INTERVAL,
            resend_timeout: RESEND_TIMEOUT,
            resolve_timeout: RESOLVE_TIMEOUT,
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 0)),
        }
    }
}

impl SyncConfig {
    /// Load from `SNTP_*` environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from any key/value source, falling back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(host) = lookup(env::SERVER) {
            config.server_host = host.trim().to_string();
        }
        if let Some(port) = lookup(env::PORT) {
            config.server_port = parse_value(env::PORT, &port)?;
        }
        if let Some(ms) = lookup(env::POLL_MS) {
            config.poll_interval = Duration::from_millis(parse_value(env::POLL_MS, &ms)?);
        }
        if let Some(ms) = lookup(env::RESEND_MS) {
            config.resend_timeout = Duration::from_millis(parse_value(env::RESEND_MS, &ms)?);
        }
        if let Some(ms) = lookup(env::RESOLVE_MS) {
            config.resolve_timeout = Duration::from_millis(parse_value(env::RESOLVE_MS, &ms)?);
        }
        if let Some(addr) = lookup(env::BIND_ADDR) {
            config.bind_addr = parse_value(env::BIND_ADDR, &addr)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject settings the state machine cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server_host.is_empty() {
            return Err(ConfigError::EmptyHost);
        }
        if self.server_port == 0 {
            return Err(ConfigError::InvalidValue {
                key: env::PORT,
                value: "0".to_string(),
            });
        }
        for (key, value) in [
            (env::POLL_MS, self.poll_interval),
            (env::RESEND_MS, self.resend_timeout),
            (env::RESOLVE_MS, self.resolve_timeout),
        ] {
            if value.is_zero() {
                return Err(ConfigError::InvalidValue {
                    key,
                    value: "0".to_string(),
                });
            }
        }
        Ok(())
    }
}

fn parse_value<T: std::str::FromStr>(key: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: raw.to_string(),
    })
}

/// Builder for [`SyncConfig`].
#[derive(Debug)]
pub struct SyncConfigBuilder {
    config: SyncConfig,
}

impl SyncConfigBuilder {
    /// Create a builder with default settings.
    pub fn new() -> Self {
        Self {
            config: SyncConfig::default(),
        }
    }

    /// Set the server hostname.
    pub fn server_host(mut self, host: impl Into<String>) -> Self {
        self.config.server_host = host.into();
        self
    }

    /// Set the server port.
    pub fn server_port(mut self, port: u16) -> Self {
        self.config.server_port = port;
        self
    }

    /// Set the poll interval.
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.config.poll_interval = interval;
        self
    }

    /// Set the resend timeout.
    pub fn resend_timeout(mut self, timeout: Duration) -> Self {
        self.config.resend_timeout = timeout;
        self
    }

    /// Set the resolve timeout.
    pub fn resolve_timeout(mut self, timeout: Duration) -> Self {
        self.config.resolve_timeout = timeout;
        self
    }

    /// Set the local bind address.
    pub fn bind_addr(mut self, addr: SocketAddr) -> Self {
        self.config.bind_addr = addr;
        self
    }

    /// Validate and build the configuration.
    pub fn build(self) -> Result<SyncConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for SyncConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
