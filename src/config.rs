//! Configuration for mcbin
//!
//! Centralized client configuration with sensible defaults.

use std::time::Duration;

use crate::error::{McError, Result};

/// Default memcached port
pub const DEFAULT_PORT: u16 = 11211;

/// Client configuration
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Target Server
    // -------------------------------------------------------------------------
    /// Server host name or IP address
    pub host: String,

    /// Server TCP port
    pub port: u16,

    // -------------------------------------------------------------------------
    // Timeouts
    // -------------------------------------------------------------------------
    /// Max wait for one response read (milliseconds), `None` blocks forever
    pub timeout_ms: Option<u64>,

    /// Max wait for the TCP handshake (milliseconds), `None` uses the OS default
    pub connect_timeout_ms: Option<u64>,

    // -------------------------------------------------------------------------
    // Socket Options
    // -------------------------------------------------------------------------
    /// Disable Nagle's algorithm on the stream
    pub nodelay: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            timeout_ms: Some(1000),
            connect_timeout_ms: Some(1000),
            nodelay: true,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// `host:port` string used for connecting and in error messages
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Per-call response timeout
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// Connect timeout
    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout_ms.map(Duration::from_millis)
    }

    /// Check that the config describes a reachable target
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(McError::Config("host must not be empty".to_string()));
        }
        if self.port == 0 {
            return Err(McError::Config("port must be nonzero".to_string()));
        }
        // A zero duration is rejected by the socket timeout setters
        if self.timeout_ms == Some(0) || self.connect_timeout_ms == Some(0) {
            return Err(McError::Config(
                "timeouts must be nonzero, use None to disable".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the server host
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    /// Set the server port
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Set the per-call response timeout (in milliseconds)
    pub fn timeout_ms(mut self, ms: u64) -> Self {
        self.config.timeout_ms = Some(ms);
        self
    }

    /// Wait for responses without a deadline
    pub fn no_timeout(mut self) -> Self {
        self.config.timeout_ms = None;
        self
    }

    /// Set the connect timeout (in milliseconds)
    pub fn connect_timeout_ms(mut self, ms: u64) -> Self {
        self.config.connect_timeout_ms = Some(ms);
        self
    }

    /// Enable or disable TCP_NODELAY
    pub fn nodelay(mut self, nodelay: bool) -> Self {
        self.config.nodelay = nodelay;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
