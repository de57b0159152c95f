//! Per-connection configuration.

use std::time::Duration;

use thiserror::Error;

use crate::domain::{Credentials, Endpoint, ServerAddress, TransportSecurity};

/// Default bound on resolution + TLS + authentication.
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(15);

/// Default bound on the graceful quit sequence.
pub const DEFAULT_LEAVE_TIMEOUT: Duration = Duration::from_secs(5);

/// Default interval between keep-alive pings.
pub const DEFAULT_KEEPALIVE_INTERVAL: Duration = Duration::from_secs(30);

/// Default silence after which a session is considered dead.
pub const DEFAULT_KEEPALIVE_TIMEOUT: Duration = Duration::from_secs(90);

/// Configuration rejected before any I/O.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("port must be non-zero")]
    ZeroPort,

    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),

    #[error(
        "keep-alive timeout ({timeout:?}) must be longer than the keep-alive interval ({interval:?})"
    )]
    KeepaliveTimeoutTooShort { interval: Duration, timeout: Duration },

    #[error("password cannot be empty when set")]
    EmptyPassword,
}

/// Identity and tuning of one connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub server: ServerAddress,
    pub port: u16,
    pub credentials: Credentials,
    pub security: TransportSecurity,
    pub handshake_timeout: Duration,
    pub leave_timeout: Duration,
    pub keepalive_interval: Duration,
    pub keepalive_timeout: Duration,
}

impl ConnectionConfig {
    /// Plain-text connection on the default port with default timeouts.
    pub fn new(server: ServerAddress, credentials: Credentials) -> Self {
        let security = TransportSecurity::default();
        Self {
            server,
            port: security.default_port(),
            credentials,
            security,
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
            leave_timeout: DEFAULT_LEAVE_TIMEOUT,
            keepalive_interval: DEFAULT_KEEPALIVE_INTERVAL,
            keepalive_timeout: DEFAULT_KEEPALIVE_TIMEOUT,
        }
    }

    /// Switch security mode. Also resets the port to the mode's default, so
    /// call `with_port` afterwards to override it.
    pub fn with_security(mut self, security: TransportSecurity) -> Self {
        self.security = security;
        self.port = security.default_port();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }

    pub fn with_leave_timeout(mut self, timeout: Duration) -> Self {
        self.leave_timeout = timeout;
        self
    }

    pub fn with_keepalive(mut self, interval: Duration, timeout: Duration) -> Self {
        self.keepalive_interval = interval;
        self.keepalive_timeout = timeout;
        self
    }

    /// Check the configuration without touching the network.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::ZeroPort);
        }
        let durations = [
            ("handshake timeout", self.handshake_timeout),
            ("leave timeout", self.leave_timeout),
            ("keep-alive interval", self.keepalive_interval),
            ("keep-alive timeout", self.keepalive_timeout),
        ];
        if let Some((name, _)) = durations.into_iter().find(|(_, d)| d.is_zero()) {
            return Err(ConfigError::ZeroDuration(name));
        }
        if self.keepalive_timeout <= self.keepalive_interval {
            return Err(ConfigError::KeepaliveTimeoutTooShort {
                interval: self.keepalive_interval,
                timeout: self.keepalive_timeout,
            });
        }
        if self.credentials.password.as_deref() == Some("") {
            return Err(ConfigError::EmptyPassword);
        }
        Ok(())
    }

    /// Where the transport should connect.
    pub fn endpoint(&self) -> Endpoint {
        Endpoint::new(self.server.clone(), self.port, self.security)
    }

    /// `host:port`, with IPv6 literals bracketed.
    pub fn authority(&self) -> String {
        self.endpoint().authority()
    }

    /// WebSocket URL of the chat endpoint.
    pub fn endpoint_url(&self) -> String {
        self.endpoint().url()
    }
}
