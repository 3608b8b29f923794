//! Connection configuration
//!
//! Settings for the persistent signaling connection: account identity,
//! server location, and the reconnect policy the supervisor enforces.
//! Loaded once before `ConnectionSupervisor::initialize` and immutable
//! afterwards.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{SignalingError, SignalingResult};

/// Configuration for the signaling connection and its retry policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Account identity presented to the signaling server
    pub identity: String,
    /// Credential paired with the identity
    pub credential: String,
    /// Server host; the transport's default is used when absent
    pub host: Option<String>,
    /// Server port; the transport's default is used when absent
    pub port: Option<u16>,
    /// Time allowed for a single connect attempt
    pub connect_timeout: Duration,
    /// Directory holding TLS certificates for encrypted transports
    pub certs_directory: Option<PathBuf>,
    /// Connect attempts permitted before the supervisor gives up
    pub reconnect_attempts: u32,
    /// Pause between consecutive connect attempts
    pub reconnect_interval: Duration,
}

impl ConnectionConfig {
    /// Create a configuration with default timeouts and retry policy
    pub fn new() -> Self {
        Self {
            identity: String::new(),
            credential: String::new(),
            host: None,
            port: None,
            connect_timeout: Duration::from_secs(60),
            certs_directory: None,
            reconnect_attempts: 5,
            reconnect_interval: Duration::from_secs(5),
        }
    }

    /// Set the account identity
    pub fn with_identity(mut self, identity: impl Into<String>) -> Self {
        self.identity = identity.into();
        self
    }

    /// Set the credential
    pub fn with_credential(mut self, credential: impl Into<String>) -> Self {
        self.credential = credential.into();
        self
    }

    /// Set the server host
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Set the server port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Set the connect timeout
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the TLS certificate directory
    pub fn with_certs_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.certs_directory = Some(dir.into());
        self
    }

    /// Set the number of permitted reconnect attempts
    pub fn with_reconnect_attempts(mut self, attempts: u32) -> Self {
        self.reconnect_attempts = attempts;
        self
    }

    /// Set the pause between reconnect attempts
    pub fn with_reconnect_interval(mut self, interval: Duration) -> Self {
        self.reconnect_interval = interval;
        self
    }

    /// Check that the configuration is usable for a connection attempt
    pub fn validate(&self) -> SignalingResult<()> {
        if self.identity.is_empty() {
            return Err(SignalingError::configuration("identity must not be empty"));
        }
        if self.credential.is_empty() {
            return Err(SignalingError::configuration(
                "credential must not be empty",
            ));
        }
        if self.connect_timeout.is_zero() {
            return Err(SignalingError::configuration(
                "connect_timeout must be non-zero",
            ));
        }
        Ok(())
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_usable_once_credentials_are_set() {
        let config = ConnectionConfig::new()
            .with_identity("usera@cluster.local")
            .with_credential("1");

        assert_eq!(config.reconnect_attempts, 5);
        assert_eq!(config.reconnect_interval, Duration::from_secs(5));
        assert_eq!(config.connect_timeout, Duration::from_secs(60));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn builder_chain_sets_all_fields() {
        let config = ConnectionConfig::new()
            .with_identity("usera@cluster.local")
            .with_credential("1")
            .with_host("signaling.cluster.local")
            .with_port(5222)
            .with_connect_timeout(Duration::from_secs(10))
            .with_certs_directory("/etc/signaling/certs")
            .with_reconnect_attempts(3)
            .with_reconnect_interval(Duration::from_millis(250));

        assert_eq!(config.host.as_deref(), Some("signaling.cluster.local"));
        assert_eq!(config.port, Some(5222));
        assert_eq!(
            config.certs_directory.as_deref(),
            Some(std::path::Path::new("/etc/signaling/certs"))
        );
        assert_eq!(config.reconnect_attempts, 3);
        assert_eq!(config.reconnect_interval, Duration::from_millis(250));
    }

    #[test]
    fn validation_rejects_missing_credentials() {
        let missing_identity = ConnectionConfig::new().with_credential("1");
        assert!(missing_identity.validate().is_err());

        let missing_credential = ConnectionConfig::new().with_identity("usera");
        let err = missing_credential.validate().unwrap_err();
        assert_eq!(err.category(), "configuration");
    }
}
