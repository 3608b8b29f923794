//! Error types for signaling connection supervision and event dispatch

use thiserror::Error;

/// Result type for signaling-core operations
pub type SignalingResult<T> = Result<T, SignalingError>;

/// Errors produced by the connection supervisor and the dispatch path
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignalingError {
    /// Invalid or incomplete connection configuration
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Non-recoverable protocol failure reported by the transport
    #[error("Protocol error: {reason}")]
    Protocol { reason: String },

    /// The reconnect budget was consumed without re-establishing the session
    #[error("Connection retry attempts exceeded after {attempts} attempts")]
    RetryExhausted { attempts: u32 },

    /// A single call admission failed; isolated to that offer
    #[error("Call admission failed: {message}")]
    Admission { message: String },

    /// Internal invariant violation
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl SignalingError {
    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a protocol error
    pub fn protocol(reason: impl Into<String>) -> Self {
        Self::Protocol {
            reason: reason.into(),
        }
    }

    /// Create an admission error
    pub fn admission(message: impl Into<String>) -> Self {
        Self::Admission {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Whether this error is allowed to escalate to process shutdown.
    ///
    /// Only protocol errors and an exhausted retry budget may take the
    /// process down; everything else is handled where it occurs.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Protocol { .. } | Self::RetryExhausted { .. })
    }

    /// Error category for logging and diagnostics
    pub fn category(&self) -> &'static str {
        match self {
            Self::Configuration { .. } => "configuration",
            Self::Protocol { .. } => "protocol",
            Self::RetryExhausted { .. } => "retry",
            Self::Admission { .. } => "admission",
            Self::Internal { .. } => "internal",
        }
    }
}
