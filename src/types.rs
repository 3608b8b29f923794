//! Core types for inbound signaling events
//!
//! The transport produces a stream of `InboundEvent`s. The union is closed:
//! adding a new event kind means adding a variant here and handling it in
//! `router::classify`, which the compiler enforces.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a call
///
/// Offered calls carry the id assigned by the signaling server; locally
/// originated ids are generated with `CallId::new`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallId(pub String);

impl CallId {
    /// Generate a fresh local call id
    pub fn new() -> Self {
        Self(format!("call-{}", Uuid::new_v4()))
    }

    /// The id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for CallId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CallId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for CallId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for CallId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Which protocol surface produced an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventOrigin {
    /// The core signaling protocol
    Signaling,
    /// The server's management-interface sub-protocol
    Management,
}

/// Loosely typed body of a protocol event
///
/// Events arrive pre-parsed but schemaless; the kind tag and raw attributes
/// are passed through to whichever call actor or subscriber consumes them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventPayload {
    /// Protocol-level name of the event
    pub kind: String,
    /// Which protocol surface produced the event
    pub origin: EventOrigin,
    /// Raw attributes as delivered by the transport
    pub attributes: serde_json::Value,
    /// When the transport handed the event to this process
    pub received_at: DateTime<Utc>,
}

impl EventPayload {
    /// Create a payload for a core signaling event
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            origin: EventOrigin::Signaling,
            attributes: serde_json::Value::Null,
            received_at: Utc::now(),
        }
    }

    /// Create a payload for a management-interface event
    pub fn management(kind: impl Into<String>) -> Self {
        Self {
            origin: EventOrigin::Management,
            ..Self::new(kind)
        }
    }

    /// Attach attributes to the payload
    pub fn with_attributes(mut self, attributes: serde_json::Value) -> Self {
        self.attributes = attributes;
        self
    }

    /// Whether this payload came from the management interface
    pub fn is_management(&self) -> bool {
        self.origin == EventOrigin::Management
    }
}

/// A protocol event produced by the transport
///
/// Consumed exactly once: each event takes exactly one of the admission,
/// targeted-call, or republish paths through the router.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InboundEvent {
    /// The session with the signaling server is established
    Connected,
    /// The session dropped; recoverable by reconnecting
    Disconnected {
        /// Server-supplied reason, when one was given
        reason: Option<String>,
    },
    /// Non-recoverable protocol failure, e.g. rejected credentials
    ProtocolError {
        /// Server-supplied failure description
        reason: String,
    },
    /// A new inbound call awaiting admission
    Offer {
        /// Call id assigned by the server
        call_id: CallId,
        /// Offer details
        payload: EventPayload,
    },
    /// An event addressed to an existing call
    CallTargeted {
        /// Target call id
        call_id: CallId,
        /// Event body to deliver to the call actor
        payload: EventPayload,
    },
    /// Any other protocol event, republished for bus subscribers
    Generic {
        /// Event body
        payload: EventPayload,
    },
}
