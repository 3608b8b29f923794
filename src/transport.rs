//! Transport collaborator interface
//!
//! The wire protocol lives outside this crate. The supervisor drives any
//! `SignalingTransport` implementation through one long `connect_and_serve`
//! call per session and reads the structured outcome to decide between
//! retry, clean exit, and escalation.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::types::InboundEvent;

/// Why a `connect_and_serve` call ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServeOutcome {
    /// The session dropped or the connect attempt failed; recoverable by
    /// retrying
    Disconnected {
        /// Server- or transport-supplied reason, when one was given
        reason: Option<String>,
    },
    /// Non-recoverable protocol failure, e.g. rejected credentials
    ProtocolError {
        /// Failure description
        reason: String,
    },
    /// `stop()` was requested; clean shutdown
    Stopped,
}

/// Opaque signaling client driven by the supervisor
#[async_trait]
pub trait SignalingTransport: Send + Sync {
    /// Connect to the server and serve the session until it ends.
    ///
    /// Inbound events are emitted into the sink installed with
    /// [`register_event_sink`](Self::register_event_sink) while this call
    /// is in progress.
    async fn connect_and_serve(&self) -> ServeOutcome;

    /// Ask a serving transport to wind down; `connect_and_serve` then
    /// returns [`ServeOutcome::Stopped`].
    fn stop(&self);

    /// Whether a session is currently established
    fn is_connected(&self) -> bool;

    /// Advertise readiness to accept calls; `false` while quiescing
    fn set_ready(&self, ready: bool);

    /// Install the channel inbound events are emitted into
    fn register_event_sink(&self, sink: mpsc::Sender<InboundEvent>);
}
