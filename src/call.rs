//! Call handles and actor mailboxes
//!
//! A call's behavior is an actor outside this crate; what the dispatch path
//! holds is a `CallHandle`: the call id plus the sending half of the
//! actor's mailbox. Delivery is fire-and-forget so the router never blocks
//! on a slow call.

use tokio::sync::mpsc;

use crate::types::{CallId, EventPayload};

/// Why an offered call was turned away
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// The process is not accepting new work
    Declined,
    /// Admission hit an unexpected process state
    InternalError,
}

/// Messages delivered into a call actor's mailbox
#[derive(Debug, Clone, PartialEq)]
pub enum CallMessage {
    /// A protocol event addressed to this call
    Event(EventPayload),
    /// Admission turned the call away
    Reject(RejectReason),
}

/// Handle to a live call actor
///
/// Cheap to clone. The registry owns the canonical copy; the mailbox
/// receiver lives with the actor.
#[derive(Debug, Clone)]
pub struct CallHandle {
    id: CallId,
    mailbox: mpsc::UnboundedSender<CallMessage>,
}

impl CallHandle {
    /// Create a handle together with the actor-side mailbox receiver
    pub fn channel(id: CallId) -> (Self, mpsc::UnboundedReceiver<CallMessage>) {
        let (mailbox, inbox) = mpsc::unbounded_channel();
        (Self { id, mailbox }, inbox)
    }

    /// The call's id
    pub fn id(&self) -> &CallId {
        &self.id
    }

    /// Whether the actor can still receive messages
    pub fn is_alive(&self) -> bool {
        !self.mailbox.is_closed()
    }

    /// Deliver a protocol event to the actor without blocking.
    ///
    /// Returns `false` when the mailbox is closed because the actor already
    /// terminated.
    pub fn deliver(&self, payload: EventPayload) -> bool {
        self.mailbox.send(CallMessage::Event(payload)).is_ok()
    }

    /// Send a rejection into the mailbox
    pub fn reject(&self, reason: RejectReason) -> bool {
        self.mailbox.send(CallMessage::Reject(reason)).is_ok()
    }
}
