//! Inbound event routing
//!
//! Every event from the transport takes exactly one path: offers go to
//! admission, call-targeted events go to the live call actor, and
//! everything else is republished on the bus for subscribers. The
//! classification is a pure function over the closed event union, so a new
//! event kind cannot be routed by accident.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::admission::CallAdmission;
use crate::bus::{BusEvent, EventBus, EventCategory};
use crate::registry::CallRegistry;
use crate::types::{CallId, EventPayload, InboundEvent};

/// Dispatch path chosen for an inbound event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventClass {
    /// New call awaiting admission
    Offer,
    /// Event for an existing call
    CallTargeted(CallId),
    /// Everything else; republished on the bus
    Generic,
}

/// Classify an event by shape alone; no side effects
pub fn classify(event: &InboundEvent) -> EventClass {
    match event {
        InboundEvent::Offer { .. } => EventClass::Offer,
        InboundEvent::CallTargeted { call_id, .. } => EventClass::CallTargeted(call_id.clone()),
        InboundEvent::Connected
        | InboundEvent::Disconnected { .. }
        | InboundEvent::ProtocolError { .. }
        | InboundEvent::Generic { .. } => EventClass::Generic,
    }
}

/// Routes each inbound event to exactly one dispatch path
///
/// Safe to invoke concurrently; events for the same call keep their
/// relative order because delivery into a call mailbox is a synchronous
/// send.
pub struct EventRouter {
    admission: Arc<CallAdmission>,
    registry: Arc<CallRegistry>,
    bus: Arc<EventBus>,
}

impl EventRouter {
    /// Wire the router to the admission path, registry, and bus
    pub fn new(
        admission: Arc<CallAdmission>,
        registry: Arc<CallRegistry>,
        bus: Arc<EventBus>,
    ) -> Self {
        Self {
            admission,
            registry,
            bus,
        }
    }

    /// Dispatch one inbound event to its path
    pub async fn dispatch(&self, event: InboundEvent) {
        match classify(&event) {
            EventClass::Offer => {
                if let InboundEvent::Offer { call_id, payload } = event {
                    debug!(call_id = %call_id, "Routing offer to admission");
                    self.admission.admit(call_id, payload).await;
                }
            }
            EventClass::CallTargeted(call_id) => {
                if let InboundEvent::CallTargeted { payload, .. } = event {
                    self.deliver_to_call(&call_id, payload);
                }
            }
            EventClass::Generic => self.republish(event),
        }
    }

    /// Hand the event to the live actor; a miss or a dead mailbox is
    /// expected for events that arrive after a call ended and produces one
    /// warning.
    fn deliver_to_call(&self, call_id: &CallId, payload: EventPayload) {
        let kind = payload.kind.clone();
        let delivered = match self.registry.get(call_id) {
            Some(call) if call.is_alive() => call.deliver(payload),
            _ => false,
        };
        if delivered {
            debug!(call_id = %call_id, kind = %kind, "Delivered event to call");
        } else {
            warn!(
                call_id = %call_id,
                kind = %kind,
                "Event received for inactive call"
            );
        }
    }

    /// Republish under the broad signaling category, plus the management
    /// category for management-interface payloads, so subscribers can
    /// listen broadly or narrowly.
    fn republish(&self, event: InboundEvent) {
        let narrow = match &event {
            InboundEvent::Generic { payload } if payload.is_management() => {
                Some(EventCategory::Management)
            }
            _ => None,
        };

        let bus_event = BusEvent::Signaling(event);
        self.bus.publish(EventCategory::Signaling, bus_event.clone());
        if let Some(category) = narrow {
            self.bus.publish(category, bus_event);
        }
    }
}
