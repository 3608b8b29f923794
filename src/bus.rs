//! Process-wide event bus
//!
//! Publish/subscribe registry keyed by event category with optional
//! per-subscription predicates. Delivery is synchronous and in registration
//! order; a panicking subscriber is logged and skipped so the remaining
//! subscribers still run.
//!
//! One bus is created at startup and shared by `Arc` for the process
//! lifetime. Subscriptions accumulate; `unsubscribe` exists for short-lived
//! observers such as the boot waiter.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::error;

use crate::process::ProcessEvent;
use crate::types::InboundEvent;

/// Channels events are published under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventCategory {
    /// Broad channel carrying every generic protocol event
    Signaling,
    /// Narrow channel carrying management-interface events only
    Management,
    /// Process lifecycle hooks
    Process,
}

/// An event as seen by bus subscribers
#[derive(Debug, Clone, PartialEq)]
pub enum BusEvent {
    /// A protocol event republished by the router
    Signaling(InboundEvent),
    /// A process lifecycle hook event
    Process(ProcessEvent),
}

type Callback = Arc<dyn Fn(&BusEvent) + Send + Sync>;
type Predicate = Arc<dyn Fn(&BusEvent) -> bool + Send + Sync>;

/// Token identifying one subscription, used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subscription {
    category: EventCategory,
    id: u64,
}

struct Subscriber {
    id: u64,
    predicate: Option<Predicate>,
    callback: Callback,
}

/// Category + predicate publish/subscribe with synchronous delivery
pub struct EventBus {
    subscribers: RwLock<HashMap<EventCategory, Vec<Subscriber>>>,
    next_id: AtomicU64,
}

impl EventBus {
    /// Create an empty bus
    pub fn new() -> Self {
        Self {
            subscribers: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Register a callback for every event published under `category`
    pub fn subscribe<F>(&self, category: EventCategory, callback: F) -> Subscription
    where
        F: Fn(&BusEvent) + Send + Sync + 'static,
    {
        self.register(category, None, Arc::new(callback))
    }

    /// Register a callback invoked only when `predicate` accepts the event
    pub fn subscribe_filtered<P, F>(
        &self,
        category: EventCategory,
        predicate: P,
        callback: F,
    ) -> Subscription
    where
        P: Fn(&BusEvent) -> bool + Send + Sync + 'static,
        F: Fn(&BusEvent) + Send + Sync + 'static,
    {
        self.register(category, Some(Arc::new(predicate)), Arc::new(callback))
    }

    fn register(
        &self,
        category: EventCategory,
        predicate: Option<Predicate>,
        callback: Callback,
    ) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let mut subscribers = self.subscribers.write();
        subscribers.entry(category).or_default().push(Subscriber {
            id,
            predicate,
            callback,
        });
        Subscription { category, id }
    }

    /// Remove a subscription; returns false when it was already gone
    pub fn unsubscribe(&self, subscription: Subscription) -> bool {
        let mut subscribers = self.subscribers.write();
        if let Some(list) = subscribers.get_mut(&subscription.category) {
            let before = list.len();
            list.retain(|s| s.id != subscription.id);
            return list.len() != before;
        }
        false
    }

    /// Deliver `event` to every matching subscriber of `category`, in
    /// registration order.
    ///
    /// The subscriber table is snapshotted before delivery, so callbacks may
    /// publish or change subscriptions without deadlocking; changes take
    /// effect from the next publish.
    pub fn publish(&self, category: EventCategory, event: BusEvent) {
        let snapshot: Vec<(u64, Option<Predicate>, Callback)> = {
            let subscribers = self.subscribers.read();
            match subscribers.get(&category) {
                Some(list) => list
                    .iter()
                    .map(|s| (s.id, s.predicate.clone(), s.callback.clone()))
                    .collect(),
                None => Vec::new(),
            }
        };

        for (id, predicate, callback) in snapshot {
            let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                let matched = match &predicate {
                    Some(p) => p(&event),
                    None => true,
                };
                if matched {
                    callback(&event);
                }
            }));
            if outcome.is_err() {
                error!(
                    subscription_id = id,
                    category = ?category,
                    "Event subscriber panicked; continuing with remaining subscribers"
                );
            }
        }
    }

    /// Number of live subscriptions under `category`
    pub fn subscriber_count(&self, category: EventCategory) -> usize {
        self.subscribers
            .read()
            .get(&category)
            .map(|list| list.len())
            .unwrap_or(0)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let subscribers = self.subscribers.read();
        let counts: HashMap<_, _> = subscribers.iter().map(|(c, l)| (*c, l.len())).collect();
        f.debug_struct("EventBus")
            .field("subscribers", &counts)
            .finish()
    }
}
