//! Live-call registry
//!
//! Concurrent map of the calls this process currently tracks. Admission
//! inserts, the router looks up, and whoever owns the call actor removes it
//! on termination. Lookups racing with removal are expected; a miss is not
//! an error.

use dashmap::DashMap;

use crate::call::CallHandle;
use crate::types::CallId;

/// Process-wide map of live calls keyed by call id
#[derive(Debug, Default)]
pub struct CallRegistry {
    calls: DashMap<CallId, CallHandle>,
}

impl CallRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            calls: DashMap::new(),
        }
    }

    /// Track a call, replacing any stale entry under the same id
    pub fn insert(&self, call: CallHandle) {
        self.calls.insert(call.id().clone(), call);
    }

    /// Look up a call by id
    pub fn get(&self, id: &CallId) -> Option<CallHandle> {
        self.calls.get(id).map(|entry| entry.value().clone())
    }

    /// Stop tracking a call, returning its handle when it was present
    pub fn remove(&self, id: &CallId) -> Option<CallHandle> {
        self.calls.remove(id).map(|(_, call)| call)
    }

    /// Whether a call with `id` is tracked
    pub fn contains(&self, id: &CallId) -> bool {
        self.calls.contains_key(id)
    }

    /// Number of tracked calls
    pub fn len(&self) -> usize {
        self.calls.len()
    }

    /// Whether no calls are tracked
    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }
}
