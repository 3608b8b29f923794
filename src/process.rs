//! Process status register
//!
//! Tracks the hosting process through {Booting, Running, Rejecting,
//! Stopping, Stopped} and publishes a hook event on the bus process
//! category for each externally observable transition. Created once at
//! startup next to the bus and shared by `Arc`: admission and the
//! supervisor read it, the connect loop and operator surfaces drive it.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info, warn};

use crate::bus::{BusEvent, EventBus, EventCategory};

/// Lifecycle states of the hosting process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProcessState {
    /// Starting up, or recovering a lost connection; not accepting new calls
    Booting,
    /// Fully operational
    Running,
    /// Quiesced; declining new calls while existing ones finish
    Rejecting,
    /// Shutting down
    Stopping,
    /// Terminal
    Stopped,
}

/// Lifecycle hook events published on [`EventCategory::Process`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessEvent {
    /// Boot finished; the connection may transition to ready
    Booted,
    /// Quiescence requested; stop taking new calls, keep the session open
    Quiesced,
    /// Full process stop requested
    ShutdownRequested,
}

/// Readable/writable process status shared across the crate
pub struct ProcessStatus {
    state: RwLock<ProcessState>,
    bus: Arc<EventBus>,
}

impl ProcessStatus {
    /// Create a register in the `Booting` state
    pub fn new(bus: Arc<EventBus>) -> Self {
        Self {
            state: RwLock::new(ProcessState::Booting),
            bus,
        }
    }

    /// The current process state
    pub fn current(&self) -> ProcessState {
        *self.state.read()
    }

    /// Mark boot complete: `Booting -> Running`, publishing `Booted`.
    ///
    /// Called from the Connected observer, so a duplicate Connected while
    /// already Running is tolerated silently.
    pub fn mark_booted(&self) {
        match self.transition(&[ProcessState::Booting], ProcessState::Running) {
            Ok(_) => {
                info!("Process booted");
                self.publish(ProcessEvent::Booted);
            }
            Err(current) => {
                debug!(state = ?current, "Ignoring booted signal; process is not booting");
            }
        }
    }

    /// Drop back to `Booting` while the connection recovers: `Running ->
    /// Booting`. New calls are declined until the next `mark_booted`.
    pub fn reset_to_recovering(&self) {
        match self.transition(&[ProcessState::Running], ProcessState::Booting) {
            Ok(_) => info!("Process reset to booting while the connection recovers"),
            Err(current) => {
                debug!(state = ?current, "Ignoring recovery reset; process is not running");
            }
        }
    }

    /// Quiesce: `Running -> Rejecting`, publishing `Quiesced`. Existing
    /// calls continue; new offers are declined.
    pub fn request_quiesce(&self) {
        match self.transition(&[ProcessState::Running], ProcessState::Rejecting) {
            Ok(_) => {
                info!("Process quiesced; declining new calls");
                self.publish(ProcessEvent::Quiesced);
            }
            Err(current) => {
                warn!(state = ?current, "Ignoring quiesce request; process is not running");
            }
        }
    }

    /// Request a full stop, publishing `ShutdownRequested`. Idempotent once
    /// the process is already stopping.
    pub fn request_stop(&self) {
        let allowed = [
            ProcessState::Booting,
            ProcessState::Running,
            ProcessState::Rejecting,
        ];
        match self.transition(&allowed, ProcessState::Stopping) {
            Ok(previous) => {
                info!(from = ?previous, "Process stop requested");
                self.publish(ProcessEvent::ShutdownRequested);
            }
            Err(current) => {
                debug!(state = ?current, "Stop already in progress");
            }
        }
    }

    /// Record that shutdown finished: `Stopping -> Stopped`
    pub fn mark_stopped(&self) {
        match self.transition(&[ProcessState::Stopping], ProcessState::Stopped) {
            Ok(_) => info!("Process stopped"),
            Err(current) => {
                warn!(state = ?current, "Ignoring stopped signal; process was not stopping");
            }
        }
    }

    /// Apply `to` when the current state is in `allowed`, returning the
    /// previous state. The lock is released before any hook publication so
    /// subscribers may read the register.
    fn transition(
        &self,
        allowed: &[ProcessState],
        to: ProcessState,
    ) -> Result<ProcessState, ProcessState> {
        let mut state = self.state.write();
        let current = *state;
        if allowed.contains(&current) {
            *state = to;
            drop(state);
            debug!(from = ?current, to = ?to, "Process state transition");
            Ok(current)
        } else {
            Err(current)
        }
    }

    fn publish(&self, event: ProcessEvent) {
        self.bus
            .publish(EventCategory::Process, BusEvent::Process(event));
    }
}

impl std::fmt::Debug for ProcessStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessStatus")
            .field("state", &self.current())
            .finish()
    }
}
