//! Connection supervisor
//!
//! Owns the signaling transport for the life of the process: starts the
//! session, watches it fail, retries within the configured budget, and
//! couples connection state to the process lifecycle. One supervisor is
//! constructed at startup and wired to the shared bus, registry, and
//! status register; collaborators receive it by reference.
//!
//! Boot synchronization works through the bus: `run` parks on a one-shot
//! completion that a Connected or ShutdownRequested event resolves, and the
//! persistent Connected observer resets the retry counter and marks the
//! process booted before any waiter wakes.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::bus::{BusEvent, EventBus, EventCategory, Subscription};
use crate::config::ConnectionConfig;
use crate::error::{SignalingError, SignalingResult};
use crate::process::{ProcessEvent, ProcessState, ProcessStatus};
use crate::router::EventRouter;
use crate::transport::{ServeOutcome, SignalingTransport};
use crate::types::InboundEvent;

/// How a `run` boot wait ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootOutcome {
    /// The connection came up and the process is running
    Connected,
    /// Shutdown was requested before the connection came up
    ShutdownRequested,
    /// The reconnect budget was exhausted while still booting
    Aborted,
    /// `run` was called while the process was not booting; nothing was done
    Skipped,
}

#[derive(Debug)]
enum WakeReason {
    Connected,
    Shutdown,
}

/// Supervises the signaling connection and its retry lifecycle
pub struct ConnectionSupervisor {
    config: ConnectionConfig,
    transport: Arc<dyn SignalingTransport>,
    process: Arc<ProcessStatus>,
    bus: Arc<EventBus>,
    attempts: Arc<AtomicU32>,
    stop_notify: Arc<Notify>,
    connect_task: Option<JoinHandle<()>>,
    dispatch_task: Option<JoinHandle<()>>,
    hook_subscriptions: Vec<Subscription>,
}

impl ConnectionSupervisor {
    /// Wire the transport into the dispatch path and install the process
    /// lifecycle hooks. The returned supervisor is ready for [`run`].
    ///
    /// [`run`]: ConnectionSupervisor::run
    pub fn initialize(
        config: ConnectionConfig,
        transport: Arc<dyn SignalingTransport>,
        router: Arc<EventRouter>,
        process: Arc<ProcessStatus>,
        bus: Arc<EventBus>,
    ) -> SignalingResult<Self> {
        config.validate()?;

        // Pump the transport's event stream into the router.
        let (event_tx, mut event_rx) = mpsc::channel(1000);
        transport.register_event_sink(event_tx);
        let dispatch_task = tokio::spawn(async move {
            while let Some(event) = event_rx.recv().await {
                router.dispatch(event).await;
            }
            debug!("Transport event sink closed; dispatch pump exiting");
        });

        let attempts = Arc::new(AtomicU32::new(0));
        let stop_notify = Arc::new(Notify::new());
        let mut hooks = Vec::new();

        // Persistent Connected observer. Registered ahead of any run()
        // waiter, so the counter is already zeroed and the process already
        // marked booted by the time the waiter wakes.
        let connected_attempts = attempts.clone();
        let connected_process = process.clone();
        hooks.push(bus.subscribe_filtered(
            EventCategory::Signaling,
            |e| matches!(e, BusEvent::Signaling(InboundEvent::Connected)),
            move |_| {
                info!("Connected to signaling server");
                connected_attempts.store(0, Ordering::SeqCst);
                connected_process.mark_booted();
            },
        ));

        // Booted: the connection may advertise readiness.
        let ready_transport = transport.clone();
        hooks.push(bus.subscribe_filtered(
            EventCategory::Process,
            |e| matches!(e, BusEvent::Process(ProcessEvent::Booted)),
            move |_| ready_transport.set_ready(true),
        ));

        // Quiesced: stop taking new calls while the session stays open.
        let quiesce_transport = transport.clone();
        hooks.push(bus.subscribe_filtered(
            EventCategory::Process,
            |e| matches!(e, BusEvent::Process(ProcessEvent::Quiesced)),
            move |_| {
                if quiesce_transport.is_connected() {
                    quiesce_transport.set_ready(false);
                }
            },
        ));

        // Shutdown: stop the client and break any reconnect delay.
        let stop_transport = transport.clone();
        let loop_notify = stop_notify.clone();
        hooks.push(bus.subscribe_filtered(
            EventCategory::Process,
            |e| matches!(e, BusEvent::Process(ProcessEvent::ShutdownRequested)),
            move |_| {
                stop_transport.stop();
                loop_notify.notify_one();
            },
        ));

        Ok(Self {
            config,
            transport,
            process,
            bus,
            attempts,
            stop_notify,
            connect_task: None,
            dispatch_task: Some(dispatch_task),
            hook_subscriptions: hooks,
        })
    }

    /// Block until the connection is established or shutdown intervenes.
    ///
    /// Only effective while the process is booting. Starts the background
    /// connect loop if one is not already running, so at most one connect
    /// attempt is ever in flight. The boot-abort check runs on every wake;
    /// a connected wake cannot trip it because the Connected observer
    /// zeroes the counter first.
    pub async fn run(&mut self) -> BootOutcome {
        let state = self.process.current();
        if state != ProcessState::Booting {
            debug!(state = ?state, "Ignoring boot wait; process is not booting");
            return BootOutcome::Skipped;
        }

        let (wake_tx, wake_rx) = oneshot::channel();
        let waker = Arc::new(Mutex::new(Some(wake_tx)));

        let connected_waker = waker.clone();
        let connected_token = self.bus.subscribe_filtered(
            EventCategory::Signaling,
            |e| matches!(e, BusEvent::Signaling(InboundEvent::Connected)),
            move |_| {
                if let Some(tx) = connected_waker.lock().take() {
                    let _ = tx.send(WakeReason::Connected);
                }
            },
        );
        let shutdown_waker = waker.clone();
        let shutdown_token = self.bus.subscribe_filtered(
            EventCategory::Process,
            |e| matches!(e, BusEvent::Process(ProcessEvent::ShutdownRequested)),
            move |_| {
                if let Some(tx) = shutdown_waker.lock().take() {
                    info!("Shutting down while connecting; breaking the connection wait");
                    let _ = tx.send(WakeReason::Shutdown);
                }
            },
        );

        self.spawn_connect_loop();

        // Connected or shutdown may have fired between the gate check and
        // the subscriptions; don't park on a wake that already happened.
        let reason = match self.process.current() {
            ProcessState::Running => WakeReason::Connected,
            ProcessState::Stopping | ProcessState::Stopped => WakeReason::Shutdown,
            _ => wake_rx.await.unwrap_or(WakeReason::Shutdown),
        };

        self.bus.unsubscribe(connected_token);
        self.bus.unsubscribe(shutdown_token);

        if self.attempts.load(Ordering::SeqCst) >= self.config.reconnect_attempts {
            return BootOutcome::Aborted;
        }

        match reason {
            WakeReason::Connected => BootOutcome::Connected,
            WakeReason::Shutdown => BootOutcome::ShutdownRequested,
        }
    }

    /// Stop the transport, wind down the connect loop, and stop the
    /// dispatch pump.
    pub async fn shutdown(&mut self) {
        self.process.request_stop();

        if let Some(task) = self.connect_task.take() {
            let _ = task.await;
        }
        if let Some(task) = self.dispatch_task.take() {
            task.abort();
            let _ = task.await;
        }

        for token in std::mem::take(&mut self.hook_subscriptions) {
            self.bus.unsubscribe(token);
        }

        self.process.mark_stopped();
        info!("Connection supervisor stopped");
    }

    /// Current reconnect attempt count; 0 after a successful connect
    pub fn attempt_count(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Remaining reconnect budget
    pub fn remaining_attempts(&self) -> u32 {
        self.config
            .reconnect_attempts
            .saturating_sub(self.attempt_count())
    }

    /// Whether the transport currently has an established session
    pub fn is_connected(&self) -> bool {
        self.transport.is_connected()
    }

    /// The connection configuration this supervisor enforces
    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    fn spawn_connect_loop(&mut self) {
        let running = self
            .connect_task
            .as_ref()
            .map(|task| !task.is_finished())
            .unwrap_or(false);
        if running {
            debug!("Connect loop already running");
            return;
        }

        let transport = self.transport.clone();
        let process = self.process.clone();
        let attempts = self.attempts.clone();
        let stop_notify = self.stop_notify.clone();
        let max_attempts = self.config.reconnect_attempts;
        let interval = self.config.reconnect_interval;

        self.connect_task = Some(tokio::spawn(async move {
            let outcome =
                connect_loop(transport, process, attempts, stop_notify, max_attempts, interval)
                    .await;
            if let Err(err) = outcome {
                error!(
                    error = %err,
                    category = err.category(),
                    "Connection subsystem terminated"
                );
            }
        }));
    }
}

impl std::fmt::Debug for ConnectionSupervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionSupervisor")
            .field("attempts", &self.attempt_count())
            .field("process", &self.process.current())
            .finish()
    }
}

/// Drive the transport until it stops cleanly, the retry budget runs out,
/// or a protocol error ends the connection subsystem.
async fn connect_loop(
    transport: Arc<dyn SignalingTransport>,
    process: Arc<ProcessStatus>,
    attempts: Arc<AtomicU32>,
    stop_notify: Arc<Notify>,
    max_attempts: u32,
    interval: Duration,
) -> SignalingResult<()> {
    loop {
        info!("Starting connection to server");
        match transport.connect_and_serve().await {
            ServeOutcome::Stopped => {
                debug!("Transport stopped; connect loop exiting");
                return Ok(());
            }
            ServeOutcome::ProtocolError { reason } => {
                error!(reason = %reason, "The connection failed due to a protocol error");
                process.request_stop();
                return Err(SignalingError::protocol(reason));
            }
            ServeOutcome::Disconnected { reason } => {
                // Disconnects only matter while the process is up or booting.
                let state = process.current();
                if !matches!(state, ProcessState::Booting | ProcessState::Running) {
                    debug!(state = ?state, "Disconnected while tearing down; connect loop exiting");
                    return Ok(());
                }
                if state == ProcessState::Running {
                    process.reset_to_recovering();
                }

                let attempt = attempts.fetch_add(1, Ordering::SeqCst) + 1;
                if attempt >= max_attempts {
                    error!("Connection lost. Connection retry attempts exceeded");
                    process.request_stop();
                    return Err(SignalingError::RetryExhausted { attempts: attempt });
                }

                error!(
                    attempt = attempt,
                    max_attempts = max_attempts,
                    reason = ?reason,
                    "Connection lost. Attempting reconnect"
                );
                tokio::select! {
                    _ = tokio::time::sleep(interval) => {}
                    _ = stop_notify.notified() => {
                        debug!("Stop requested during reconnect delay; connect loop exiting");
                        return Ok(());
                    }
                }
            }
        }
    }
}
