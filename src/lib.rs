//! # Signaling Core
//!
//! Connection lifecycle supervision and inbound event dispatch for a
//! telephony signaling session.
//!
//! The crate maintains one persistent session with a signaling server and
//! routes every inbound protocol event to the right consumer:
//!
//! - **ConnectionSupervisor**: connect, bounded retry, give-up, and boot
//!   synchronization with "connection established"
//! - **EventRouter**: classifies each event and delivers it to exactly one
//!   path (admission, a live call actor, or bus republication)
//! - **CallAdmission**: accepts or declines new offers from process state
//! - **EventBus**: carries generic protocol events and process lifecycle
//!   hooks to category subscribers
//!
//! The wire protocol, call behavior, and routing policy stay outside the
//! crate behind the `SignalingTransport`, `CallFactory`, and `CallRouter`
//! interfaces.
//!
//! ## Event flow
//!
//! ```text
//!                 ┌──────────────────────┐
//!   server ──────▶│  SignalingTransport  │ connect_and_serve / stop
//!                 └──────────┬───────────┘
//!                            │ InboundEvent stream
//!                            ▼
//!                 ┌──────────────────────┐     Offer      ┌───────────────┐
//!                 │     EventRouter      ├───────────────▶│ CallAdmission │
//!                 │      (classify)      │                └───────┬───────┘
//!                 └─────┬──────────┬─────┘                        │ register,
//!          CallTargeted │          │ Generic                      │ decide
//!                       ▼          ▼                              ▼
//!              ┌────────────┐  ┌──────────┐             ┌──────────────────┐
//!              │ live call  │  │ EventBus │◀────hooks───┤  ProcessStatus   │
//!              │  mailbox   │  └────┬─────┘             └──────────────────┘
//!              └────────────┘       │ Connected / ShutdownRequested
//!                                   ▼
//!                        ┌──────────────────────┐
//!                        │ ConnectionSupervisor │ retry loop + boot wait
//!                        └──────────────────────┘
//! ```
//!
//! A disconnect while running resets the process to booting, declines new
//! offers, and retries within the configured budget; a protocol error or an
//! exhausted budget escalates to a process stop.

pub mod admission;
pub mod bus;
pub mod call;
pub mod config;
pub mod error;
pub mod process;
pub mod registry;
pub mod router;
pub mod supervisor;
pub mod transport;
pub mod types;

// Primary API surface.
pub use admission::{CallAdmission, CallFactory, CallRouter};
pub use bus::{BusEvent, EventBus, EventCategory, Subscription};
pub use call::{CallHandle, CallMessage, RejectReason};
pub use config::ConnectionConfig;
pub use error::{SignalingError, SignalingResult};
pub use process::{ProcessEvent, ProcessState, ProcessStatus};
pub use registry::CallRegistry;
pub use router::{classify, EventClass, EventRouter};
pub use supervisor::{BootOutcome, ConnectionSupervisor};
pub use transport::{ServeOutcome, SignalingTransport};
pub use types::{CallId, EventOrigin, EventPayload, InboundEvent};
