//! Call admission
//!
//! Turns an inbound offer into a tracked call and decides its fate from the
//! current process state. The call actor itself is built by the
//! `CallFactory` collaborator and policy-driven disposition of accepted
//! calls (ringing, answering, forwarding) belongs to the `CallRouter`
//! collaborator; this module only makes the admission decision.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info, warn};

use crate::call::{CallHandle, RejectReason};
use crate::error::SignalingResult;
use crate::process::{ProcessState, ProcessStatus};
use crate::registry::CallRegistry;
use crate::types::{CallId, EventPayload};

/// Builds the call actor for an offered call
///
/// The factory owns spawning the actor and its mailbox receiver; admission
/// only ever sees the returned handle.
pub trait CallFactory: Send + Sync {
    /// Create the actor for `call_id` and return its handle
    fn create(&self, call_id: &CallId, offer: &EventPayload) -> SignalingResult<CallHandle>;
}

/// Policy-driven disposition of an admitted call
#[async_trait]
pub trait CallRouter: Send + Sync {
    /// Take responsibility for an accepted call
    async fn handle(&self, call: CallHandle) -> SignalingResult<()>;
}

/// Admission decision path for inbound offers
pub struct CallAdmission {
    factory: Arc<dyn CallFactory>,
    router: Arc<dyn CallRouter>,
    registry: Arc<CallRegistry>,
    process: Arc<ProcessStatus>,
}

impl CallAdmission {
    /// Wire the admission path to its collaborators
    pub fn new(
        factory: Arc<dyn CallFactory>,
        router: Arc<dyn CallRouter>,
        registry: Arc<CallRegistry>,
        process: Arc<ProcessStatus>,
    ) -> Self {
        Self {
            factory,
            router,
            registry,
            process,
        }
    }

    /// Admit or reject an offered call, returning its handle when an actor
    /// was created.
    ///
    /// The handle is registered before the status branch so a rejected call
    /// is still tracked for its short rejection lifecycle. Failures are
    /// logged and contained; one bad offer must never take down the
    /// dispatch path.
    pub async fn admit(&self, call_id: CallId, offer: EventPayload) -> Option<CallHandle> {
        match self.build_and_route(&call_id, offer).await {
            Ok(call) => Some(call),
            Err(err) => {
                error!(
                    call_id = %call_id,
                    error = %err,
                    category = err.category(),
                    "Call admission failed"
                );
                None
            }
        }
    }

    async fn build_and_route(
        &self,
        call_id: &CallId,
        offer: EventPayload,
    ) -> SignalingResult<CallHandle> {
        let call = self.factory.create(call_id, &offer)?;
        self.registry.insert(call.clone());

        match self.process.current() {
            ProcessState::Booting | ProcessState::Rejecting => {
                info!(
                    call_id = %call_id,
                    "Declining call because the process is not yet running"
                );
                call.reject(RejectReason::Declined);
            }
            ProcessState::Running | ProcessState::Stopping => {
                if let Err(err) = self.router.handle(call.clone()).await {
                    error!(
                        call_id = %call_id,
                        error = %err,
                        "Call routing failed after admission"
                    );
                }
            }
            other => {
                warn!(
                    call_id = %call_id,
                    state = ?other,
                    "Rejecting call from an unexpected process state"
                );
                call.reject(RejectReason::InternalError);
            }
        }

        Ok(call)
    }
}
