//! Integration tests for inbound event dispatch: admission outcomes per
//! process state, stale call warnings, per-call ordering under concurrent
//! dispatch, and bus republication.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use tokio::sync::mpsc;

use signaling_core::{
    BusEvent, CallAdmission, CallFactory, CallHandle, CallId, CallMessage, CallRegistry,
    CallRouter, EventBus, EventCategory, EventPayload, EventRouter, InboundEvent, ProcessStatus,
    RejectReason, SignalingResult,
};

/// Factory building mailbox-backed handles; actor-side receivers are kept
/// for inspection.
#[derive(Default)]
struct TestCallFactory {
    inboxes: Mutex<Vec<(CallId, mpsc::UnboundedReceiver<CallMessage>)>>,
}

impl TestCallFactory {
    fn take_inbox(&self, id: &CallId) -> mpsc::UnboundedReceiver<CallMessage> {
        let mut inboxes = self.inboxes.lock();
        let index = inboxes
            .iter()
            .position(|(call_id, _)| call_id == id)
            .expect("no inbox for call");
        inboxes.remove(index).1
    }
}

impl CallFactory for TestCallFactory {
    fn create(&self, call_id: &CallId, _offer: &EventPayload) -> SignalingResult<CallHandle> {
        let (handle, inbox) = CallHandle::channel(call_id.clone());
        self.inboxes.lock().push((call_id.clone(), inbox));
        Ok(handle)
    }
}

struct RecordingRouter {
    handled: Arc<Mutex<Vec<CallId>>>,
}

#[async_trait]
impl CallRouter for RecordingRouter {
    async fn handle(&self, call: CallHandle) -> SignalingResult<()> {
        self.handled.lock().push(call.id().clone());
        Ok(())
    }
}

struct Fixture {
    bus: Arc<EventBus>,
    process: Arc<ProcessStatus>,
    registry: Arc<CallRegistry>,
    factory: Arc<TestCallFactory>,
    handled: Arc<Mutex<Vec<CallId>>>,
    router: Arc<EventRouter>,
}

fn fixture() -> Fixture {
    let bus = Arc::new(EventBus::new());
    let process = Arc::new(ProcessStatus::new(bus.clone()));
    let registry = Arc::new(CallRegistry::new());
    let factory = Arc::new(TestCallFactory::default());
    let handled = Arc::new(Mutex::new(Vec::new()));
    let admission = Arc::new(CallAdmission::new(
        factory.clone(),
        Arc::new(RecordingRouter {
            handled: handled.clone(),
        }),
        registry.clone(),
        process.clone(),
    ));
    let router = Arc::new(EventRouter::new(admission, registry.clone(), bus.clone()));
    Fixture {
        bus,
        process,
        registry,
        factory,
        handled,
        router,
    }
}

fn offer(id: &str) -> InboundEvent {
    InboundEvent::Offer {
        call_id: CallId::from(id),
        payload: EventPayload::new("offer"),
    }
}

/// Counts WARN-level events emitted on the current thread.
#[derive(Clone)]
struct WarnCounter {
    warnings: Arc<AtomicUsize>,
}

impl tracing::Subscriber for WarnCounter {
    fn enabled(&self, metadata: &tracing::Metadata<'_>) -> bool {
        metadata.level() == &tracing::Level::WARN
    }

    fn new_span(&self, _attrs: &tracing::span::Attributes<'_>) -> tracing::span::Id {
        tracing::span::Id::from_u64(1)
    }

    fn record(&self, _id: &tracing::span::Id, _values: &tracing::span::Record<'_>) {}

    fn record_follows_from(&self, _id: &tracing::span::Id, _follows: &tracing::span::Id) {}

    fn event(&self, _event: &tracing::Event<'_>) {
        self.warnings.fetch_add(1, Ordering::SeqCst);
    }

    fn enter(&self, _id: &tracing::span::Id) {}

    fn exit(&self, _id: &tracing::span::Id) {}
}

#[tokio::test]
async fn offer_before_boot_is_declined_but_tracked() {
    let fx = fixture();

    fx.router.dispatch(offer("early-offer")).await;

    let id = CallId::from("early-offer");
    assert!(fx.registry.contains(&id));
    assert!(fx.handled.lock().is_empty());

    let mut inbox = fx.factory.take_inbox(&id);
    assert_eq!(inbox.recv().await, Some(CallMessage::Reject(RejectReason::Declined)));
}

#[tokio::test]
async fn offer_while_running_reaches_the_call_router() {
    let fx = fixture();
    fx.process.mark_booted();

    fx.router.dispatch(offer("accepted-offer")).await;

    let id = CallId::from("accepted-offer");
    assert!(fx.registry.contains(&id));
    assert_eq!(fx.handled.lock().as_slice(), &[id]);
}

#[tokio::test]
async fn call_events_land_in_the_live_mailbox() {
    let fx = fixture();
    fx.process.mark_booted();
    fx.router.dispatch(offer("session-a")).await;

    let id = CallId::from("session-a");
    fx.router
        .dispatch(InboundEvent::CallTargeted {
            call_id: id.clone(),
            payload: EventPayload::new("dtmf"),
        })
        .await;
    fx.router
        .dispatch(InboundEvent::CallTargeted {
            call_id: id.clone(),
            payload: EventPayload::new("hangup"),
        })
        .await;

    let mut inbox = fx.factory.take_inbox(&id);
    let kinds: Vec<String> = std::iter::from_fn(|| inbox.try_recv().ok())
        .map(|message| match message {
            CallMessage::Event(payload) => payload.kind,
            CallMessage::Reject(reason) => panic!("unexpected rejection: {reason:?}"),
        })
        .collect();
    assert_eq!(kinds, vec!["dtmf".to_string(), "hangup".to_string()]);
}

#[tokio::test]
async fn events_for_unknown_calls_warn_exactly_once() {
    let fx = fixture();
    fx.process.mark_booted();

    let warnings = Arc::new(AtomicUsize::new(0));
    let _guard = tracing::subscriber::set_default(WarnCounter {
        warnings: warnings.clone(),
    });

    fx.router
        .dispatch(InboundEvent::CallTargeted {
            call_id: CallId::from("never-registered"),
            payload: EventPayload::new("dtmf"),
        })
        .await;

    assert_eq!(warnings.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn events_for_dead_calls_warn_instead_of_failing() {
    let fx = fixture();
    fx.process.mark_booted();
    fx.router.dispatch(offer("session-b")).await;

    let id = CallId::from("session-b");
    drop(fx.factory.take_inbox(&id));

    let warnings = Arc::new(AtomicUsize::new(0));
    let _guard = tracing::subscriber::set_default(WarnCounter {
        warnings: warnings.clone(),
    });

    fx.router
        .dispatch(InboundEvent::CallTargeted {
            call_id: id.clone(),
            payload: EventPayload::new("dtmf"),
        })
        .await;
    fx.router
        .dispatch(InboundEvent::CallTargeted {
            call_id: id,
            payload: EventPayload::new("hangup"),
        })
        .await;

    assert_eq!(warnings.load(Ordering::SeqCst), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_dispatch_preserves_per_call_order() {
    const CALLS: usize = 4;
    const EVENTS_PER_CALL: usize = 25;

    let fx = fixture();
    fx.process.mark_booted();

    let mut inboxes = Vec::new();
    for index in 0..CALLS {
        let id = CallId::from(format!("ordered-{index}"));
        let (handle, inbox) = CallHandle::channel(id.clone());
        fx.registry.insert(handle);
        inboxes.push((id, inbox));
    }

    let mut tasks = Vec::new();
    for (id, _) in &inboxes {
        let id = id.clone();
        let router = fx.router.clone();
        tasks.push(tokio::spawn(async move {
            for sequence in 0..EVENTS_PER_CALL {
                router
                    .dispatch(InboundEvent::CallTargeted {
                        call_id: id.clone(),
                        payload: EventPayload::new(format!("event-{sequence}")),
                    })
                    .await;
            }
        }));
    }
    for task in tasks {
        task.await.expect("dispatch task panicked");
    }

    for (id, mut inbox) in inboxes {
        for sequence in 0..EVENTS_PER_CALL {
            match inbox.try_recv() {
                Ok(CallMessage::Event(payload)) => {
                    assert_eq!(payload.kind, format!("event-{sequence}"), "call {id}");
                }
                other => panic!("call {id}: expected event {sequence}, got {other:?}"),
            }
        }
        assert!(inbox.try_recv().is_err(), "call {id}: trailing messages");
    }
}

#[tokio::test]
async fn generic_events_reach_broad_and_narrow_subscribers() {
    let fx = fixture();
    fx.process.mark_booted();

    let broad: Arc<Mutex<Vec<BusEvent>>> = Arc::new(Mutex::new(Vec::new()));
    let narrow: Arc<Mutex<Vec<BusEvent>>> = Arc::new(Mutex::new(Vec::new()));
    let broad_sink = broad.clone();
    let narrow_sink = narrow.clone();
    fx.bus.subscribe(EventCategory::Signaling, move |event| {
        broad_sink.lock().push(event.clone());
    });
    fx.bus.subscribe(EventCategory::Management, move |event| {
        narrow_sink.lock().push(event.clone());
    });

    fx.router
        .dispatch(InboundEvent::Generic {
            payload: EventPayload::management("queue-status"),
        })
        .await;
    fx.router
        .dispatch(InboundEvent::Generic {
            payload: EventPayload::new("heartbeat"),
        })
        .await;
    fx.router.dispatch(InboundEvent::Connected).await;

    let broad = broad.lock();
    assert_eq!(broad.len(), 3);
    assert!(matches!(
        &broad[0],
        BusEvent::Signaling(InboundEvent::Generic { payload }) if payload.kind == "queue-status"
    ));
    assert!(matches!(
        &broad[1],
        BusEvent::Signaling(InboundEvent::Generic { payload }) if payload.kind == "heartbeat"
    ));
    assert!(matches!(&broad[2], BusEvent::Signaling(InboundEvent::Connected)));

    let narrow = narrow.lock();
    assert_eq!(narrow.len(), 1);
    assert!(matches!(
        &narrow[0],
        BusEvent::Signaling(InboundEvent::Generic { payload }) if payload.kind == "queue-status"
    ));
}
