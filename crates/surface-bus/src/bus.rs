//! In-process bus with serialized delivery.
//!
//! Each context is an endpoint keyed by [`Target`]. Envelopes are
//! serialized once on send and deserialized per handler, so every handler
//! receives its own deep copy; function values and live references cannot
//! cross. All registered handlers for the target are invoked (overlapping
//! registrations therefore produce duplicate deliveries of the same
//! logical event — the dispatcher's suppression key exists for exactly
//! this), and the first reply in registration order is returned to the
//! sender.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use futures::future::{join_all, BoxFuture};
use parking_lot::RwLock;
use serde_json::Value;
use tracing::{debug, warn};
use voicepilot_core_types::SurfaceId;

use crate::envelope::Envelope;
use crate::errors::BusError;

/// Addressable context kinds.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Target {
    /// The privileged controller context (one per process).
    Controller,
    /// The executor context of a page surface.
    Page(SurfaceId),
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Target::Controller => write!(f, "controller"),
            Target::Page(surface) => write!(f, "page:{surface}"),
        }
    }
}

/// Transport-supplied sender identity.
#[derive(Clone, Copy, Debug, Default)]
pub struct SenderInfo {
    /// Surface the message originated from; `None` for the controller.
    pub surface: Option<SurfaceId>,
}

impl SenderInfo {
    pub fn controller() -> Self {
        Self { surface: None }
    }

    pub fn page(surface: SurfaceId) -> Self {
        Self {
            surface: Some(surface),
        }
    }
}

/// A handler replies by resolving its future; an unresolved future is the
/// "keep the channel open" signal, and resolving to `None` drops the
/// reply (the sender observes the non-fatal no-response value).
pub type HandlerFuture = BoxFuture<'static, Option<Value>>;
pub type Handler = Arc<dyn Fn(Envelope, SenderInfo) -> HandlerFuture + Send + Sync>;

struct NamedHandler {
    name: String,
    handler: Handler,
}

#[derive(Default)]
struct Endpoint {
    handlers: RwLock<Vec<NamedHandler>>,
}

/// The process-local bus implementation.
pub struct LocalBus {
    endpoints: DashMap<Target, Arc<Endpoint>>,
    default_deadline: Duration,
}

impl LocalBus {
    pub fn new() -> Arc<Self> {
        Self::with_deadline(Duration::from_secs(10))
    }

    pub fn with_deadline(default_deadline: Duration) -> Arc<Self> {
        Arc::new(Self {
            endpoints: DashMap::new(),
            default_deadline,
        })
    }

    /// Bring a context into existence. Attaching an already-attached
    /// target is a no-op.
    pub fn attach(&self, target: Target) {
        self.endpoints.entry(target).or_default();
        debug!(target: "surface-bus", context = %target, "context attached");
    }

    /// Tear a context down. Every handler registered on it is dropped,
    /// and with them any per-context state they own.
    pub fn detach(&self, target: Target) {
        if self.endpoints.remove(&target).is_some() {
            debug!(target: "surface-bus", context = %target, "context detached");
        }
    }

    pub fn is_attached(&self, target: Target) -> bool {
        self.endpoints.contains_key(&target)
    }

    /// Whether a handler with the given name is registered on the target.
    pub fn has_handler(&self, target: Target, name: &str) -> bool {
        self.endpoints
            .get(&target)
            .map(|ep| ep.handlers.read().iter().any(|h| h.name == name))
            .unwrap_or(false)
    }

    /// Register a named handler on an existing context.
    ///
    /// Names are unique per context; a second registration under the same
    /// name fails with [`BusError::AlreadyRegistered`] so injected code
    /// can make itself idempotent.
    pub fn register(&self, target: Target, name: &str, handler: Handler) -> Result<(), BusError> {
        let endpoint = self
            .endpoints
            .get(&target)
            .ok_or_else(|| BusError::Delivery {
                target: target.to_string(),
            })?;
        let mut handlers = endpoint.handlers.write();
        if handlers.iter().any(|h| h.name == name) {
            return Err(BusError::AlreadyRegistered(name.to_string()));
        }
        handlers.push(NamedHandler {
            name: name.to_string(),
            handler,
        });
        debug!(target: "surface-bus", context = %target, handler = name, "handler registered");
        Ok(())
    }

    /// Send an envelope and await the reply.
    ///
    /// `Ok(None)` is the implementation-defined no-response value: no
    /// handler replied, or the deadline elapsed first. Both are non-fatal
    /// by contract. `Err(BusError::Delivery)` means the target context is
    /// gone (or has nothing listening) and the caller may retry after
    /// re-establishing it.
    pub async fn send(
        &self,
        sender: SenderInfo,
        target: Target,
        envelope: &Envelope,
    ) -> Result<Option<Value>, BusError> {
        self.send_with_deadline(sender, target, envelope, self.default_deadline)
            .await
    }

    pub async fn send_with_deadline(
        &self,
        sender: SenderInfo,
        target: Target,
        envelope: &Envelope,
        deadline: Duration,
    ) -> Result<Option<Value>, BusError> {
        // Serialize exactly once; this is the isolation boundary.
        let frame = envelope.to_frame()?;

        let handlers: Vec<Handler> = {
            let endpoint = self
                .endpoints
                .get(&target)
                .ok_or_else(|| BusError::Delivery {
                    target: target.to_string(),
                })?;
            let guard = endpoint.handlers.read();
            guard.iter().map(|h| h.handler.clone()).collect()
        };

        if handlers.is_empty() {
            // A context with no listeners cannot receive.
            return Err(BusError::Delivery {
                target: target.to_string(),
            });
        }

        debug!(
            target: "surface-bus",
            context = %target,
            handlers = handlers.len(),
            "delivering envelope"
        );

        // Every handler sees its own deserialized copy; replies are
        // collected and the first in registration order wins.
        let futures: Vec<HandlerFuture> = handlers
            .iter()
            .map(|handler| {
                let copy = Envelope::from_frame(&frame);
                match copy {
                    Ok(envelope) => handler(envelope, sender),
                    Err(err) => {
                        warn!(target: "surface-bus", ?err, "frame re-materialization failed");
                        Box::pin(async { None }) as HandlerFuture
                    }
                }
            })
            .collect();

        match tokio::time::timeout(deadline, join_all(futures)).await {
            Ok(replies) => Ok(replies.into_iter().flatten().next()),
            Err(_) => {
                debug!(target: "surface-bus", context = %target, "reply deadline elapsed");
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use voicepilot_core_types::{ActionKind, ParameterSet};

    fn counting_handler(counter: Arc<AtomicUsize>, reply: Option<Value>) -> Handler {
        Arc::new(move |_env, _sender| {
            let counter = counter.clone();
            let reply = reply.clone();
            Box::pin(async move {
                counter.fetch_add(1, Ordering::SeqCst);
                reply
            })
        })
    }

    #[tokio::test]
    async fn send_to_missing_context_is_retryable_delivery_error() {
        let bus = LocalBus::new();
        let err = bus
            .send(SenderInfo::controller(), Target::Page(SurfaceId::new()), &Envelope::Ping)
            .await
            .unwrap_err();
        assert!(matches!(err, BusError::Delivery { .. }));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn detach_kills_delivery() {
        let bus = LocalBus::new();
        let surface = SurfaceId::new();
        let target = Target::Page(surface);
        bus.attach(target);
        let hits = Arc::new(AtomicUsize::new(0));
        bus.register(target, "executor", counting_handler(hits.clone(), Some(Value::Null)))
            .unwrap();

        assert!(bus.send(SenderInfo::controller(), target, &Envelope::Ping).await.is_ok());
        bus.detach(target);
        let err = bus
            .send(SenderInfo::controller(), target, &Envelope::Ping)
            .await
            .unwrap_err();
        assert!(matches!(err, BusError::Delivery { .. }));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn all_handlers_run_and_first_reply_wins() {
        let bus = LocalBus::new();
        let target = Target::Controller;
        bus.attach(target);
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));
        bus.register(
            target,
            "a",
            counting_handler(first.clone(), Some(serde_json::json!({ "who": "a" }))),
        )
        .unwrap();
        bus.register(
            target,
            "b",
            counting_handler(second.clone(), Some(serde_json::json!({ "who": "b" }))),
        )
        .unwrap();

        let reply = bus
            .send(SenderInfo::controller(), target, &Envelope::Ping)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reply["who"], "a");
        assert_eq!(first.load(Ordering::SeqCst), 1);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn duplicate_handler_name_is_rejected() {
        let bus = LocalBus::new();
        let target = Target::Page(SurfaceId::new());
        bus.attach(target);
        let hits = Arc::new(AtomicUsize::new(0));
        bus.register(target, "executor", counting_handler(hits.clone(), None))
            .unwrap();
        let err = bus
            .register(target, "executor", counting_handler(hits, None))
            .unwrap_err();
        assert!(matches!(err, BusError::AlreadyRegistered(_)));
    }

    #[tokio::test]
    async fn dropped_reply_resolves_to_no_response() {
        let bus = LocalBus::new();
        let target = Target::Controller;
        bus.attach(target);
        let hits = Arc::new(AtomicUsize::new(0));
        bus.register(target, "silent", counting_handler(hits, None)).unwrap();

        let reply = bus
            .send(
                SenderInfo::controller(),
                target,
                &Envelope::execute(ActionKind::None, ParameterSet::default()),
            )
            .await
            .unwrap();
        assert!(reply.is_none());
    }

    #[tokio::test]
    async fn slow_handler_hits_deadline_as_no_response() {
        let bus = LocalBus::with_deadline(Duration::from_millis(20));
        let target = Target::Controller;
        bus.attach(target);
        bus.register(
            target,
            "slow",
            Arc::new(|_env, _sender| {
                Box::pin(async {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    Some(Value::Null)
                })
            }),
        )
        .unwrap();

        let reply = bus
            .send(SenderInfo::controller(), target, &Envelope::Ping)
            .await
            .unwrap();
        assert!(reply.is_none());
    }
}
