//! Events - listener registry, bubbling dispatch and the host event bus
//!
//! Two separate channels:
//! - element events (`click`, `load`, ...) run registered handlers synchronously
//!   along the propagation path
//! - host events (`HostEvent`) are broadcast for observers of the runtime itself

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;

use dom::{NodeId, Result};

use crate::document::Document;
use crate::net::Method;

/// An element event in flight
#[derive(Debug)]
pub struct Event {
    event_type: String,
    target: NodeId,
    current_target: AtomicU32,
    propagation_stopped: AtomicBool,
    default_prevented: AtomicBool,
}

impl Event {
    pub fn new(event_type: impl Into<String>, target: NodeId) -> Self {
        Self {
            event_type: event_type.into(),
            target,
            current_target: AtomicU32::new(target),
            propagation_stopped: AtomicBool::new(false),
            default_prevented: AtomicBool::new(false),
        }
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    /// Node the event was dispatched at
    pub fn target(&self) -> NodeId {
        self.target
    }

    /// Node whose listeners are currently running
    pub fn current_target(&self) -> NodeId {
        self.current_target.load(Ordering::Acquire)
    }

    /// Finish the current node, then stop bubbling
    pub fn stop_propagation(&self) {
        self.propagation_stopped.store(true, Ordering::Release);
    }

    pub fn propagation_stopped(&self) -> bool {
        self.propagation_stopped.load(Ordering::Acquire)
    }

    pub fn prevent_default(&self) {
        self.default_prevented.store(true, Ordering::Release);
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented.load(Ordering::Acquire)
    }
}

/// Listener callback. Two handlers are equal only when they are clones of
/// the same allocation, which is what removal matches on.
#[derive(Clone)]
pub struct EventHandler(Arc<dyn Fn(&Event) + Send + Sync>);

impl EventHandler {
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        Self(Arc::new(callback))
    }

    pub fn call(&self, event: &Event) {
        (self.0)(event)
    }

    fn addr(&self) -> *const () {
        Arc::as_ptr(&self.0) as *const ()
    }
}

impl PartialEq for EventHandler {
    fn eq(&self, other: &Self) -> bool {
        self.addr() == other.addr()
    }
}

impl Eq for EventHandler {}

impl fmt::Debug for EventHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventHandler({:p})", self.addr())
    }
}

/// Listeners per `(node, event type)`, in registration order
#[derive(Clone, Default)]
pub struct EventRegistry {
    listeners: Arc<DashMap<(NodeId, String), Vec<EventHandler>>>,
}

impl EventRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener. Returns false if the same handler was already
    /// registered for this node and type.
    pub fn add(&self, node_id: NodeId, event_type: &str, handler: EventHandler) -> bool {
        let mut entry = self
            .listeners
            .entry((node_id, event_type.to_string()))
            .or_default();
        if entry.contains(&handler) {
            return false;
        }
        entry.push(handler);
        true
    }

    /// Unregister a listener by identity. Returns false if it was not registered.
    pub fn remove(&self, node_id: NodeId, event_type: &str, handler: &EventHandler) -> bool {
        let key = (node_id, event_type.to_string());
        let removed = match self.listeners.get_mut(&key) {
            Some(mut handlers) => {
                let before = handlers.len();
                handlers.retain(|h| h != handler);
                handlers.len() != before
            }
            None => false,
        };
        self.listeners.remove_if(&key, |_, handlers| handlers.is_empty());
        removed
    }

    /// Snapshot of the listeners for one node and type
    pub fn handlers(&self, node_id: NodeId, event_type: &str) -> Vec<EventHandler> {
        self.listeners
            .get(&(node_id, event_type.to_string()))
            .map(|h| h.value().clone())
            .unwrap_or_default()
    }

    pub fn listener_count(&self, node_id: NodeId, event_type: &str) -> usize {
        self.listeners
            .get(&(node_id, event_type.to_string()))
            .map(|h| h.len())
            .unwrap_or(0)
    }
}

impl fmt::Debug for EventRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventRegistry")
            .field("keys", &self.listeners.len())
            .finish()
    }
}

/// Dispatch a bubbling event at `target`.
///
/// The propagation path is fixed before any handler runs, and neither the
/// document lock nor a registry shard is held while handlers execute, so a
/// handler may freely mutate the document or the registry.
pub fn dispatch(
    document: &Document,
    registry: &EventRegistry,
    target: NodeId,
    event_type: &str,
) -> Result<Event> {
    let path = {
        let arena = document.read();
        let mut path = vec![target];
        path.extend(arena.ancestors(target)?);
        path
    };

    let event = Event::new(event_type, target);
    for node_id in path {
        let handlers = registry.handlers(node_id, event_type);
        if handlers.is_empty() {
            continue;
        }
        event.current_target.store(node_id, Ordering::Release);
        for handler in handlers {
            handler.call(&event);
        }
        if event.propagation_stopped() {
            break;
        }
    }

    tracing::debug!(
        "Dispatched {} at node {} (default prevented: {})",
        event_type,
        target,
        event.default_prevented()
    );
    Ok(event)
}

/// Runtime events for host observers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum HostEvent {
    ScriptInserted { node_id: NodeId, src: String },
    ScriptLoaded { src: String, status: u16 },
    ScriptFailed { src: String, reason: String },
    RequestFinished { method: Method, url: String, status: u16 },
    RequestFailed { method: Method, url: String, reason: String },
}

/// Simple event bus using tokio broadcast channel
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<HostEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(1024)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Publish an event
    pub fn publish(&self, event: HostEvent) {
        let _ = self.tx.send(event); // Ignore error if no subscribers
    }

    /// Subscribe to events
    pub fn subscribe(&self) -> broadcast::Receiver<HostEvent> {
        self.tx.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
