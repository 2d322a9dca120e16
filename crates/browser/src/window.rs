//! Window - the host a DOM facade runs against
//!
//! Owns the document, the listener registry, the host event bus and the
//! network transport, configured by one serializable `WindowConfig`.

use dashmap::DashSet;
use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use tokio::task::JoinHandle;
use url::Url;
use uuid::Uuid;

use dom::NodeId;

use crate::document::Document;
use crate::events::{self, Event, EventBus, EventRegistry, HostEvent};
use crate::net::{self, fetch, HttpRequest, ReqwestTransport, Transport, Xhr};

/// Window configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub id: String,
    /// Base for relative request URLs
    pub base_url: Option<String>,
    pub user_agent: String,
    /// Fetch `<script src>` elements inserted into the document
    pub load_scripts: bool,
    /// Broadcast capacity of the host event bus
    pub event_capacity: usize,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            base_url: None,
            user_agent: concat!("edom/", env!("CARGO_PKG_VERSION")).to_string(),
            load_scripts: true,
            event_capacity: 1024,
        }
    }
}

/// Document, listeners, host events and networking for one page.
/// Clones share all state.
#[derive(Clone)]
pub struct Window {
    pub config: WindowConfig,
    document: Document,
    registry: EventRegistry,
    event_bus: EventBus,
    transport: Arc<dyn Transport>,
    started_scripts: Arc<DashSet<NodeId>>,
}

impl Window {
    /// Blank document over an HTTP transport
    pub fn new(config: WindowConfig) -> net::Result<Self> {
        let transport = ReqwestTransport::new(&config.user_agent)?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    pub fn with_transport(config: WindowConfig, transport: Arc<dyn Transport>) -> Self {
        tracing::debug!("Window {} created", config.id);
        Self {
            event_bus: EventBus::with_capacity(config.event_capacity),
            config,
            document: Document::new(),
            registry: EventRegistry::new(),
            transport,
            started_scripts: Arc::new(DashSet::new()),
        }
    }

    /// Replace the blank document. Scripts already in `document` stay inert.
    pub fn with_document(mut self, document: Document) -> Self {
        self.document = document;
        self
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn registry(&self) -> &EventRegistry {
        &self.registry
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    pub fn transport(&self) -> Arc<dyn Transport> {
        self.transport.clone()
    }

    pub fn resolve_url(&self, raw: &str) -> net::Result<Url> {
        net::resolve_url(self.config.base_url.as_deref(), raw)
    }

    /// XHR style helpers bound to this window
    pub fn xhr(&self) -> Xhr {
        Xhr::new(
            self.transport.clone(),
            self.config.base_url.clone(),
            self.event_bus.clone(),
        )
    }

    /// JSON GET resolving to `None` on any failure
    pub fn fetch_get(&self, url: &str) -> impl Future<Output = Option<Value>> + Send + 'static {
        fetch::fetch_get(
            self.transport.clone(),
            self.config.base_url.clone(),
            url.to_string(),
        )
    }

    /// Fire a bubbling event at `target`
    pub fn dispatch(&self, target: NodeId, event_type: &str) -> dom::Result<Event> {
        events::dispatch(&self.document, &self.registry, target, event_type)
    }

    /// Host reaction to nodes the facade just inserted.
    ///
    /// Every connected `<script src>` among `nodes` and their descendants is
    /// announced once on the event bus and, when enabled and a tokio runtime
    /// is running, fetched in the background. A finished fetch fires `load`
    /// (2xx) or `error` at the script element. Script text is never run.
    pub fn nodes_inserted(&self, nodes: &[NodeId]) -> Option<JoinHandle<()>> {
        let scripts: Vec<(NodeId, String)> = {
            let arena = self.document.read();
            nodes
                .iter()
                .filter(|&&id| arena.is_connected(id))
                .flat_map(|&id| {
                    let mut ids = vec![id];
                    ids.extend(arena.descendants(id).unwrap_or_default());
                    ids
                })
                .filter_map(|id| {
                    let node = arena.get(id).ok()?;
                    let src = node.attr("src").filter(|_| node.is_tag("script"))?;
                    (!src.is_empty()).then(|| (id, src.to_string()))
                })
                .filter(|(id, _)| self.started_scripts.insert(*id))
                .collect()
        };

        if scripts.is_empty() {
            return None;
        }
        for (node_id, src) in &scripts {
            self.event_bus.publish(HostEvent::ScriptInserted {
                node_id: *node_id,
                src: src.clone(),
            });
        }
        if !self.config.load_scripts {
            return None;
        }

        let handle = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                tracing::warn!("No tokio runtime, {} script(s) not loaded", scripts.len());
                return None;
            }
        };

        let window = self.clone();
        Some(handle.spawn(async move {
            let loads = scripts
                .into_iter()
                .map(|(node_id, src)| window.load_script(node_id, src));
            join_all(loads).await;
        }))
    }

    async fn load_script(&self, node_id: NodeId, src: String) {
        let outcome = match self.resolve_url(&src) {
            Ok(url) => self
                .transport
                .send(HttpRequest::get(url))
                .await
                .map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };

        let event_type = match outcome {
            Ok(response) if (200..300).contains(&response.status) => {
                self.event_bus.publish(HostEvent::ScriptLoaded {
                    src,
                    status: response.status,
                });
                "load"
            }
            Ok(response) => {
                let reason = format!("HTTP {}", response.status);
                self.script_failed(node_id, src, reason);
                "error"
            }
            Err(reason) => {
                self.script_failed(node_id, src, reason);
                "error"
            }
        };

        if let Err(e) = self.dispatch(node_id, event_type) {
            tracing::warn!("Could not fire {} at script {}: {}", event_type, node_id, e);
        }
    }

    fn script_failed(&self, node_id: NodeId, src: String, reason: String) {
        let element = self.document.xpath(node_id).unwrap_or_default();
        tracing::warn!(element = %element, "Script {} failed to load: {}", src, reason);
        self.event_bus.publish(HostEvent::ScriptFailed { src, reason });
    }
}

impl std::fmt::Debug for Window {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Window")
            .field("config", &self.config)
            .field("document", &self.document)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventHandler;
    use crate::net::MemoryTransport;
    use parking_lot::Mutex;
    use tokio::sync::broadcast::error::TryRecvError;

    fn window_with(transport: &Arc<MemoryTransport>) -> Window {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
        let config = WindowConfig {
            base_url: Some("http://site.test/".to_string()),
            ..Default::default()
        };
        Window::with_transport(config, transport.clone())
    }

    fn insert_script(window: &Window, src: &str, connected: bool) -> NodeId {
        let body = window.document().body().unwrap();
        let mut arena = window.document().write();
        let script = arena.create_element("script").unwrap();
        arena.get_mut(script).unwrap().set_attr("src", src);
        if connected {
            arena.append_child(body, script).unwrap();
        }
        script
    }

    #[test]
    fn test_config_defaults() {
        let config = WindowConfig::default();
        assert!(config.load_scripts);
        assert_eq!(config.event_capacity, 1024);
        assert!(config.base_url.is_none());
        let id = Uuid::parse_str(&config.id).unwrap();
        assert_eq!(id.get_version_num(), 7);
    }

    #[test]
    fn test_config_partial_json() {
        let config: WindowConfig =
            serde_json::from_str(r#"{ "base_url": "http://x.test/", "load_scripts": false }"#)
                .unwrap();
        assert_eq!(config.base_url.as_deref(), Some("http://x.test/"));
        assert!(!config.load_scripts);
        assert_eq!(config.event_capacity, 1024);
    }

    #[test]
    fn test_resolve_url() {
        let window = window_with(&Arc::new(MemoryTransport::new()));
        assert_eq!(
            window.resolve_url("js/app.js").unwrap().as_str(),
            "http://site.test/js/app.js"
        );
    }

    #[tokio::test]
    async fn test_inserted_script_is_loaded() {
        let transport = Arc::new(MemoryTransport::new());
        transport.respond("http://site.test/app.js", 200, "console.log(1)");
        let window = window_with(&transport);
        let mut rx = window.event_bus().subscribe();

        let script = insert_script(&window, "app.js", true);
        let fired = Arc::new(Mutex::new(Vec::new()));
        let sink = fired.clone();
        window.registry().add(
            script,
            "load",
            EventHandler::new(move |e: &Event| sink.lock().push(e.event_type().to_string())),
        );

        window.nodes_inserted(&[script]).unwrap().await.unwrap();

        assert_eq!(
            rx.recv().await.unwrap(),
            HostEvent::ScriptInserted {
                node_id: script,
                src: "app.js".into()
            }
        );
        assert_eq!(
            rx.recv().await.unwrap(),
            HostEvent::ScriptLoaded {
                src: "app.js".into(),
                status: 200
            }
        );
        assert_eq!(*fired.lock(), vec!["load".to_string()]);
    }

    #[tokio::test]
    async fn test_missing_script_fires_error() {
        let transport = Arc::new(MemoryTransport::new());
        let window = window_with(&transport);
        let mut rx = window.event_bus().subscribe();

        let script = insert_script(&window, "missing.js", true);
        let fired = Arc::new(Mutex::new(0));
        let sink = fired.clone();
        window.registry().add(
            script,
            "error",
            EventHandler::new(move |_: &Event| *sink.lock() += 1),
        );

        window.nodes_inserted(&[script]).unwrap().await.unwrap();

        let _inserted = rx.recv().await.unwrap();
        assert!(matches!(
            rx.recv().await.unwrap(),
            HostEvent::ScriptFailed { reason, .. } if reason == "HTTP 404"
        ));
        assert_eq!(*fired.lock(), 1);
    }

    #[tokio::test]
    async fn test_scripts_start_once_and_only_when_connected() {
        let transport = Arc::new(MemoryTransport::new());
        let window = window_with(&transport);

        let detached = insert_script(&window, "a.js", false);
        assert!(window.nodes_inserted(&[detached]).is_none());

        let script = insert_script(&window, "b.js", true);
        window.nodes_inserted(&[script]).unwrap().await.unwrap();
        assert!(window.nodes_inserted(&[script]).is_none());

        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_nested_script_in_inserted_subtree() {
        let transport = Arc::new(MemoryTransport::new());
        let window = window_with(&transport);
        let body = window.document().body().unwrap();

        let wrapper = {
            let mut arena = window.document().write();
            let wrapper = arena.create_element("div").unwrap();
            let script = arena.create_element("script").unwrap();
            arena.get_mut(script).unwrap().set_attr("src", "nested.js");
            arena.append_child(wrapper, script).unwrap();
            arena.append_child(body, wrapper).unwrap();
            wrapper
        };

        window.nodes_inserted(&[wrapper]).unwrap().await.unwrap();
        assert_eq!(
            transport.requests()[0].url.as_str(),
            "http://site.test/nested.js"
        );
    }

    #[tokio::test]
    async fn test_loading_disabled_still_announces() {
        let transport = Arc::new(MemoryTransport::new());
        let config = WindowConfig {
            load_scripts: false,
            ..Default::default()
        };
        let window = Window::with_transport(config, transport.clone());
        let mut rx = window.event_bus().subscribe();

        let script = insert_script(&window, "http://cdn.test/x.js", true);
        assert!(window.nodes_inserted(&[script]).is_none());

        assert!(matches!(rx.try_recv(), Ok(HostEvent::ScriptInserted { .. })));
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
        assert!(transport.requests().is_empty());
    }

    #[test]
    fn test_no_runtime_skips_loading() {
        let transport = Arc::new(MemoryTransport::new());
        let window = window_with(&transport);
        let script = insert_script(&window, "app.js", true);
        assert!(window.nodes_inserted(&[script]).is_none());
        assert!(transport.requests().is_empty());
    }
}
