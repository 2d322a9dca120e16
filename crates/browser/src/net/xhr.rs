//! XHR style request helpers
//!
//! Callback based and fire-and-forget: every call spawns one task on the
//! current tokio runtime and hands back its `JoinHandle`. Failures never
//! reach the caller as a `Result`.
//!
//! - GET reports only a `200` response, with the body text
//! - POST reports any HTTP response through `on_success`, and anything that
//!   prevents a response through `on_error`

use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tokio::task::JoinHandle;

use super::client::Transport;
use super::protocol::{find_header, HttpRequest, HttpResponse};
use super::resolve_url;
use crate::events::{EventBus, HostEvent};

/// The finished request as a `load` handler sees it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XhrResponse {
    pub status: u16,
    pub status_text: String,
    pub response_text: String,
    pub headers: Vec<(String, String)>,
}

impl XhrResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

impl From<HttpResponse> for XhrResponse {
    fn from(response: HttpResponse) -> Self {
        Self {
            status: response.status,
            status_text: response.status_text,
            response_text: response.body,
            headers: response.headers,
        }
    }
}

/// Opaque failure report passed to `on_error`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorEvent {
    pub message: String,
}

impl ErrorEvent {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for ErrorEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "request failed: {}", self.message)
    }
}

/// Request issuer bound to one transport and base URL. Cheap to clone.
#[derive(Clone)]
pub struct Xhr {
    transport: Arc<dyn Transport>,
    base_url: Option<String>,
    event_bus: EventBus,
}

impl Xhr {
    pub fn new(transport: Arc<dyn Transport>, base_url: Option<String>, event_bus: EventBus) -> Self {
        Self {
            transport,
            base_url,
            event_bus,
        }
    }

    /// GET `url`; `on_load` runs once with the body when the status is 200.
    ///
    /// Must be called from within a tokio runtime.
    pub fn get<F>(&self, url: &str, on_load: F) -> JoinHandle<()>
    where
        F: FnOnce(String) + Send + 'static,
    {
        let resolved = resolve_url(self.base_url.as_deref(), url);
        let this = self.clone();
        let raw = url.to_string();

        tokio::spawn(async move {
            let url = match resolved {
                Ok(url) => url,
                Err(e) => {
                    tracing::debug!("Dropping GET {}: {}", raw, e);
                    return;
                }
            };

            match this.send(HttpRequest::get(url.clone())).await {
                Ok(response) if response.status == 200 => on_load(response.body),
                Ok(response) => {
                    tracing::debug!("Dropping GET {} response: status {}", url, response.status);
                }
                Err(reason) => {
                    tracing::debug!("Dropping GET {}: {}", url, reason);
                }
            }
        })
    }

    /// POST `payload` as JSON with a bearer token.
    ///
    /// Exactly one of the callbacks runs. Must be called from within a tokio
    /// runtime.
    pub fn post<P, S, E>(
        &self,
        url: &str,
        token: &str,
        payload: &P,
        on_success: S,
        on_error: E,
    ) -> JoinHandle<()>
    where
        P: Serialize + ?Sized,
        S: FnOnce(XhrResponse) + Send + 'static,
        E: FnOnce(ErrorEvent) + Send + 'static,
    {
        let body = serde_json::to_string(payload);
        let resolved = resolve_url(self.base_url.as_deref(), url);
        let authorization = format!("bearer {token}");
        let this = self.clone();

        tokio::spawn(async move {
            let request = match (resolved, body) {
                (Ok(url), Ok(body)) => HttpRequest::post(url, body)
                    .header("content-type", "application/json")
                    .header("authorization", authorization),
                (Err(e), _) => return on_error(ErrorEvent::new(e.to_string())),
                (_, Err(e)) => return on_error(ErrorEvent::new(e.to_string())),
            };

            match this.send(request).await {
                Ok(response) => on_success(XhrResponse::from(response)),
                Err(reason) => on_error(ErrorEvent::new(reason)),
            }
        })
    }

    /// Send through the transport and report the outcome on the host bus
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, String> {
        let method = request.method;
        let url = request.url.to_string();

        match self.transport.send(request).await {
            Ok(response) => {
                self.event_bus.publish(HostEvent::RequestFinished {
                    method,
                    url,
                    status: response.status,
                });
                Ok(response)
            }
            Err(e) => {
                let reason = e.to_string();
                self.event_bus.publish(HostEvent::RequestFailed {
                    method,
                    url,
                    reason: reason.clone(),
                });
                Err(reason)
            }
        }
    }
}

impl fmt::Debug for Xhr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Xhr")
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::{MemoryTransport, Method};
    use parking_lot::Mutex;
    use serde_json::json;

    fn xhr_with(transport: &Arc<MemoryTransport>) -> Xhr {
        Xhr::new(
            transport.clone(),
            Some("http://api.test/".to_string()),
            EventBus::new(),
        )
    }

    #[tokio::test]
    async fn test_get_200_invokes_once() {
        let transport = Arc::new(MemoryTransport::new());
        transport.respond("http://api.test/ok", 200, "ok");
        let calls = Arc::new(Mutex::new(Vec::new()));

        let sink = calls.clone();
        xhr_with(&transport)
            .get("ok", move |body| sink.lock().push(body))
            .await
            .unwrap();

        assert_eq!(*calls.lock(), vec!["ok".to_string()]);
    }

    #[tokio::test]
    async fn test_get_non_200_and_failures_are_dropped() {
        let transport = Arc::new(MemoryTransport::new());
        transport
            .respond("http://api.test/missing", 404, "nope")
            .respond("http://api.test/created", 201, "made")
            .fail("http://api.test/down", "refused");
        let xhr = Xhr::new(transport.clone(), None, EventBus::new());
        let calls = Arc::new(Mutex::new(0));

        for url in [
            "http://api.test/missing",
            "http://api.test/created",
            "http://api.test/down",
            "/relative-without-base",
        ] {
            let sink = calls.clone();
            xhr.get(url, move |_| *sink.lock() += 1).await.unwrap();
        }

        assert_eq!(*calls.lock(), 0);
        assert_eq!(transport.requests().len(), 3);
    }

    #[tokio::test]
    async fn test_post_sends_json_and_bearer_token() {
        let transport = Arc::new(MemoryTransport::new());
        transport.respond("http://api.test/items", 201, "{\"id\":7}");
        let seen = Arc::new(Mutex::new(None));
        let failed = Arc::new(Mutex::new(false));

        let (ok_sink, err_sink) = (seen.clone(), failed.clone());
        xhr_with(&transport)
            .post(
                "items",
                "s3cret",
                &json!({ "name": "x", "n": 1 }),
                move |response| *ok_sink.lock() = Some(response),
                move |_| *err_sink.lock() = true,
            )
            .await
            .unwrap();

        let response = seen.lock().clone().unwrap();
        assert_eq!(response.status, 201);
        assert_eq!(response.response_text, "{\"id\":7}");
        assert!(!*failed.lock());

        let request = &transport.requests()[0];
        assert_eq!(request.method, Method::Post);
        assert_eq!(request.header_value("content-type"), Some("application/json"));
        assert_eq!(request.header_value("authorization"), Some("bearer s3cret"));
        let body: serde_json::Value = serde_json::from_str(request.body.as_deref().unwrap()).unwrap();
        assert_eq!(body, json!({ "name": "x", "n": 1 }));
    }

    #[tokio::test]
    async fn test_post_exposes_response_headers() {
        let transport = Arc::new(MemoryTransport::new());
        transport.respond_with(
            "http://api.test/items",
            HttpResponse::new(201, "").with_header("Location", "/items/7"),
        );
        let location = Arc::new(Mutex::new(None));

        let sink = location.clone();
        xhr_with(&transport)
            .post(
                "items",
                "t",
                &json!({}),
                move |r| *sink.lock() = r.header("location").map(str::to_string),
                |e| panic!("unexpected error: {e}"),
            )
            .await
            .unwrap();

        assert_eq!(location.lock().as_deref(), Some("/items/7"));
    }

    #[tokio::test]
    async fn test_post_reports_http_errors_as_success() {
        let transport = Arc::new(MemoryTransport::new());
        transport.respond("http://api.test/items", 500, "boom");
        let status = Arc::new(Mutex::new(0));

        let sink = status.clone();
        xhr_with(&transport)
            .post(
                "items",
                "t",
                &json!([]),
                move |r| *sink.lock() = r.status,
                |e| panic!("unexpected error: {e}"),
            )
            .await
            .unwrap();

        assert_eq!(*status.lock(), 500);
    }

    #[tokio::test]
    async fn test_post_transport_failure_reports_error() {
        let transport = Arc::new(MemoryTransport::new());
        transport.fail("http://api.test/items", "connection reset");
        let bus = EventBus::new();
        let mut rx = bus.subscribe();
        let xhr = Xhr::new(transport.clone(), Some("http://api.test/".into()), bus);
        let error = Arc::new(Mutex::new(None));

        let sink = error.clone();
        xhr.post(
            "items",
            "t",
            &json!({}),
            |_| panic!("unexpected success"),
            move |e| *sink.lock() = Some(e),
        )
        .await
        .unwrap();

        let error = error.lock().clone().unwrap();
        assert!(error.message.contains("connection reset"));

        match rx.recv().await.unwrap() {
            HostEvent::RequestFailed { method, url, .. } => {
                assert_eq!(method, Method::Post);
                assert_eq!(url, "http://api.test/items");
            }
            other => panic!("Expected RequestFailed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_post_invalid_url_reports_error_without_sending() {
        let transport = Arc::new(MemoryTransport::new());
        let xhr = Xhr::new(transport.clone(), None, EventBus::new());
        let errored = Arc::new(Mutex::new(false));

        let sink = errored.clone();
        xhr.post("no-base", "t", &json!({}), |_| {}, move |_| *sink.lock() = true)
            .await
            .unwrap();

        assert!(*errored.lock());
        assert!(transport.requests().is_empty());
    }
}
