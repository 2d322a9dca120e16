//! Transports - the layer that actually moves bytes
//!
//! `ReqwestTransport` talks HTTP. `MemoryTransport` serves a route table and
//! records every request, for offline documents and tests.

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use thiserror::Error;
use url::Url;

use super::protocol::{HttpRequest, HttpResponse, Method};

#[derive(Error, Debug)]
pub enum NetError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Transport error: {0}")]
    Transport(String),
}

/// Result type for network operations
pub type Result<T> = std::result::Result<T, NetError>;

/// Sends one request and buffers the whole response.
///
/// Any HTTP status is a successful send; only failing to get a response at
/// all is an error.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse>;
}

/// HTTP transport backed by a shared `reqwest::Client`
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(user_agent: &str) -> Result<Self> {
        let client = reqwest::Client::builder().user_agent(user_agent).build()?;
        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
        };

        let mut builder = self.client.request(method, request.url.clone());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.to_string(), v.to_string()))
            })
            .collect();
        let body = response.text().await?;

        tracing::debug!("{} {} -> {}", request.method, request.url, status.as_u16());
        Ok(HttpResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or("").to_string(),
            headers,
            body,
        })
    }
}

#[derive(Debug, Clone)]
enum Route {
    Respond(HttpResponse),
    Fail(String),
}

/// In-memory transport. Unrouted URLs answer `404 Not Found`.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    routes: DashMap<String, Route>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer requests for `url` with `status` and `body`
    pub fn respond(&self, url: &str, status: u16, body: impl Into<String>) -> &Self {
        self.respond_with(url, HttpResponse::new(status, body))
    }

    pub fn respond_with(&self, url: &str, response: HttpResponse) -> &Self {
        self.routes.insert(route_key(url), Route::Respond(response));
        self
    }

    /// Fail requests for `url` before any response arrives
    pub fn fail(&self, url: &str, reason: impl Into<String>) -> &Self {
        self.routes.insert(route_key(url), Route::Fail(reason.into()));
        self
    }

    /// Requests seen so far, in arrival order
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().clone()
    }
}

fn route_key(url: &str) -> String {
    Url::parse(url)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| url.to_string())
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        self.requests.lock().push(request.clone());
        let route = self.routes.get(request.url.as_str()).map(|r| r.value().clone());
        match route {
            Some(Route::Respond(response)) => Ok(response),
            Some(Route::Fail(reason)) => Err(NetError::Transport(reason)),
            None => Ok(HttpResponse::new(404, "")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[tokio::test]
    async fn test_memory_transport_routes() {
        let transport = MemoryTransport::new();
        transport
            .respond("http://api.test/ok", 200, "ok")
            .fail("http://api.test/down", "connection refused");

        let ok = transport.send(HttpRequest::get(url("http://api.test/ok"))).await.unwrap();
        assert_eq!((ok.status, ok.body.as_str()), (200, "ok"));

        let missing = transport.send(HttpRequest::get(url("http://api.test/x"))).await.unwrap();
        assert_eq!(missing.status, 404);

        let down = transport.send(HttpRequest::get(url("http://api.test/down"))).await;
        assert!(matches!(down, Err(NetError::Transport(_))));

        assert_eq!(transport.requests().len(), 3);
    }

    #[tokio::test]
    async fn test_memory_transport_normalizes_route_urls() {
        let transport = MemoryTransport::new();
        transport.respond("http://api.test", 204, "");
        let response = transport.send(HttpRequest::get(url("http://api.test/"))).await.unwrap();
        assert_eq!(response.status, 204);
    }

    #[tokio::test]
    async fn test_reqwest_transport_connection_refused() {
        let client = reqwest::Client::builder().no_proxy().build().unwrap();
        let transport = ReqwestTransport::with_client(client);
        // Nothing listens on the loopback discard port
        let result = transport.send(HttpRequest::get(url("http://127.0.0.1:9/"))).await;
        assert!(matches!(result, Err(NetError::Http(_))));
    }
}
