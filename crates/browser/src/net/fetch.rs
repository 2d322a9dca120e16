//! fetch style JSON GET
//!
//! Resolves to the parsed body or `None`. The status code is not inspected:
//! a `404` whose body happens to be JSON still resolves to that JSON.

use serde_json::Value;
use std::sync::Arc;

use super::client::{Result, Transport};
use super::protocol::HttpRequest;
use super::resolve_url;

/// GET `url` and parse the body as JSON, logging any failure
pub async fn fetch_get(
    transport: Arc<dyn Transport>,
    base_url: Option<String>,
    url: String,
) -> Option<Value> {
    match fetch_json(transport.as_ref(), base_url.as_deref(), &url).await {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::error!("fetch {} failed: {}", url, e);
            None
        }
    }
}

/// GET `url` and parse the body as JSON
pub async fn fetch_json(
    transport: &dyn Transport,
    base_url: Option<&str>,
    url: &str,
) -> Result<Value> {
    let url = resolve_url(base_url, url)?;
    let response = transport.send(HttpRequest::get(url)).await?;
    Ok(serde_json::from_str(&response.body)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::{MemoryTransport, NetError};
    use serde_json::json;

    fn transport() -> Arc<MemoryTransport> {
        let transport = Arc::new(MemoryTransport::new());
        transport
            .respond("http://api.test/data", 200, r#"{"items":[1,2]}"#)
            .respond("http://api.test/page", 200, "<html></html>")
            .respond("http://api.test/gone", 404, r#"{"error":"gone"}"#)
            .fail("http://api.test/down", "dns failure");
        transport
    }

    #[tokio::test]
    async fn test_fetch_json_body() {
        let value = fetch_get(transport(), None, "http://api.test/data".into()).await;
        assert_eq!(value, Some(json!({ "items": [1, 2] })));
    }

    #[tokio::test]
    async fn test_fetch_ignores_status() {
        let value = fetch_get(transport(), Some("http://api.test/".into()), "gone".into()).await;
        assert_eq!(value, Some(json!({ "error": "gone" })));
    }

    #[tokio::test]
    async fn test_fetch_failures_resolve_to_none() {
        let t = transport();
        assert_eq!(fetch_get(t.clone(), None, "http://api.test/page".into()).await, None);
        assert_eq!(fetch_get(t.clone(), None, "http://api.test/down".into()).await, None);
        assert_eq!(fetch_get(t.clone(), None, "relative".into()).await, None);
    }

    #[tokio::test]
    async fn test_fetch_json_errors() {
        let t = transport();
        let err = fetch_json(&*t, None, "http://api.test/page").await.unwrap_err();
        assert!(matches!(err, NetError::Json(_)));
        let err = fetch_json(&*t, None, "http://api.test/down").await.unwrap_err();
        assert!(matches!(err, NetError::Transport(_)));
    }

    #[test]
    fn test_fetch_json_outside_runtime() {
        let t = transport();
        let value = tokio_test::block_on(fetch_json(&*t, Some("http://api.test/"), "data"));
        let value = tokio_test::assert_ok!(value);
        assert_eq!(value["items"][1], 2);
    }
}
