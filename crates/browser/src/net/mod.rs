//! Network primitives
//!
//! Requests go through a `Transport` so the same XHR and fetch helpers run
//! against a real HTTP stack or an in-memory route table.

pub mod client;
pub mod fetch;
pub mod protocol;
pub mod xhr;

pub use client::{MemoryTransport, NetError, ReqwestTransport, Result, Transport};
pub use protocol::{HttpRequest, HttpResponse, Method};
pub use xhr::{ErrorEvent, Xhr, XhrResponse};

use url::Url;

/// Resolve a request URL against an optional base URL
pub fn resolve_url(base_url: Option<&str>, raw: &str) -> Result<Url> {
    let invalid = |e: url::ParseError| NetError::InvalidUrl(format!("{raw}: {e}"));
    match base_url {
        Some(base) => {
            let base = Url::parse(base)
                .map_err(|e| NetError::InvalidUrl(format!("base {base}: {e}")))?;
            base.join(raw).map_err(invalid)
        }
        None => Url::parse(raw).map_err(invalid),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_against_base() {
        let url = resolve_url(Some("http://example.com/app/"), "api/items?x=1").unwrap();
        assert_eq!(url.as_str(), "http://example.com/app/api/items?x=1");

        let url = resolve_url(Some("http://example.com/app/"), "/root").unwrap();
        assert_eq!(url.as_str(), "http://example.com/root");

        let url = resolve_url(Some("http://example.com/"), "https://other.org/a").unwrap();
        assert_eq!(url.as_str(), "https://other.org/a");
    }

    #[test]
    fn test_relative_without_base_is_invalid() {
        assert!(matches!(
            resolve_url(None, "/api/items"),
            Err(NetError::InvalidUrl(_))
        ));
        assert!(matches!(
            resolve_url(Some("not a base"), "x"),
            Err(NetError::InvalidUrl(_))
        ));
    }
}
