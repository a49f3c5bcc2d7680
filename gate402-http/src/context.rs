//! Request adaptation: how the engine reads an incoming HTTP request.
//!
//! Concrete framework bindings are out of scope for the engine; instead it
//! consumes the [`Adapter`] capability. A framework-neutral [`HttpAdapter`]
//! over `http` crate types is provided for embedders and tests.

use std::fmt;
use std::sync::Arc;

use http::{HeaderMap, Method, Uri};
use serde_json::{Value, json};

use crate::constants::PAYMENT_SIGNATURE_HEADER;
use crate::routes::normalize_path;

/// Read-only view over an incoming HTTP request.
///
/// Header lookup is case-insensitive. Implementations should be cheap to
/// call; the engine reads each field at most a handful of times per request.
pub trait Adapter: Send + Sync {
    /// Returns a header value by case-insensitive name, if present.
    fn header(&self, name: &str) -> Option<String>;

    /// Returns the request method (any casing).
    fn method(&self) -> String;

    /// Returns the request path, possibly with query/fragment attached.
    fn path(&self) -> String;

    /// Returns the full request URL.
    fn url(&self) -> String;

    /// Returns the `Accept` header, if present.
    fn accept(&self) -> Option<String> {
        self.header("accept")
    }

    /// Returns the `User-Agent` header, if present.
    fn user_agent(&self) -> Option<String> {
        self.header("user-agent")
    }

    /// Returns a query parameter by name, if the binding exposes them.
    fn query_param(&self, _name: &str) -> Option<String> {
        None
    }
}

/// Per-request context handed through the mediation pipeline.
///
/// Constructed fresh for every request and never retained afterwards. The
/// method and path are normalized once here so every downstream component
/// sees the same canonical values.
#[derive(Clone)]
pub struct RequestContext {
    adapter: Arc<dyn Adapter>,
    method: String,
    path: String,
    payment_header: Option<String>,
}

impl fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestContext")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("has_payment_header", &self.payment_header.is_some())
            .finish_non_exhaustive()
    }
}

impl RequestContext {
    /// Builds a context from an adapter, normalizing method and path and
    /// capturing the raw payment proof header.
    #[must_use]
    pub fn new(adapter: Arc<dyn Adapter>) -> Self {
        let method = adapter.method().to_uppercase();
        let path = normalize_path(&adapter.path());
        let payment_header = adapter.header(PAYMENT_SIGNATURE_HEADER);
        Self {
            adapter,
            method,
            path,
            payment_header,
        }
    }

    /// The normalized (uppercase) request method.
    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    /// The normalized request path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The raw payment proof header, if the client sent one.
    #[must_use]
    pub fn payment_header(&self) -> Option<&str> {
        self.payment_header.as_deref()
    }

    /// The underlying adapter.
    #[must_use]
    pub fn adapter(&self) -> &dyn Adapter {
        self.adapter.as_ref()
    }

    /// Serialized request metadata passed to extension enrichment.
    #[must_use]
    pub fn transport_context(&self) -> Value {
        json!({
            "method": self.method,
            "path": self.path,
            "url": self.adapter.url(),
        })
    }
}

/// Framework-neutral [`Adapter`] over `http` crate request parts.
#[derive(Debug, Clone)]
pub struct HttpAdapter {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
}

impl HttpAdapter {
    /// Creates an adapter from method, URI, and headers.
    #[must_use]
    pub fn new(method: Method, uri: Uri, headers: HeaderMap) -> Self {
        Self {
            method,
            uri,
            headers,
        }
    }
}

impl Adapter for HttpAdapter {
    fn header(&self, name: &str) -> Option<String> {
        self.headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned)
    }

    fn method(&self) -> String {
        self.method.as_str().to_owned()
    }

    fn path(&self) -> String {
        self.uri.path().to_owned()
    }

    fn url(&self) -> String {
        self.uri.to_string()
    }

    fn query_param(&self, name: &str) -> Option<String> {
        self.uri.query()?.split('&').find_map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            (key == name).then(|| {
                percent_encoding::percent_decode_str(value)
                    .decode_utf8_lossy()
                    .into_owned()
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::{ACCEPT, USER_AGENT};

    fn adapter(uri: &str) -> HttpAdapter {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, "text/html".parse().unwrap());
        headers.insert(USER_AGENT, "Mozilla/5.0".parse().unwrap());
        headers.insert("Payment-Signature", "abc123".parse().unwrap());
        HttpAdapter::new(Method::GET, uri.parse().unwrap(), headers)
    }

    #[test]
    fn context_normalizes_method_and_path() {
        let ctx = RequestContext::new(Arc::new(adapter("/API//data/?q=1")));
        assert_eq!(ctx.method(), "GET");
        assert_eq!(ctx.path(), "/API/data");
    }

    #[test]
    fn header_lookup_is_case_insensitive() {
        let ctx = RequestContext::new(Arc::new(adapter("/x")));
        assert_eq!(ctx.payment_header(), Some("abc123"));
        assert_eq!(ctx.adapter().header("ACCEPT").as_deref(), Some("text/html"));
    }

    #[test]
    fn query_params_are_decoded() {
        let a = adapter("/search?q=hello%20world&page=2");
        assert_eq!(a.query_param("q").as_deref(), Some("hello world"));
        assert_eq!(a.query_param("page").as_deref(), Some("2"));
        assert_eq!(a.query_param("missing"), None);
    }

    #[test]
    fn transport_context_carries_request_metadata() {
        let ctx = RequestContext::new(Arc::new(adapter("/api/data?q=1")));
        let tc = ctx.transport_context();
        assert_eq!(tc["method"], "GET");
        assert_eq!(tc["path"], "/api/data");
    }
}
