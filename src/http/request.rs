//! Request augmentation module
//!
//! Splits the raw request target into `pathname` and decoded `query` pairs once,
//! before dispatch, and exposes them to handlers alongside headers and body.

use hyper::body::Bytes;
use hyper::header::{HeaderMap, HeaderName, HeaderValue};
use hyper::http::request::Parts;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;

/// Incoming request as seen by handlers
#[derive(Debug, Clone)]
pub struct Request {
    /// Method as received on the wire (e.g. `GET`)
    method: String,
    /// Original request target, query string included
    url: String,
    /// Path component only
    pathname: String,
    query: BTreeMap<String, String>,
    headers: HeaderMap,
    body: Bytes,
}

impl Request {
    /// Build a request from a method and a raw target such as `/q?a=1`
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        let url = url.into();
        let (pathname, query) = parse_target(&url);
        Self {
            method: method.into(),
            url,
            pathname,
            query,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    /// Build a request from a hyper request head and its collected body
    pub fn from_parts(parts: &Parts, body: Bytes) -> Self {
        let target = parts
            .uri
            .path_and_query()
            .map_or("/", hyper::http::uri::PathAndQuery::as_str);
        let (pathname, query) = parse_target(target);
        Self {
            method: parts.method.as_str().to_string(),
            url: parts.uri.to_string(),
            pathname,
            query,
            headers: parts.headers.clone(),
            body,
        }
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Add a header; invalid names or values are ignored
    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            self.headers.append(name, value);
        }
        self
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn pathname(&self) -> &str {
        &self.pathname
    }

    /// All query parameters; absent keys are simply not present
    pub const fn query(&self) -> &BTreeMap<String, String> {
        &self.query
    }

    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }

    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub const fn body(&self) -> &Bytes {
        &self.body
    }

    /// Body decoded as UTF-8
    pub fn body_text(&self) -> Result<&str, std::str::Utf8Error> {
        std::str::from_utf8(&self.body)
    }

    /// Body deserialized from JSON
    pub fn body_json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

/// Split a request target into its path and decoded query pairs.
///
/// Any fragment is dropped. Duplicate keys keep the last value.
pub fn parse_target(target: &str) -> (String, BTreeMap<String, String>) {
    let target = target.split_once('#').map_or(target, |(before, _)| before);
    let (path, query) = match target.split_once('?') {
        Some((path, query)) => (path, query),
        None => (target, ""),
    };

    let pairs = url::form_urlencoded::parse(query.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    (path.to_string(), pairs)
}
