//! Response helpers module
//!
//! A `Response` starts `Unsent` with a pending status of 200. `status()` only records
//! the code; `send()`, `json()` and `end()` finalize it exactly once.

use crate::error::RouterError;
use crate::logger;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::StatusCode;
use serde::Serialize;

pub const TEXT_PLAIN: &str = "text/plain";
pub const APPLICATION_JSON: &str = "application/json";

/// Value handed to `Response::send`
///
/// The variant decides the content type.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    /// No body, no content type
    Empty,
    /// `text/plain`, written verbatim
    Text(String),
    /// `application/json`
    Json(serde_json::Value),
}

impl From<&str> for Body {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Body {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&String> for Body {
    fn from(value: &String) -> Self {
        Self::Text(value.clone())
    }
}

/// JSON strings are sent as text; every other JSON value is serialized
impl From<serde_json::Value> for Body {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::String(s) => Self::Text(s),
            other => Self::Json(other),
        }
    }
}

impl From<()> for Body {
    fn from((): ()) -> Self {
        Self::Empty
    }
}

#[derive(Debug)]
enum State {
    Unsent,
    Sent {
        /// Status written with the body
        status: u16,
        content_type: Option<&'static str>,
        body: Bytes,
    },
}

/// Outgoing response for one request/response cycle
#[derive(Debug)]
pub struct Response {
    /// Pending status code
    status: u16,
    headers: Vec<(String, String)>,
    state: State,
}

impl Default for Response {
    fn default() -> Self {
        Self::new()
    }
}

impl Response {
    pub const fn new() -> Self {
        Self {
            status: 200,
            headers: Vec::new(),
            state: State::Unsent,
        }
    }

    /// Record the status used when the response is finalized.
    /// Ignored once the response is sent.
    pub fn status(&mut self, code: u16) -> &mut Self {
        if self.is_sent() {
            logger::log_warning(&format!(
                "status({code}) ignored: response already sent with {}",
                self.status_code()
            ));
        } else {
            self.status = code;
        }
        self
    }

    /// Add a response header, written on finalization.
    /// A `Content-Type` set here wins over the one `send`/`json` would pick.
    /// Ignored once the response is sent.
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        let name = name.into();
        if self.is_sent() {
            logger::log_warning(&format!(
                "set_header({name}) ignored: response already sent"
            ));
        } else {
            self.headers.push((name, value.into()));
        }
        self
    }

    /// Finalize with a text, JSON or empty body depending on the `Body` variant
    pub fn send(&mut self, value: impl Into<Body>) -> Result<(), RouterError> {
        match value.into() {
            Body::Empty => self.finalize(None, Bytes::new()),
            Body::Text(text) => self.finalize(Some(TEXT_PLAIN), Bytes::from(text)),
            Body::Json(json) => {
                let bytes = serde_json::to_vec(&json)?;
                self.finalize(Some(APPLICATION_JSON), Bytes::from(bytes))
            }
        }
    }

    /// Finalize with `value` serialized as JSON, whatever its type
    pub fn json<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), RouterError> {
        if self.is_sent() {
            return Err(RouterError::AlreadySent);
        }
        let bytes = serde_json::to_vec(value)?;
        self.finalize(Some(APPLICATION_JSON), Bytes::from(bytes))
    }

    /// Finalize with `body` written verbatim and no content type
    pub fn end(&mut self, body: impl Into<Bytes>) -> Result<(), RouterError> {
        self.finalize(None, body.into())
    }

    fn finalize(
        &mut self,
        content_type: Option<&'static str>,
        body: Bytes,
    ) -> Result<(), RouterError> {
        if self.is_sent() {
            return Err(RouterError::AlreadySent);
        }
        if StatusCode::from_u16(self.status).is_err() {
            return Err(RouterError::InvalidStatus(self.status));
        }
        self.state = State::Sent {
            status: self.status,
            content_type,
            body,
        };
        Ok(())
    }

    pub const fn is_sent(&self) -> bool {
        matches!(self.state, State::Sent { .. })
    }

    /// Status that was sent, or the pending status while unsent
    pub const fn status_code(&self) -> u16 {
        match self.state {
            State::Sent { status, .. } => status,
            State::Unsent => self.status,
        }
    }

    pub const fn content_type(&self) -> Option<&'static str> {
        match self.state {
            State::Sent { content_type, .. } => content_type,
            State::Unsent => None,
        }
    }

    /// Body bytes, once sent
    pub const fn body(&self) -> Option<&Bytes> {
        match &self.state {
            State::Sent { body, .. } => Some(body),
            State::Unsent => None,
        }
    }

    /// Body decoded as UTF-8 (empty when unsent or not UTF-8)
    pub fn body_text(&self) -> &str {
        self.body()
            .and_then(|b| std::str::from_utf8(b).ok())
            .unwrap_or_default()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .rev()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Convert into a hyper response. An unsent response goes out with its
    /// pending status and an empty body.
    pub fn into_hyper(self) -> hyper::Response<Full<Bytes>> {
        let (status, content_type, body) = match self.state {
            State::Sent {
                status,
                content_type,
                body,
            } => (status, content_type, body),
            State::Unsent => (self.status, None, Bytes::new()),
        };
        let user_content_type = self
            .headers
            .iter()
            .any(|(n, _)| n.eq_ignore_ascii_case("content-type"));

        let mut builder = hyper::Response::builder().status(status);
        for (name, value) in &self.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let (Some(ct), false) = (content_type, user_content_type) {
            builder = builder.header("Content-Type", ct);
        }

        builder.body(Full::new(body)).unwrap_or_else(|e| {
            log_build_error(status, &e);
            build_plain_response(500, "500 Internal Server Error")
        })
    }
}

/// Build a `text/plain` response outside of dispatch
pub fn build_plain_response(status: u16, text: &'static str) -> hyper::Response<Full<Bytes>> {
    hyper::Response::builder()
        .status(status)
        .header("Content-Type", TEXT_PLAIN)
        .body(Full::new(Bytes::from_static(text.as_bytes())))
        .unwrap_or_else(|e| {
            log_build_error(status, &e);
            hyper::Response::new(Full::new(Bytes::from_static(text.as_bytes())))
        })
}

/// Build 413 Payload Too Large response
pub fn build_413_response() -> hyper::Response<Full<Bytes>> {
    build_plain_response(413, "413 Payload Too Large")
}

/// Build 400 Bad Request response
pub fn build_400_response() -> hyper::Response<Full<Bytes>> {
    build_plain_response(400, "400 Bad Request")
}

/// Log response build error
fn log_build_error(status: u16, error: &hyper::http::Error) {
    logger::log_error(&format!("Failed to build {status} response: {error}"));
}
