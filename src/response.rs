//! Outbound response value object.
//!
//! A [`Response`] is produced either directly by an action or by the view
//! renderer. Headers keep insertion order; lookups are case-insensitive.

use serde_json::Value;
use smallvec::SmallVec;
use std::sync::Arc;

/// Maximum inline headers before heap allocation
pub const MAX_INLINE_HEADERS: usize = 16;

/// Ordered header storage.
///
/// Header names use `Arc<str>` because the same few names (`content-type`,
/// `access-control-*`) repeat on nearly every response.
pub type HeaderVec = SmallVec<[(Arc<str>, String); MAX_INLINE_HEADERS]>;

pub const CONTENT_TYPE_JSON: &str = "application/json";
pub const CONTENT_TYPE_HTML: &str = "text/html; charset=utf-8";
pub const CONTENT_TYPE_TEXT: &str = "text/plain; charset=utf-8";

/// Response payload.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Body {
    #[default]
    Empty,
    Bytes(Vec<u8>),
    Text(String),
    Json(Value),
}

impl Body {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Body::Empty => true,
            Body::Bytes(b) => b.is_empty(),
            Body::Text(s) => s.is_empty(),
            Body::Json(_) => false,
        }
    }

    /// Serialize the payload for the wire.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Body::Empty => Vec::new(),
            Body::Bytes(b) => b.clone(),
            Body::Text(s) => s.as_bytes().to_vec(),
            Body::Json(v) => serde_json::to_vec(v).unwrap_or_default(),
        }
    }

    /// Lossy UTF-8 view of the payload, mostly for layouts and tests.
    #[must_use]
    pub fn to_text(&self) -> String {
        match self {
            Body::Text(s) => s.clone(),
            other => String::from_utf8_lossy(&other.to_bytes()).into_owned(),
        }
    }
}

/// HTTP status, ordered headers and a body.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: u16,
    pub headers: HeaderVec,
    pub body: Body,
}

impl Default for Response {
    fn default() -> Self {
        Self::new(200)
    }
}

impl Response {
    #[must_use]
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: HeaderVec::new(),
            body: Body::Empty,
        }
    }

    #[must_use]
    pub fn with_body(status: u16, content_type: &str, body: Body) -> Self {
        let mut headers = HeaderVec::new();
        headers.push((Arc::from("content-type"), content_type.to_string()));
        Self {
            status,
            headers,
            body,
        }
    }

    #[must_use]
    pub fn json(status: u16, body: Value) -> Self {
        Self::with_body(status, CONTENT_TYPE_JSON, Body::Json(body))
    }

    #[must_use]
    pub fn html(status: u16, body: impl Into<String>) -> Self {
        Self::with_body(status, CONTENT_TYPE_HTML, Body::Text(body.into()))
    }

    #[must_use]
    pub fn text(status: u16, body: impl Into<String>) -> Self {
        Self::with_body(status, CONTENT_TYPE_TEXT, Body::Text(body.into()))
    }

    #[must_use]
    pub fn bytes(status: u16, content_type: &str, body: Vec<u8>) -> Self {
        Self::with_body(status, content_type, Body::Bytes(body))
    }

    /// JSON `{"error": message}` with the given status.
    #[must_use]
    pub fn error(status: u16, message: &str) -> Self {
        Self::json(status, serde_json::json!({ "error": message }))
    }

    #[must_use]
    pub fn not_found(message: &str) -> Self {
        Self::error(404, message)
    }

    /// Builder-style header setter.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_header(name, value.into());
        self
    }

    #[inline]
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Add or replace a header. A replaced header keeps its original position.
    pub fn set_header(&mut self, name: &str, value: String) {
        if let Some(slot) = self
            .headers
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
        {
            slot.1 = value;
            return;
        }
        self.headers.push((Arc::from(name), value));
    }

    pub fn remove_header(&mut self, name: &str) -> Option<String> {
        let idx = self
            .headers
            .iter()
            .position(|(k, _)| k.eq_ignore_ascii_case(name))?;
        Some(self.headers.remove(idx).1)
    }

    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.get_header("content-type")
    }

    #[must_use]
    pub fn json_body(&self) -> Option<&Value> {
        match &self.body {
            Body::Json(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}
