//! Inbound request value object.
//!
//! A [`Request`] is built once by the transport (or a test), routed by the
//! mount table, and then handed to the dispatcher. Nothing in the pipeline
//! can mutate it: components and hooks only ever see `&Request`.

use http::Method;
use serde_json::{Map, Value};
use smallvec::SmallVec;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::ids::RequestId;
use crate::response::HeaderVec;

/// Maximum inline parameters before heap allocation
pub const MAX_INLINE_PARAMS: usize = 8;

/// Query + form parameters. Keys are unique; later writes replace earlier ones.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// Path segments beyond the mount point.
pub type SegmentVec = SmallVec<[String; 4]>;

/// Caller-supplied cancellation flag.
///
/// Whoever holds a clone (an embedding transport, a deadline watcher, the
/// action itself) may flip it. The dispatcher checks it between pipeline
/// stages and abandons the request at the next boundary. The bundled
/// `may_minihttp` transport never cancels on its own.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Opaque per-request metadata.
#[derive(Debug, Clone, Default)]
pub struct RequestMeta {
    pub request_id: RequestId,
    /// Headers in arrival order, names as received
    pub headers: HeaderVec,
    pub cookies: HeaderVec,
    pub cancel: CancelToken,
    /// Free-form values attached by the transport (peer address, etc.)
    pub extensions: Map<String, Value>,
}

#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    path: String,
    mount: String,
    segments: SegmentVec,
    params: ParamVec,
    body: Option<Value>,
    meta: RequestMeta,
}

impl Request {
    pub fn builder(method: Method, path: impl Into<String>) -> RequestBuilder {
        RequestBuilder::new(method, path)
    }

    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Full request path without the query string.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Mount point the request was routed under (empty until routed).
    #[must_use]
    pub fn mount(&self) -> &str {
        &self.mount
    }

    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    #[must_use]
    pub fn first_segment(&self) -> Option<&str> {
        self.segments.first().map(String::as_str)
    }

    #[must_use]
    pub fn params(&self) -> &ParamVec {
        &self.params
    }

    #[inline]
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    #[must_use]
    pub fn meta(&self) -> &RequestMeta {
        &self.meta
    }

    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.meta.request_id
    }

    /// Header lookup, case-insensitive per RFC 7230.
    #[inline]
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.meta
            .headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.meta
            .cookies
            .iter()
            .find(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.meta.cancel.is_cancelled()
    }

    /// Attach routing results. Called by the mount table before dispatch;
    /// the request is treated as frozen from then on.
    #[must_use]
    pub fn routed(mut self, mount: &str, segments: SegmentVec) -> Self {
        self.mount = mount.to_string();
        self.segments = segments;
        self
    }
}

/// Split a path remainder into percent-decoded, non-empty segments.
#[must_use]
pub fn split_segments(remainder: &str) -> SegmentVec {
    remainder
        .split('/')
        .filter(|s| !s.is_empty())
        .map(|s| {
            urlencoding::decode(s)
                .map(|c| c.into_owned())
                .unwrap_or_else(|_| s.to_string())
        })
        .collect()
}

pub struct RequestBuilder {
    method: Method,
    path: String,
    mount: String,
    segments: SegmentVec,
    params: ParamVec,
    body: Option<Value>,
    meta: RequestMeta,
}

impl RequestBuilder {
    fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            mount: String::new(),
            segments: SegmentVec::new(),
            params: ParamVec::new(),
            body: None,
            meta: RequestMeta::default(),
        }
    }

    /// Pre-routed segments, for callers that bypass the mount table.
    #[must_use]
    pub fn segments<I, S>(mut self, segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.segments = segments.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn mount(mut self, mount: impl Into<String>) -> Self {
        self.mount = mount.into();
        self
    }

    #[must_use]
    pub fn param(mut self, name: &str, value: impl Into<String>) -> Self {
        let value = value.into();
        match self.params.iter_mut().find(|(k, _)| k.as_ref() == name) {
            Some(slot) => slot.1 = value,
            None => self.params.push((Arc::from(name), value)),
        }
        self
    }

    #[must_use]
    pub fn params<I, K, V>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        for (k, v) in params {
            self = self.param(k.as_ref(), v);
        }
        self
    }

    #[must_use]
    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.meta.headers.push((Arc::from(name), value.into()));
        self
    }

    #[must_use]
    pub fn cookie(mut self, name: &str, value: impl Into<String>) -> Self {
        self.meta.cookies.push((Arc::from(name), value.into()));
        self
    }

    #[must_use]
    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    #[must_use]
    pub fn request_id(mut self, id: RequestId) -> Self {
        self.meta.request_id = id;
        self
    }

    #[must_use]
    pub fn cancel_token(mut self, token: CancelToken) -> Self {
        self.meta.cancel = token;
        self
    }

    #[must_use]
    pub fn extension(mut self, key: &str, value: Value) -> Self {
        self.meta.extensions.insert(key.to_string(), value);
        self
    }

    #[must_use]
    pub fn build(self) -> Request {
        Request {
            method: self.method,
            path: self.path,
            mount: self.mount,
            segments: self.segments,
            params: self.params,
            body: self.body,
            meta: self.meta,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segments_are_decoded_and_empty_ones_dropped() {
        let segs = split_segments("/42//blue%20widget/");
        assert_eq!(segs.as_slice(), ["42", "blue widget"]);
    }

    #[test]
    fn duplicate_params_keep_last_value() {
        let req = Request::builder(Method::GET, "/w")
            .param("limit", "10")
            .param("limit", "20")
            .build();
        assert_eq!(req.params().len(), 1);
        assert_eq!(req.param("limit"), Some("20"));
    }

    #[test]
    fn header_lookup_ignores_case() {
        let req = Request::builder(Method::GET, "/w")
            .header("Authorization", "token")
            .build();
        assert_eq!(req.header("authorization"), Some("token"));
    }

    #[test]
    fn cancel_token_is_shared() {
        let token = CancelToken::new();
        let req = Request::builder(Method::GET, "/w")
            .cancel_token(token.clone())
            .build();
        assert!(!req.is_cancelled());
        token.cancel();
        assert!(req.is_cancelled());
    }
}
