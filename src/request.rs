//! Incoming HTTP request type.

use bytes::Bytes;
use http::HeaderMap;
use http::header::{HeaderValue, IntoHeaderName};

use crate::method::{Method, UnsupportedMethod};

/// An incoming HTTP request with its body already buffered.
///
/// The server builds one from the hyper request; tests and embedders build
/// one directly:
///
/// ```rust
/// use waypoint::{Method, Request};
///
/// let req = Request::new(Method::Post, "/users?notify=1").with_body("{}");
/// assert_eq!(req.path(), "/users");
/// assert_eq!(req.query_string(), Some("notify=1"));
/// ```
#[derive(Clone, Debug)]
pub struct Request {
    method: Method,
    path: String,
    query: Option<String>,
    headers: HeaderMap,
    body: Bytes,
}

impl Request {
    /// `uri` is a path with an optional `?query` suffix.
    pub fn new(method: Method, uri: &str) -> Self {
        let (path, query) = match uri.split_once('?') {
            Some((path, query)) => (path, Some(query.to_owned())),
            None => (uri, None),
        };
        Self {
            method,
            path: path.to_owned(),
            query,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    pub fn with_header(mut self, name: impl IntoHeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn method(&self) -> Method { self.method }
    pub fn path(&self) -> &str { &self.path }
    pub fn query_string(&self) -> Option<&str> { self.query.as_deref() }
    pub fn headers(&self) -> &HeaderMap { &self.headers }
    pub fn body(&self) -> &[u8] { &self.body }

    /// Case-insensitive header lookup. Values that are not visible ASCII are
    /// skipped.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

impl TryFrom<http::Request<Bytes>> for Request {
    type Error = UnsupportedMethod;

    fn try_from(req: http::Request<Bytes>) -> Result<Self, Self::Error> {
        let (parts, body) = req.into_parts();
        Ok(Self {
            method: Method::try_from(&parts.method)?,
            path: parts.uri.path().to_owned(),
            query: parts.uri.query().map(str::to_owned),
            headers: parts.headers,
            body,
        })
    }
}
