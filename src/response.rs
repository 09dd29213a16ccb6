//! Outgoing HTTP response type, the [`Reply`] tagged variant and the
//! [`IntoReply`] conversion trait.
//!
//! Handlers and middleware may return many kinds of value. Each is turned
//! into exactly one [`Reply`] variant, and each variant has exactly one way of
//! becoming a [`Response`]. Adding a new kind of return value means adding an
//! `IntoReply` impl, never a runtime type test.

use bytes::Bytes;
use http::StatusCode;
use http::header::{HeaderName, HeaderValue};
use http_body_util::Full;
use serde::Serialize;
use tracing::warn;

use crate::error::BoxError;

// ── ContentType ───────────────────────────────────────────────────────────────

/// Common content-type values for use with [`ResponseBuilder::bytes`].
pub enum ContentType {
    Html,         // text/html; charset=utf-8
    Json,         // application/json
    OctetStream,  // application/octet-stream  (binary / file download)
    Text,         // text/plain; charset=utf-8
    Xml,          // application/xml
}

impl ContentType {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Html        => "text/html; charset=utf-8",
            Self::Json        => "application/json",
            Self::OctetStream => "application/octet-stream",
            Self::Text        => "text/plain; charset=utf-8",
            Self::Xml         => "application/xml",
        }
    }
}

// ── Response ─────────────────────────────────────────────────────────────────

/// An outgoing HTTP response.
///
/// # Shortcuts (200 OK, no custom headers needed)
///
/// ```rust
/// use waypoint::{Response, StatusCode};
///
/// Response::json(br#"{"id":1}"#.to_vec());
/// Response::text("hello");
/// Response::status(StatusCode::NO_CONTENT);
/// ```
///
/// # Builder (custom status or headers)
///
/// ```rust
/// use waypoint::{ContentType, Response, StatusCode};
///
/// Response::builder()
///     .status(StatusCode::CREATED)
///     .header("location", "/users/42")
///     .json(br#"{"id":42}"#.to_vec());
///
/// Response::builder().bytes(ContentType::Xml, b"<ok/>".to_vec());
/// ```
#[derive(Clone, Debug)]
pub struct Response {
    body: Vec<u8>,
    headers: Vec<(String, String)>,
    status: StatusCode,
}

impl Response {
    /// `200 OK` with `application/json`.
    pub fn json(body: Vec<u8>) -> Self {
        Self::bytes_raw("application/json", body)
    }

    /// `200 OK` with `text/plain; charset=utf-8`.
    pub fn text(body: impl Into<String>) -> Self {
        Self::bytes_raw("text/plain; charset=utf-8", body.into().into_bytes())
    }

    /// Response with no body.
    pub fn status(code: StatusCode) -> Self {
        Self { body: Vec::new(), headers: Vec::new(), status: code }
    }

    /// Builder for responses that need a custom status or extra headers.
    pub fn builder() -> ResponseBuilder {
        ResponseBuilder { headers: Vec::new(), status: StatusCode::OK }
    }

    pub fn status_code(&self) -> StatusCode { self.status }
    pub fn headers(&self) -> &[(String, String)] { &self.headers }
    pub fn body(&self) -> &[u8] { &self.body }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// The default error shape: `{"error": message}` as `application/json`.
    pub(crate) fn error(status: StatusCode, message: &str) -> Self {
        let body = serde_json::json!({ "error": message }).to_string().into_bytes();
        Self {
            body,
            headers: vec![("content-type".to_owned(), "application/json".to_owned())],
            status,
        }
    }

    /// Sets `name`, replacing any existing value regardless of case.
    pub(crate) fn set_header(&mut self, name: &str, value: String) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((name.to_owned(), value));
    }

    /// Drops the body but keeps status and headers, for `HEAD`. The length
    /// of the dropped body is kept as `content-length`.
    pub(crate) fn strip_body(&mut self) {
        if !self.body.is_empty() && self.header("content-length").is_none() {
            self.set_header("content-length", self.body.len().to_string());
        }
        self.body.clear();
    }

    fn bytes_raw(content_type: &str, body: Vec<u8>) -> Self {
        Self {
            body,
            headers: vec![("content-type".to_owned(), content_type.to_owned())],
            status: StatusCode::OK,
        }
    }

    /// Converts into the hyper-facing message. Headers that are not valid on
    /// the wire are dropped with a warning.
    pub(crate) fn into_inner(self) -> http::Response<Full<Bytes>> {
        let mut res = http::Response::new(Full::new(Bytes::from(self.body)));
        *res.status_mut() = self.status;
        for (name, value) in self.headers {
            match (HeaderName::from_bytes(name.as_bytes()), HeaderValue::from_str(&value)) {
                (Ok(name), Ok(value)) => {
                    res.headers_mut().append(name, value);
                }
                _ => warn!(header = %name, "dropping invalid response header"),
            }
        }
        res
    }
}

// ── ResponseBuilder ───────────────────────────────────────────────────────────

/// Fluent builder for [`Response`].
///
/// Obtain via [`Response::builder()`]. Defaults to `200 OK`.
/// Terminated by a typed body method.
pub struct ResponseBuilder {
    headers: Vec<(String, String)>,
    status: StatusCode,
}

impl ResponseBuilder {
    pub fn status(mut self, code: StatusCode) -> Self {
        self.status = code;
        self
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_owned(), value.to_owned()));
        self
    }

    /// Terminate with a JSON body (`application/json`).
    pub fn json(self, body: Vec<u8>) -> Response {
        self.finish("application/json", body)
    }

    /// Terminate with a plain-text body (`text/plain; charset=utf-8`).
    pub fn text(self, body: impl Into<String>) -> Response {
        self.finish("text/plain; charset=utf-8", body.into().into_bytes())
    }

    /// Terminate with a typed body. Use this for XML, HTML, binary, etc.
    pub fn bytes(self, content_type: ContentType, body: Vec<u8>) -> Response {
        self.finish(content_type.as_str(), body)
    }

    /// Terminate with no body (e.g. `204 No Content`, `301 Moved Permanently`).
    pub fn no_body(self) -> Response {
        Response { body: Vec::new(), headers: self.headers, status: self.status }
    }

    fn finish(self, content_type: &str, body: Vec<u8>) -> Response {
        let mut headers = vec![("content-type".to_owned(), content_type.to_owned())];
        headers.extend(self.headers);
        Response { body, headers, status: self.status }
    }
}

// ── Reply ─────────────────────────────────────────────────────────────────────

/// What a handler or middleware produced, before it becomes a [`Response`].
#[derive(Clone, Debug)]
pub enum Reply {
    /// A fully formed response, sent as is.
    Response(Response),
    /// Structured data, sent as `200 application/json`.
    Json(serde_json::Value),
    /// A number, sent as `200 application/json`.
    Number(serde_json::Number),
    /// Sent as `200 text/plain`.
    Text(String),
    /// Nothing to say: `204 No Content`.
    Empty,
}

impl Reply {
    pub fn into_response(self) -> Response {
        match self {
            Self::Response(response) => response,
            Self::Json(value) => Response::json(value.to_string().into_bytes()),
            Self::Number(number) => Response::json(number.to_string().into_bytes()),
            Self::Text(text) => Response::text(text),
            Self::Empty => Response::status(StatusCode::NO_CONTENT),
        }
    }

    /// The status [`into_response`](Reply::into_response) will carry.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Response(response) => response.status,
            Self::Json(_) | Self::Number(_) | Self::Text(_) => StatusCode::OK,
            Self::Empty => StatusCode::NO_CONTENT,
        }
    }
}

// ── IntoReply ─────────────────────────────────────────────────────────────────

/// Conversion of a handler or middleware return value into a [`Reply`], or
/// into the failure that sends the request down the error path.
///
/// Implement on your own types to return them directly from handlers.
pub trait IntoReply {
    fn into_reply(self) -> Result<Reply, BoxError>;
}

impl IntoReply for Reply {
    fn into_reply(self) -> Result<Reply, BoxError> { Ok(self) }
}

impl IntoReply for Response {
    fn into_reply(self) -> Result<Reply, BoxError> { Ok(Reply::Response(self)) }
}

/// Return a status directly from a handler: `return StatusCode::NOT_FOUND`
impl IntoReply for StatusCode {
    fn into_reply(self) -> Result<Reply, BoxError> { Ok(Reply::Response(Response::status(self))) }
}

impl IntoReply for &'static str {
    fn into_reply(self) -> Result<Reply, BoxError> { Ok(Reply::Text(self.to_owned())) }
}

impl IntoReply for String {
    fn into_reply(self) -> Result<Reply, BoxError> { Ok(Reply::Text(self)) }
}

impl IntoReply for () {
    fn into_reply(self) -> Result<Reply, BoxError> { Ok(Reply::Empty) }
}

/// `null` means no content; numbers keep their own tag.
impl IntoReply for serde_json::Value {
    fn into_reply(self) -> Result<Reply, BoxError> {
        Ok(match self {
            serde_json::Value::Null => Reply::Empty,
            serde_json::Value::Number(n) => Reply::Number(n),
            other => Reply::Json(other),
        })
    }
}

macro_rules! integer_reply {
    ($($t:ty),*) => {$(
        impl IntoReply for $t {
            fn into_reply(self) -> Result<Reply, BoxError> { Ok(Reply::Number(self.into())) }
        }
    )*};
}

integer_reply!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl IntoReply for f64 {
    fn into_reply(self) -> Result<Reply, BoxError> {
        serde_json::Number::from_f64(self)
            .map(Reply::Number)
            .ok_or_else(|| format!("{self} cannot be represented in JSON").into())
    }
}

impl<T: IntoReply> IntoReply for Option<T> {
    fn into_reply(self) -> Result<Reply, BoxError> {
        match self {
            Some(value) => value.into_reply(),
            None => Ok(Reply::Empty),
        }
    }
}

impl<T, E> IntoReply for Result<T, E>
where
    T: IntoReply,
    E: Into<BoxError>,
{
    fn into_reply(self) -> Result<Reply, BoxError> {
        self.map_err(Into::into)?.into_reply()
    }
}

/// Serialises any `serde` value as the JSON body.
///
/// ```rust,ignore
/// #[derive(Serialize)]
/// struct User { id: u64, name: String }
///
/// async fn get_user(_ctx: Context) -> Json<User> {
///     Json(User { id: 1, name: "alice".into() })
/// }
/// ```
#[derive(Clone, Debug)]
pub struct Json<T>(pub T);

impl<T: Serialize> IntoReply for Json<T> {
    fn into_reply(self) -> Result<Reply, BoxError> {
        serde_json::to_value(&self.0)?.into_reply()
    }
}
