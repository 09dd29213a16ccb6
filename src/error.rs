//! Unified error type.

/// A failure raised by a handler or middleware while a request runs.
///
/// Any error type converts into it with `?`, and so does a bare string:
/// `return Err("upstream unavailable".into())`.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The error type returned by waypoint's fallible operations.
///
/// Application-level outcomes (404, 405, a handler's own failure) are
/// expressed as HTTP [`Response`](crate::Response) values, not as `Error`s.
/// This type surfaces mistakes in route configuration, URL generation, and
/// infrastructure failures: binding to a port or accepting a connection.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    // ── Registration ─────────────────────────────────────────────────────────
    #[error("duplicate parameter `{name}` in route `{path}`")]
    DuplicateParameterName { path: String, name: String },

    #[error("route path `{path}` cannot be compiled: {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("route name `{0}` is already in use")]
    DuplicateRouteName(String),

    #[error("route `{path}` is already named `{name}`")]
    RouteAlreadyNamed { path: String, name: String },

    #[error("invalid constraint for parameter `{param}`: {reason}")]
    InvalidConstraintPattern { param: String, reason: String },

    // ── URL generation ───────────────────────────────────────────────────────
    #[error("no route named `{0}`")]
    RouteNotFound(String),

    #[error("route `{route}` requires parameter `{param}`")]
    MissingRequiredParameter { route: String, param: String },

    #[error("value for parameter `{0}` contains CR, LF or NUL")]
    InvalidParameterValue(String),

    // ── Infrastructure ───────────────────────────────────────────────────────
    #[error("invalid socket address `{addr}`")]
    InvalidAddress {
        addr: String,
        #[source]
        source: std::net::AddrParseError,
    },

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}
