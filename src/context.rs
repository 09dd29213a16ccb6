//! Per-request context handed through the middleware chain to the handler.
//!
//! A [`Context`] is built fresh for every request and moves by value from one
//! middleware to the next, so nothing in it can outlive or leak into another
//! request.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;

use crate::method::Method;
use crate::request::Request;

// ── Params ────────────────────────────────────────────────────────────────────

/// Path parameters captured by the matched route, in path order.
///
/// Every parameter the route declares has an entry; an optional parameter the
/// request omitted is present as a key but has no value.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Params {
    entries: Vec<(String, Option<String>)>,
}

impl Params {
    pub(crate) fn from_entries(entries: Vec<(String, Option<String>)>) -> Self {
        Self { entries }
    }

    /// The captured value, or `None` when the parameter is absent or unknown.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == name)
            .and_then(|(_, v)| v.as_deref())
    }

    /// Whether the route declares `name`, captured or not.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_deref()))
    }

    pub fn len(&self) -> usize { self.entries.len() }
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }
}

// ── Query ─────────────────────────────────────────────────────────────────────

/// Decoded query-string pairs. Keys may repeat.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Query {
    pairs: Vec<(String, String)>,
}

impl Query {
    pub(crate) fn parse(raw: Option<&str>) -> Self {
        let pairs = raw
            .map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
            .unwrap_or_default();
        Self { pairs }
    }

    /// First value for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    /// Every value for `key`, in order of appearance.
    pub fn get_all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.pairs.iter().filter(move |(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool { self.pairs.is_empty() }
}

// ── Locals ────────────────────────────────────────────────────────────────────

/// Scratch storage for passing values from middleware to handlers.
///
/// ```rust
/// # use waypoint::Locals;
/// let mut locals = Locals::default();
/// locals.insert("user_id", 42_u64);
/// assert_eq!(locals.get::<u64>("user_id"), Some(&42));
/// assert_eq!(locals.get::<String>("user_id"), None);
/// ```
#[derive(Default)]
pub struct Locals {
    values: HashMap<String, Box<dyn Any + Send + Sync>>,
}

impl Locals {
    /// Stores `value` under `key`, replacing whatever was there.
    pub fn insert<T: Any + Send + Sync>(&mut self, key: impl Into<String>, value: T) {
        self.values.insert(key.into(), Box::new(value));
    }

    /// The value under `key` if it exists and has type `T`.
    pub fn get<T: Any>(&self, key: &str) -> Option<&T> {
        self.values.get(key)?.downcast_ref()
    }

    pub fn get_mut<T: Any>(&mut self, key: &str) -> Option<&mut T> {
        self.values.get_mut(key)?.downcast_mut()
    }

    /// Removes and returns the value under `key`. A value of another type is
    /// left in place.
    pub fn remove<T: Any>(&mut self, key: &str) -> Option<T> {
        if !self.values.get(key)?.is::<T>() {
            return None;
        }
        let boxed = self.values.remove(key)?;
        boxed.downcast().ok().map(|v: Box<T>| *v)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }
}

impl fmt::Debug for Locals {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.values.keys()).finish()
    }
}

// ── Context ───────────────────────────────────────────────────────────────────

/// Everything a middleware or handler knows about the request in flight.
#[derive(Debug)]
pub struct Context {
    request: Request,
    params: Params,
    query: Query,
    locals: Locals,
}

impl Context {
    pub(crate) fn new(request: Request, params: Params) -> Self {
        let query = Query::parse(request.query_string());
        Self { request, params, query, locals: Locals::default() }
    }

    pub fn request(&self) -> &Request { &self.request }
    pub fn method(&self) -> Method { self.request.method() }
    pub fn path(&self) -> &str { self.request.path() }
    pub fn body(&self) -> &[u8] { self.request.body() }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.request.header(name)
    }

    /// Returns a named path parameter.
    ///
    /// For a route `/users/:id`, `ctx.param("id")` on `/users/42` returns `Some("42")`.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name)
    }

    pub fn params(&self) -> &Params { &self.params }
    pub fn query(&self) -> &Query { &self.query }
    pub fn locals(&self) -> &Locals { &self.locals }
    pub fn locals_mut(&mut self) -> &mut Locals { &mut self.locals }

    pub fn into_request(self) -> Request { self.request }
}
