//! Route groups.
//!
//! A group contributes a path prefix, middleware and a name prefix to every
//! route declared inside it. Groups nest without limit; each level composes
//! onto its parent:
//!
//! - prefixes are joined as path segments, so `"api"`, `"/api"` and `"/api/"`
//!   all behave the same and `//` never appears;
//! - middleware is concatenated, outer group first;
//! - name prefixes are concatenated as plain strings, so `"admin."` followed
//!   by a route named `"dashboard"` gives `"admin.dashboard"`.
//!
//! ```rust
//! use waypoint::{Context, GroupOptions, Router};
//!
//! # async fn list(_: Context) -> &'static str { "" }
//! # fn main() -> Result<(), waypoint::Error> {
//! let mut app = Router::new();
//! app.group(GroupOptions::new("/api").name("api."), |api| {
//!     api.group("v1", |v1| {
//!         v1.get("/users", list)?.name("users.index")?;
//!         Ok(())
//!     })
//! })?;
//! assert_eq!(app.url_for("api.users.index", [("page", 2)])?, "/api/v1/users?page=2");
//! # Ok(())
//! # }
//! ```

use crate::error::Error;
use crate::handler::Handler;
use crate::method::Method;
use crate::middleware::{BoxedMiddleware, Middleware};
use crate::router::{RouteBuilder, Router};

// ── GroupOptions ──────────────────────────────────────────────────────────────

/// What a group adds to the routes inside it.
///
/// A bare string converts into options carrying only a prefix, which is
/// what `router.group("/admin", …)` relies on.
#[derive(Clone, Default)]
pub struct GroupOptions {
    prefix: String,
    middleware: Vec<BoxedMiddleware>,
    name: String,
}

impl GroupOptions {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into(), ..Self::default() }
    }

    /// Appends middleware that runs, in declaration order, for every route in
    /// the group.
    pub fn middleware(mut self, middleware: impl Middleware) -> Self {
        self.middleware.push(std::sync::Arc::new(middleware));
        self
    }

    /// Prefix for names given to routes in the group.
    pub fn name(mut self, prefix: impl Into<String>) -> Self {
        self.name = prefix.into();
        self
    }
}

impl From<&str> for GroupOptions {
    fn from(prefix: &str) -> Self { Self::new(prefix) }
}

impl From<String> for GroupOptions {
    fn from(prefix: String) -> Self { Self::new(prefix) }
}

// ── Scope ─────────────────────────────────────────────────────────────────────

/// The effective prefix, middleware and name prefix at one nesting level.
#[derive(Clone, Default)]
pub(crate) struct Scope {
    pub(crate) prefix: String,
    pub(crate) middleware: Vec<BoxedMiddleware>,
    pub(crate) name_prefix: String,
}

impl Scope {
    pub(crate) fn nest(&self, options: GroupOptions) -> Self {
        let mut middleware = self.middleware.clone();
        middleware.extend(options.middleware);
        Self {
            prefix: join_paths(&self.prefix, &options.prefix),
            middleware,
            name_prefix: format!("{}{}", self.name_prefix, options.name),
        }
    }
}

/// Joins two path fragments on segment boundaries. The result always starts
/// with `/`, never ends with one (except the root itself) and never contains
/// an empty segment.
pub(crate) fn join_paths(base: &str, path: &str) -> String {
    let segments: Vec<&str> = base
        .split('/')
        .chain(path.split('/'))
        .filter(|s| !s.is_empty())
        .collect();
    format!("/{}", segments.join("/"))
}

// ── Group ─────────────────────────────────────────────────────────────────────

/// Registration interface scoped to a group. Obtained from
/// [`Router::group`] or a parent group's [`Group::group`].
pub struct Group<'r> {
    router: &'r mut Router,
    scope: Scope,
}

impl<'r> Group<'r> {
    pub(crate) fn new(router: &'r mut Router, scope: Scope) -> Self {
        Self { router, scope }
    }

    pub fn get(&mut self, path: &str, handler: impl Handler) -> Result<RouteBuilder<'_>, Error> {
        self.on(Method::Get, path, handler)
    }

    pub fn post(&mut self, path: &str, handler: impl Handler) -> Result<RouteBuilder<'_>, Error> {
        self.on(Method::Post, path, handler)
    }

    pub fn put(&mut self, path: &str, handler: impl Handler) -> Result<RouteBuilder<'_>, Error> {
        self.on(Method::Put, path, handler)
    }

    pub fn delete(&mut self, path: &str, handler: impl Handler) -> Result<RouteBuilder<'_>, Error> {
        self.on(Method::Delete, path, handler)
    }

    pub fn patch(&mut self, path: &str, handler: impl Handler) -> Result<RouteBuilder<'_>, Error> {
        self.on(Method::Patch, path, handler)
    }

    pub fn on(
        &mut self,
        method: Method,
        path: &str,
        handler: impl Handler,
    ) -> Result<RouteBuilder<'_>, Error> {
        self.router.register(&self.scope, method, path, handler.into_boxed_handler())
    }

    /// Opens a nested group; see [`Router::group`].
    pub fn group<F>(&mut self, options: impl Into<GroupOptions>, f: F) -> Result<(), Error>
    where
        F: FnOnce(&mut Group<'_>) -> Result<(), Error>,
    {
        let scope = self.scope.nest(options.into());
        f(&mut Group::new(self.router, scope))
    }
}
