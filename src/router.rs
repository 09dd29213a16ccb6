//! The route table and request dispatcher.
//!
//! Routes live in one `Vec` in registration order and every lookup scans it
//! front to back. The first route whose path pattern matches, whose method
//! matches and whose parameter rules all pass wins. Registration order is the
//! tie-break, which lets a specific route registered early shadow a general
//! one registered later. Lookup is O(routes): a deliberate trade of
//! sub-linear dispatch for predictable precedence, comfortably fast into the
//! hundreds of routes.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use http::StatusCode;
use serde::Serialize;
use tracing::{debug, error, warn};

use crate::chain::{self, Chain, ChainCache};
use crate::constraint::{self, Constraint, Constraints, Rule};
use crate::context::{Context, Params};
use crate::error::{BoxError, Error};
use crate::group::{Group, GroupOptions, Scope, join_paths};
use crate::handler::{
    self, BoxedHandler, ErasedHandler, ErrorHandler, Handler, MethodNotAllowedHandler, Outcome,
};
use crate::method::{Method, allow_header};
use crate::middleware::{BoxedMiddleware, Middleware, Next};
use crate::pattern::Pattern;
use crate::request::Request;
use crate::response::{IntoReply, Response};

// ── RouteEntry ────────────────────────────────────────────────────────────────

pub(crate) struct RouteEntry {
    method: Method,
    path: String,
    pattern: Pattern,
    handler: BoxedHandler,
    name: Option<String>,
    constraints: Constraints,
    middleware: Vec<BoxedMiddleware>,
    chain: ChainCache,
}

impl RouteEntry {
    /// Structural match plus parameter rules, ignoring the method.
    fn matches(&self, path: &str) -> Option<Params> {
        let params = self.pattern.captures(path)?;
        self.constraints.check(&params).then_some(params)
    }
}

// ── RouteBuilder ──────────────────────────────────────────────────────────────

/// Handle to the route just registered, for naming it and constraining its
/// parameters.
///
/// The builder points straight at its own route, so what it configures can
/// never be confused with another registration.
///
/// ```rust
/// # use waypoint::{Context, Router};
/// # async fn show(_: Context) -> &'static str { "" }
/// # fn main() -> Result<(), waypoint::Error> {
/// let mut app = Router::new();
/// app.get("/users/:id", show)?
///     .name("users.show")?
///     .where_number("id")?;
/// # Ok(())
/// # }
/// ```
pub struct RouteBuilder<'a> {
    entry: &'a mut RouteEntry,
    names: &'a mut HashMap<String, usize>,
    index: usize,
    name_prefix: String,
}

impl RouteBuilder<'_> {
    /// Names the route, after the enclosing groups' name prefixes. Names are
    /// unique across the router and a route is named at most once.
    pub fn name(self, name: &str) -> Result<Self, Error> {
        let full = format!("{}{name}", self.name_prefix);
        if let Some(existing) = &self.entry.name {
            return Err(Error::RouteAlreadyNamed {
                path: self.entry.path.clone(),
                name: existing.clone(),
            });
        }
        if self.names.contains_key(&full) {
            return Err(Error::DuplicateRouteName(full));
        }
        debug!(name = %full, path = %self.entry.path, "route named");
        self.names.insert(full.clone(), self.index);
        self.entry.name = Some(full);
        Ok(self)
    }

    /// Attaches a rule to `param`; the route only matches when the captured
    /// value satisfies it in full.
    pub fn constrain(self, param: &str, rule: impl Into<Rule>) -> Result<Self, Error> {
        let constraint = Constraint::compile(param, rule.into())?;
        if !self.entry.pattern.has_param(param) {
            warn!(param, path = %self.entry.path, "constraint on a parameter the route does not declare");
        }
        self.entry.constraints.insert(param, constraint);
        Ok(self)
    }

    /// [`constrain`](Self::constrain) for several parameters at once.
    pub fn constrain_all<I, K, R>(self, rules: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = (K, R)>,
        K: AsRef<str>,
        R: Into<Rule>,
    {
        rules
            .into_iter()
            .try_fold(self, |builder, (param, rule)| builder.constrain(param.as_ref(), rule))
    }

    /// Digits only.
    pub fn where_number(self, param: &str) -> Result<Self, Error> {
        self.constrain(param, constraint::NUMBER)
    }

    /// ASCII letters only.
    pub fn where_alpha(self, param: &str) -> Result<Self, Error> {
        self.constrain(param, constraint::ALPHA)
    }

    /// ASCII letters and digits only.
    pub fn where_alpha_numeric(self, param: &str) -> Result<Self, Error> {
        self.constrain(param, constraint::ALPHA_NUMERIC)
    }

    /// Canonical hyphenated UUID.
    pub fn where_uuid(self, param: &str) -> Result<Self, Error> {
        self.constrain(param, constraint::UUID)
    }

    /// Canonical 26-character ULID.
    pub fn where_ulid(self, param: &str) -> Result<Self, Error> {
        self.constrain(param, constraint::ULID)
    }

    /// One of a fixed set of values.
    pub fn where_in<I, S>(self, param: &str, values: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.constrain(param, Rule::one_of(values))
    }

    /// Route-level middleware, running after global and group middleware.
    pub fn middleware(self, middleware: impl Middleware) -> Self {
        self.entry.middleware.push(Arc::new(middleware));
        self.entry.chain.invalidate();
        self
    }
}

// ── Lookup results ────────────────────────────────────────────────────────────

/// A resolved route and the parameters it captured.
pub struct RouteMatch<'a> {
    entry: &'a RouteEntry,
    params: Params,
}

impl RouteMatch<'_> {
    pub fn method(&self) -> Method { self.entry.method }
    pub fn path(&self) -> &str { &self.entry.path }
    pub fn name(&self) -> Option<&str> { self.entry.name.as_deref() }
    pub fn params(&self) -> &Params { &self.params }
}

impl fmt::Debug for RouteMatch<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteMatch")
            .field("method", &self.entry.method)
            .field("path", &self.entry.path)
            .field("name", &self.entry.name)
            .field("params", &self.params)
            .finish()
    }
}

/// One row of [`Router::routes`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RouteInfo {
    pub name: Option<String>,
    pub method: Method,
    pub path: String,
}

// ── Router ────────────────────────────────────────────────────────────────────

/// The application router.
///
/// Build it once at startup, then pass it to [`Server::serve`](crate::Server::serve)
/// or call [`dispatch`](Router::dispatch) yourself. Registration takes
/// `&mut self`, so the route table can only change before it is shared.
pub struct Router {
    base_path: String,
    routes: Vec<RouteEntry>,
    names: HashMap<String, usize>,
    middleware: Vec<BoxedMiddleware>,
    version: u64,
    not_found: Option<BoxedHandler>,
    method_not_allowed: Option<MethodNotAllowedHandler>,
    on_error: Option<ErrorHandler>,
}

impl Router {
    pub fn new() -> Self {
        Self::with_base_path("")
    }

    /// A router that prefixes every route path with `base_path`.
    pub fn with_base_path(base_path: &str) -> Self {
        Self {
            base_path: base_path.to_owned(),
            routes: Vec::new(),
            names: HashMap::new(),
            middleware: Vec::new(),
            version: 0,
            not_found: None,
            method_not_allowed: None,
            on_error: None,
        }
    }

    // ── Registration ──────────────────────────────────────────────────────────

    /// Registers a handler for a method + path pair.
    ///
    /// Path parameters use `:name` syntax, `:name?` when the segment may be
    /// omitted; `ctx.param("name")` retrieves them:
    ///
    /// ```rust
    /// # use waypoint::{Context, Method, Router};
    /// # async fn archive(_: Context) -> &'static str { "" }
    /// # fn main() -> Result<(), waypoint::Error> {
    /// let mut app = Router::new();
    /// app.on(Method::Get, "/archive/:year?/:month?", archive)?;
    /// assert!(app.find_route(Method::Get, "/archive/2024").is_some());
    /// # Ok(())
    /// # }
    /// ```
    pub fn on(
        &mut self,
        method: Method,
        path: &str,
        handler: impl Handler,
    ) -> Result<RouteBuilder<'_>, Error> {
        self.register(&Scope::default(), method, path, handler.into_boxed_handler())
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

    /// Registers routes inside a group: `options` is a path prefix, or a
    /// [`GroupOptions`] that also carries middleware and a name prefix.
    pub fn group<F>(&mut self, options: impl Into<GroupOptions>, f: F) -> Result<(), Error>
    where
        F: FnOnce(&mut Group<'_>) -> Result<(), Error>,
    {
        let scope = Scope::default().nest(options.into());
        f(&mut Group::new(self, scope))
    }

    /// Appends global middleware. It runs before group and route middleware
    /// for every route, including routes registered earlier.
    pub fn use_middleware(&mut self, middleware: impl Middleware) -> &mut Self {
        self.middleware.push(Arc::new(middleware));
        self.version += 1;
        debug!(version = self.version, "global middleware added");
        self
    }

    pub(crate) fn register(
        &mut self,
        scope: &Scope,
        method: Method,
        path: &str,
        handler: BoxedHandler,
    ) -> Result<RouteBuilder<'_>, Error> {
        let full_path = join_paths(&join_paths(&self.base_path, &scope.prefix), path);
        let pattern = Pattern::compile(&full_path)?;
        debug!(%method, path = %full_path, params = ?pattern.param_names(), "route registered");

        let Self { routes, names, .. } = self;
        let index = routes.len();
        routes.push(RouteEntry {
            method,
            path: full_path,
            pattern,
            handler,
            name: None,
            constraints: Constraints::default(),
            middleware: scope.middleware.clone(),
            chain: ChainCache::default(),
        });
        Ok(RouteBuilder {
            entry: &mut routes[index],
            names,
            index,
            name_prefix: scope.name_prefix.clone(),
        })
    }

    // ── Error-path collaborators ──────────────────────────────────────────────

    /// Replaces the default `404` response.
    pub fn on_not_found(&mut self, handler: impl Handler) -> &mut Self {
        self.not_found = Some(handler.into_boxed_handler());
        self
    }

    /// Replaces the default `405` response. The handler receives the methods
    /// the path does accept; if its response has no `Allow` header one is
    /// added.
    pub fn on_method_not_allowed<F, Fut, R>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(Context, Vec<Method>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoReply + 'static,
    {
        self.method_not_allowed = Some(handler::method_not_allowed_handler(handler));
        self
    }

    /// Replaces the default `500` response for failures no middleware
    /// recovered from.
    pub fn on_error<F, Fut, R>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(Context, BoxError) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoReply + 'static,
    {
        self.on_error = Some(handler::error_handler(handler));
        self
    }

    // ── Lookup ────────────────────────────────────────────────────────────────

    /// The first registered route matching `method` and `path`, rules included.
    pub fn find_route(&self, method: Method, path: &str) -> Option<RouteMatch<'_>> {
        self.routes
            .iter()
            .filter(|entry| entry.method == method)
            .find_map(|entry| entry.matches(path).map(|params| RouteMatch { entry, params }))
    }

    /// Whether any route matches `path` under any method.
    pub fn has_matching_path(&self, path: &str) -> bool {
        self.routes.iter().any(|entry| entry.matches(path).is_some())
    }

    /// Distinct methods of every route matching `path`, sorted.
    pub fn allowed_methods(&self, path: &str) -> Vec<Method> {
        self.routes
            .iter()
            .filter(|entry| entry.matches(path).is_some())
            .map(|entry| entry.method)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Global middleware followed by the route's own, rebuilt only after
    /// global middleware changed.
    fn middleware_chain(&self, entry: &RouteEntry) -> Chain {
        entry.chain.get_or_build(self.version, || {
            chain::assemble(&self.middleware, &entry.middleware)
        })
    }

    // ── Named routes ──────────────────────────────────────────────────────────

    pub fn has_route(&self, name: &str) -> bool {
        self.names.contains_key(name)
    }

    /// Every route in registration order.
    pub fn routes(&self) -> Vec<RouteInfo> {
        self.routes
            .iter()
            .map(|entry| RouteInfo {
                name: entry.name.clone(),
                method: entry.method,
                path: entry.path.clone(),
            })
            .collect()
    }

    /// Builds the URL of a named route.
    ///
    /// Values for the route's parameters are percent-encoded into the path;
    /// an omitted optional parameter drops its segment. Everything else is
    /// appended as a query string in the order given.
    ///
    /// ```rust
    /// # use waypoint::{Context, Router};
    /// # async fn show(_: Context) -> &'static str { "" }
    /// # fn main() -> Result<(), waypoint::Error> {
    /// let mut app = Router::new();
    /// app.get("/users/:id/:tab?", show)?.name("users.show")?;
    /// assert_eq!(app.url_for("users.show", [("id", "42")])?, "/users/42");
    /// assert_eq!(
    ///     app.url_for("users.show", [("id", "42"), ("tab", "posts"), ("page", "2")])?,
    ///     "/users/42/posts?page=2",
    /// );
    /// # Ok(())
    /// # }
    /// ```
    pub fn url_for<I, K, V>(&self, name: &str, params: I) -> Result<String, Error>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: fmt::Display,
    {
        let entry = self
            .names
            .get(name)
            .and_then(|&index| self.routes.get(index))
            .ok_or_else(|| Error::RouteNotFound(name.to_owned()))?;

        let supplied: Vec<(String, String)> = params
            .into_iter()
            .map(|(key, value)| (key.as_ref().to_owned(), value.to_string()))
            .collect();
        if let Some((key, _)) = supplied.iter().find(|(k, v)| is_injection(k) || is_injection(v)) {
            return Err(Error::InvalidParameterValue(key.clone()));
        }

        let mut url = entry.pattern.expand(name, |param| {
            supplied.iter().find(|(k, _)| k == param).map(|(_, v)| v.as_str())
        })?;

        let mut leftovers = supplied
            .iter()
            .filter(|(key, _)| !entry.pattern.has_param(key))
            .peekable();
        if leftovers.peek().is_some() {
            let query = url::form_urlencoded::Serializer::new(String::new())
                .extend_pairs(leftovers)
                .finish();
            url.push('?');
            url.push_str(&query);
        }
        Ok(url)
    }

    // ── Dispatch ──────────────────────────────────────────────────────────────

    /// Routes one request and produces one response. Never fails: unmatched
    /// paths, wrong methods and handler failures all become responses.
    pub async fn dispatch(&self, request: Request) -> Response {
        let method = request.method();

        if method == Method::Options && self.find_route(Method::Options, request.path()).is_none() {
            let allowed = self.allowed_methods(request.path());
            if !allowed.is_empty() {
                return Response::builder()
                    .status(StatusCode::NO_CONTENT)
                    .header("allow", &allow_header(&allowed))
                    .no_body();
            }
        }

        let found = self.find_route(method, request.path()).or_else(|| match method {
            Method::Head => self.find_route(Method::Get, request.path()),
            _ => None,
        });
        let Some(RouteMatch { entry, params }) = found else {
            return self.unmatched(request).await;
        };
        debug!(%method, path = %request.path(), route = %entry.path, "route matched");

        let chain = self.middleware_chain(entry);
        // The pipeline consumes the context, so the error path gets a copy of
        // the request with fresh locals.
        let fallback = (request.clone(), params.clone());
        let outcome = Next::new(chain, Arc::clone(&entry.handler))
            .run(Context::new(request, params))
            .await;

        let mut response = match outcome {
            Ok(reply) => reply.into_response(),
            Err(err) => self.internal_error(Context::new(fallback.0, fallback.1), err).await,
        };
        if method == Method::Head {
            response.strip_body();
        }
        response
    }

    /// Answers a request whose method is outside [`Method`]: `405` with the
    /// path's `Allow` list, or `404` when nothing matches the path at all.
    pub(crate) fn reject_method(&self, path: &str) -> Response {
        let allowed = self.allowed_methods(path);
        if allowed.is_empty() {
            return Response::error(StatusCode::NOT_FOUND, "Not Found");
        }
        let mut response = Response::error(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed");
        response.set_header("allow", allow_header(&allowed));
        response
    }

    async fn unmatched(&self, request: Request) -> Response {
        let method = request.method();
        let path = request.path().to_owned();

        if !self.has_matching_path(&path) {
            warn!(%method, %path, "no route matches path");
            let Some(handler) = &self.not_found else {
                return Response::error(StatusCode::NOT_FOUND, "Not Found");
            };
            let outcome = handler.call(Context::new(request, Params::default())).await;
            return self.settle(outcome);
        }

        let allowed = self.allowed_methods(&path);
        warn!(%method, %path, allow = %allow_header(&allowed), "method not allowed");
        let mut response = match &self.method_not_allowed {
            Some(handler) => {
                let ctx = Context::new(request, Params::default());
                self.settle(handler(ctx, allowed.clone()).await)
            }
            None => Response::error(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed"),
        };
        if response.header("allow").is_none() {
            response.set_header("allow", allow_header(&allowed));
        }
        response
    }

    async fn internal_error(&self, ctx: Context, err: BoxError) -> Response {
        error!(method = %ctx.method(), path = %ctx.path(), error = %err, "request failed");
        match &self.on_error {
            Some(handler) => self.settle(handler(ctx, err).await),
            None => Response::error(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error"),
        }
    }

    /// Converts a collaborator's outcome; a collaborator that fails itself
    /// falls back to the default `500`.
    fn settle(&self, outcome: Outcome) -> Response {
        match outcome {
            Ok(reply) => reply.into_response(),
            Err(err) => {
                error!(error = %err, "error handler failed");
                Response::error(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
            }
        }
    }
}

impl Default for Router {
    fn default() -> Self { Self::new() }
}

/// CR, LF and NUL would let a generated URL split a header or response.
fn is_injection(value: &str) -> bool {
    value.contains(['\r', '\n', '\0'])
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn ok(_ctx: Context) -> &'static str { "ok" }

    fn path_of(router: &Router, method: Method, path: &str) -> Option<String> {
        router.find_route(method, path).map(|m| m.path().to_owned())
    }

    #[test]
    fn first_registered_match_wins() {
        let mut router = Router::new();
        router.get("/users/me", ok).unwrap().name("me").unwrap();
        router.get("/users/:id", ok).unwrap().name("show").unwrap();

        assert_eq!(router.find_route(Method::Get, "/users/me").unwrap().name(), Some("me"));
        assert_eq!(router.find_route(Method::Get, "/users/7").unwrap().name(), Some("show"));

        let mut reversed = Router::new();
        reversed.get("/users/:id", ok).unwrap().name("show").unwrap();
        reversed.get("/users/me", ok).unwrap().name("me").unwrap();
        assert_eq!(reversed.find_route(Method::Get, "/users/me").unwrap().name(), Some("show"));
    }

    #[test]
    fn failed_constraint_falls_through_to_next_candidate() {
        let mut router = Router::new();
        router.get("/items/:id", ok).unwrap().name("by_id").unwrap().where_number("id").unwrap();
        router.get("/items/:slug", ok).unwrap().name("by_slug").unwrap();

        let m = router.find_route(Method::Get, "/items/42").unwrap();
        assert_eq!(m.name(), Some("by_id"));
        assert_eq!(m.params().get("id"), Some("42"));

        let m = router.find_route(Method::Get, "/items/widget").unwrap();
        assert_eq!(m.name(), Some("by_slug"));
        assert_eq!(m.params().get("slug"), Some("widget"));
    }

    #[test]
    fn method_filters_candidates() {
        let mut router = Router::new();
        router.get("/users", ok).unwrap();
        router.post("/users", ok).unwrap();
        router.delete("/users/:id", ok).unwrap();

        assert!(router.find_route(Method::Put, "/users").is_none());
        assert!(router.has_matching_path("/users"));
        assert!(!router.has_matching_path("/missing"));
        assert_eq!(router.allowed_methods("/users"), vec![Method::Get, Method::Post]);
        assert_eq!(router.allowed_methods("/users/1"), vec![Method::Delete]);
        assert!(router.allowed_methods("/nope").is_empty());
    }

    #[test]
    fn allowed_methods_respect_constraints_and_dedupe() {
        let mut router = Router::new();
        router.get("/n/:id", ok).unwrap().where_number("id").unwrap();
        router.get("/n/:id", ok).unwrap();
        router.put("/n/:id", ok).unwrap().where_number("id").unwrap();

        assert_eq!(router.allowed_methods("/n/1"), vec![Method::Get, Method::Put]);
        assert_eq!(router.allowed_methods("/n/x"), vec![Method::Get]);
    }

    #[test]
    fn base_path_and_groups_compose() {
        let mut router = Router::with_base_path("/svc/");
        router.get("health", ok).unwrap();
        router
            .group("api", |api| {
                api.group("/v1/", |v1| {
                    v1.get("/x", ok)?;
                    Ok(())
                })
            })
            .unwrap();

        assert_eq!(path_of(&router, Method::Get, "/svc/health").as_deref(), Some("/svc/health"));
        assert_eq!(path_of(&router, Method::Get, "/svc/api/v1/x").as_deref(), Some("/svc/api/v1/x"));
    }

    #[test]
    fn names_are_prefixed_and_unique() {
        let mut router = Router::new();
        router
            .group(GroupOptions::new("/admin").name("admin."), |admin| {
                admin.get("/", ok)?.name("dashboard")?;
                Ok(())
            })
            .unwrap();
        assert!(router.has_route("admin.dashboard"));
        assert!(!router.has_route("dashboard"));

        let err = router.get("/other", ok).unwrap().name("admin.dashboard").err().unwrap();
        assert!(matches!(err, Error::DuplicateRouteName(ref n) if n == "admin.dashboard"));

        let err = router.get("/twice", ok).unwrap().name("a").unwrap().name("b").err().unwrap();
        assert!(matches!(err, Error::RouteAlreadyNamed { ref name, .. } if name == "a"));
    }

    #[test]
    fn registration_errors_surface_immediately() {
        let mut router = Router::new();
        let err = router.get("/a/:x/:x", ok).err().unwrap();
        assert!(matches!(err, Error::DuplicateParameterName { .. }));

        let err = router.get("/b/:x", ok).unwrap().constrain("x", "(").err().unwrap();
        assert!(matches!(err, Error::InvalidConstraintPattern { ref param, .. } if param == "x"));

        let err = router
            .get("/c/:kind", ok)
            .unwrap()
            .where_in("kind", Vec::<String>::new())
            .err()
            .unwrap();
        assert!(matches!(err, Error::InvalidConstraintPattern { .. }));
    }

    #[test]
    fn constrain_all_applies_every_rule() {
        let mut router = Router::new();
        router
            .get("/p/:a/:b", ok)
            .unwrap()
            .constrain_all([("a", constraint::NUMBER), ("b", constraint::ALPHA)])
            .unwrap();
        assert!(router.find_route(Method::Get, "/p/1/x").is_some());
        assert!(router.find_route(Method::Get, "/p/x/1").is_none());
    }

    #[test]
    fn precompiled_rule_keeps_builder_flags() {
        let mut router = Router::new();
        let re = regex::RegexBuilder::new("[a-z]+").case_insensitive(true).build().unwrap();
        router.get("/tags/:tag", ok).unwrap().constrain("tag", re).unwrap();

        let m = router.find_route(Method::Get, "/tags/ABC").unwrap();
        assert_eq!(m.params().get("tag"), Some("ABC"));
        assert!(router.find_route(Method::Get, "/tags/abc1").is_none());
    }

    #[test]
    fn optional_param_with_rule_may_be_omitted() {
        let mut router = Router::new();
        router.get("/archive/:year?", ok).unwrap().where_number("year").unwrap();
        assert!(router.find_route(Method::Get, "/archive").is_some());
        assert!(router.find_route(Method::Get, "/archive/2024").is_some());
        assert!(router.find_route(Method::Get, "/archive/soon").is_none());
    }

    #[test]
    fn routes_lists_registration_order() {
        let mut router = Router::new();
        router.get("/a", ok).unwrap().name("a").unwrap();
        router.post("/b", ok).unwrap();
        assert_eq!(
            router.routes(),
            vec![
                RouteInfo { name: Some("a".into()), method: Method::Get, path: "/a".into() },
                RouteInfo { name: None, method: Method::Post, path: "/b".into() },
            ]
        );
    }

    #[test]
    fn url_for_substitutes_and_appends_query() {
        let mut router = Router::new();
        router.get("/users/:id", ok).unwrap().name("users.show").unwrap();
        router.get("/archive/:year?/:month?", ok).unwrap().name("archive").unwrap();

        assert_eq!(router.url_for("users.show", [("id", 42)]).unwrap(), "/users/42");
        assert_eq!(
            router.url_for("users.show", [("id", "a b"), ("sort", "new&old")]).unwrap(),
            "/users/a%20b?sort=new%26old"
        );
        assert_eq!(router.url_for("archive", [("month", "06")]).unwrap(), "/archive/06");
        assert_eq!(router.url_for("archive", Vec::<(&str, &str)>::new()).unwrap(), "/archive");
    }

    #[test]
    fn url_for_round_trips_through_lookup() {
        let mut router = Router::new();
        router.get("/users/:id", ok).unwrap().name("users.show").unwrap();
        let url = router.url_for("users.show", [("id", 42)]).unwrap();
        let m = router.find_route(Method::Get, &url).unwrap();
        assert_eq!(m.name(), Some("users.show"));
        assert_eq!(m.params().get("id"), Some("42"));

        let url = router.url_for("users.show", [("id", "ä/ö")]).unwrap();
        assert_eq!(router.find_route(Method::Get, &url).unwrap().params().get("id"), Some("ä/ö"));
    }

    #[test]
    fn url_for_errors() {
        let mut router = Router::new();
        router.get("/users/:id", ok).unwrap().name("users.show").unwrap();

        let err = router.url_for("nope", [("id", 1)]).unwrap_err();
        assert!(matches!(err, Error::RouteNotFound(ref n) if n == "nope"));

        let err = router.url_for("users.show", [("page", 1)]).unwrap_err();
        assert!(matches!(err, Error::MissingRequiredParameter { ref param, .. } if param == "id"));

        for bad in ["a\r\nb", "a\nb", "a\0b"] {
            let err = router.url_for("users.show", [("id", bad)]).unwrap_err();
            assert!(matches!(err, Error::InvalidParameterValue(ref p) if p == "id"));
        }
        let err = router.url_for("users.show", [("id", "1"), ("q", "x\ry")]).unwrap_err();
        assert!(matches!(err, Error::InvalidParameterValue(ref p) if p == "q"));
    }

    #[test]
    fn reject_method_distinguishes_404_from_405() {
        let mut router = Router::new();
        router.get("/users", ok).unwrap();
        let res = router.reject_method("/users");
        assert_eq!(res.status_code(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(res.header("allow"), Some("GET"));
        assert_eq!(router.reject_method("/x").status_code(), StatusCode::NOT_FOUND);
    }
}
