//! # waypoint
//!
//! An HTTP routing engine with a composable middleware pipeline.
//!
//! - Parameterised paths: `/users/:id`, optional segments `/archive/:year?`
//! - Per-parameter rules: digits, UUIDs, ULIDs, fixed value sets, any regex
//! - Route groups that share a prefix, middleware and a name prefix
//! - Named routes with reverse URL generation
//! - Onion-model middleware: global, then group, then route
//! - Automatic `405` with `Allow`, `OPTIONS` and `HEAD`
//!
//! Routes are matched by scanning in registration order; the first route
//! whose path, method and parameter rules all match wins.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use waypoint::{Context, GroupOptions, Json, Router, Server, StatusCode, middleware};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), waypoint::Error> {
//!     let mut app = Router::new();
//!     app.use_middleware(middleware::trace());
//!
//!     app.get("/", |_ctx: Context| async { "hello" })?.name("home")?;
//!
//!     app.group(GroupOptions::new("/users").name("users."), |users| {
//!         users.get("/", list_users)?.name("index")?;
//!         users.get("/:id", show_user)?.name("show")?.where_number("id")?;
//!         users.post("/", |_ctx: Context| async { StatusCode::CREATED })?;
//!         Ok(())
//!     })?;
//!
//!     assert_eq!(app.url_for("users.show", [("id", 7)])?, "/users/7");
//!
//!     Server::bind("0.0.0.0:3000")?.serve(app).await
//! }
//!
//! async fn list_users(ctx: Context) -> Json<Vec<String>> {
//!     let page = ctx.query().get("page").unwrap_or("1");
//!     Json(vec![format!("page {page}")])
//! }
//!
//! async fn show_user(ctx: Context) -> Result<String, waypoint::BoxError> {
//!     let id: u64 = ctx.param("id").unwrap_or_default().parse()?;
//!     Ok(format!("user {id}"))
//! }
//! ```

mod chain;
mod constraint;
mod context;
mod error;
mod group;
mod handler;
mod method;
mod pattern;
mod request;
mod response;
mod router;
mod server;

pub mod middleware;

pub use constraint::Rule;
pub use context::{Context, Locals, Params, Query};
pub use error::{BoxError, Error};
pub use group::{Group, GroupOptions};
pub use handler::{BoxFuture, Handler, Outcome};
pub use http::StatusCode;
pub use method::{Method, UnsupportedMethod};
pub use middleware::{Middleware, Next};
pub use request::Request;
pub use response::{ContentType, IntoReply, Json, Reply, Response, ResponseBuilder};
pub use router::{RouteBuilder, RouteInfo, RouteMatch, Router};
pub use server::Server;
