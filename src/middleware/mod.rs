//! Middleware layer.
//!
//! Middleware wraps the handler: it runs code before it, after it, or instead
//! of it. Each middleware receives the request [`Context`] and a [`Next`]
//! continuation. Calling [`Next::run`] hands the context to the rest of the
//! chain and resolves to whatever the rest of the chain produced, failures
//! included. Not calling it short-circuits: the handler and every later
//! middleware never run.
//!
//! ```rust,no_run
//! use waypoint::{Context, IntoReply, Next, Router, StatusCode};
//!
//! let mut app = Router::new();
//! app.use_middleware(|ctx: Context, next: Next| async move {
//!     if ctx.header("authorization").is_none() {
//!         return StatusCode::UNAUTHORIZED.into_reply();
//!     }
//!     next.run(ctx).await
//! });
//! ```
//!
//! For chain `[a, b]` and handler `h` the order of effects is always
//! `a-before, b-before, h, b-after, a-after`.
//!
//! Built-in middleware:
//! - [`trace`]: per-request span with method and path, plus status and latency

mod trace;

pub use trace::{Trace, trace};

use std::future::Future;
use std::sync::Arc;

use crate::chain::Chain;
use crate::context::Context;
use crate::handler::{BoxFuture, BoxedHandler, ErasedHandler, Outcome};
use crate::response::IntoReply;

/// A unit of cross-cutting logic around the handler.
///
/// Implemented for every closure or `async fn` of the shape
/// `Fn(Context, Next) -> impl Future<Output = impl IntoReply>`; implement it
/// by hand for middleware that carries configuration.
pub trait Middleware: Send + Sync + 'static {
    fn call(&self, ctx: Context, next: Next) -> BoxFuture<Outcome>;
}

/// Shared, type-erased middleware.
pub(crate) type BoxedMiddleware = Arc<dyn Middleware>;

impl<F, Fut, R> Middleware for F
where
    F: Fn(Context, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoReply + 'static,
{
    fn call(&self, ctx: Context, next: Next) -> BoxFuture<Outcome> {
        let fut = self(ctx, next);
        Box::pin(async move { fut.await.into_reply() })
    }
}

/// The rest of the chain, from one middleware's point of view.
///
/// `run` takes `self`, so a middleware can continue the chain at most once.
pub struct Next {
    chain: Chain,
    cursor: usize,
    handler: BoxedHandler,
}

impl Next {
    pub(crate) fn new(chain: Chain, handler: BoxedHandler) -> Self {
        Self { chain, cursor: 0, handler }
    }

    /// Runs the next middleware, or the handler once the chain is exhausted.
    pub async fn run(self, ctx: Context) -> Outcome {
        let Some(middleware) = self.chain.get(self.cursor).cloned() else {
            return self.handler.call(ctx).await;
        };
        let next = Self { cursor: self.cursor + 1, ..self };
        middleware.call(ctx, next).await
    }

    /// Middleware still to run after this point, not counting the handler.
    pub fn remaining(&self) -> usize {
        self.chain.len().saturating_sub(self.cursor)
    }
}
