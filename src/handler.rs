//! Handler trait and type erasure.
//!
//! # How async handlers are stored
//!
//! The route table holds handlers of *different* types in a single
//! `Vec<RouteEntry>`. Rust collections can only hold one concrete type, so we
//! use **trait objects** (`dyn ErasedHandler`) to hide the concrete handler
//! type behind a common interface and store everything uniformly.
//!
//! ```text
//! async fn show(ctx: Context) -> Json<User> { … }   ← user writes this
//!        ↓ router.get("/users/:id", show)
//! show.into_boxed_handler()                         ← Handler blanket impl
//!        ↓
//! Arc::new(FnHandler(show))                         ← heap-allocated wrapper
//!        ↓  stored as BoxedHandler = Arc<dyn ErasedHandler>
//! handler.call(ctx)  at request time                ← one vtable dispatch
//!        ↓
//! Box::pin(async { show(ctx).await.into_reply() })  ← BoxFuture<Outcome>
//! ```
//!
//! The 404, 405 and 500 collaborators are erased the same way, each with the
//! extra argument its path provides.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::context::Context;
use crate::error::BoxError;
use crate::method::Method;
use crate::response::{IntoReply, Reply};

// ── Internal types ────────────────────────────────────────────────────────────

/// A heap-allocated, type-erased future.
///
/// `Pin<Box<…>>` is required because the async runtime must be able to poll
/// the future in-place. `Send + 'static` let tokio move it across threads.
pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

/// What running a handler or a middleware chain yields: a reply, or a
/// failure on its way to the error path.
pub type Outcome = Result<Reply, BoxError>;

/// Internal dispatch interface.
///
/// `#[doc(hidden)] pub` rather than `pub(crate)` because it appears in the
/// return type of the public `Handler` trait's `into_boxed_handler` method.
#[doc(hidden)]
pub trait ErasedHandler {
    fn call(&self, ctx: Context) -> BoxFuture<Outcome>;
}

/// A type-erased handler shared across concurrent requests.
#[doc(hidden)]
pub type BoxedHandler = Arc<dyn ErasedHandler + Send + Sync + 'static>;

pub(crate) type MethodNotAllowedHandler =
    Arc<dyn Fn(Context, Vec<Method>) -> BoxFuture<Outcome> + Send + Sync + 'static>;

pub(crate) type ErrorHandler =
    Arc<dyn Fn(Context, BoxError) -> BoxFuture<Outcome> + Send + Sync + 'static>;

// ── Public Handler trait ──────────────────────────────────────────────────────

/// Implemented for every valid route handler.
///
/// You never implement this yourself. It is automatically satisfied for any
/// `async fn` (or closure returning a future) with the signature:
///
/// ```text
/// async fn name(ctx: Context) -> impl IntoReply
/// ```
///
/// The trait is **sealed** (via the private `Sealed` supertrait): only the
/// blanket impl below can satisfy it.
pub trait Handler: private::Sealed + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_handler(self) -> BoxedHandler;
}

mod private {
    pub trait Sealed {}
}

impl<F, Fut, R> private::Sealed for F
where
    F: Fn(Context) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoReply + 'static,
{
}

impl<F, Fut, R> Handler for F
where
    F: Fn(Context) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoReply + 'static,
{
    fn into_boxed_handler(self) -> BoxedHandler {
        Arc::new(FnHandler(self))
    }
}

// ── Concrete wrapper ──────────────────────────────────────────────────────────

/// Newtype wrapper that holds a concrete handler `F` and implements
/// [`ErasedHandler`], bridging the typed world to the trait-object world.
struct FnHandler<F>(F);

impl<F, Fut, R> ErasedHandler for FnHandler<F>
where
    F: Fn(Context) -> Fut + Send + Sync,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoReply + 'static,
{
    fn call(&self, ctx: Context) -> BoxFuture<Outcome> {
        let fut = (self.0)(ctx);
        Box::pin(async move { fut.await.into_reply() })
    }
}

// ── Error-path collaborators ──────────────────────────────────────────────────

pub(crate) fn method_not_allowed_handler<F, Fut, R>(f: F) -> MethodNotAllowedHandler
where
    F: Fn(Context, Vec<Method>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoReply + 'static,
{
    Arc::new(move |ctx: Context, allowed: Vec<Method>| -> BoxFuture<Outcome> {
        let fut = f(ctx, allowed);
        Box::pin(async move { fut.await.into_reply() })
    })
}

pub(crate) fn error_handler<F, Fut, R>(f: F) -> ErrorHandler
where
    F: Fn(Context, BoxError) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoReply + 'static,
{
    Arc::new(move |ctx: Context, err: BoxError| -> BoxFuture<Outcome> {
        let fut = f(ctx, err);
        Box::pin(async move { fut.await.into_reply() })
    })
}
