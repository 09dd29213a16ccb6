//! Per-request tracing span.

use std::time::Instant;

use tracing::{Instrument, info, info_span, warn};

use super::{Middleware, Next};
use crate::context::Context;
use crate::handler::{BoxFuture, Outcome};

/// Wraps each request in a `request` span carrying method and path, and emits
/// one event when the chain below it finishes.
///
/// Register it first so the span covers every other middleware:
///
/// ```rust,no_run
/// use waypoint::{Router, middleware};
///
/// let mut app = Router::new();
/// app.use_middleware(middleware::trace());
/// ```
pub fn trace() -> Trace {
    Trace
}

/// See [`trace`].
#[derive(Clone, Copy, Debug, Default)]
pub struct Trace;

impl Middleware for Trace {
    fn call(&self, ctx: Context, next: Next) -> BoxFuture<Outcome> {
        let span = info_span!("request", method = %ctx.method(), path = %ctx.path());
        Box::pin(
            async move {
                let started = Instant::now();
                let outcome = next.run(ctx).await;
                let latency_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
                match &outcome {
                    Ok(reply) => info!(status = reply.status().as_u16(), latency_us, "request completed"),
                    Err(err) => warn!(error = %err, latency_us, "request failed"),
                }
                outcome
            }
            .instrument(span),
        )
    }
}
