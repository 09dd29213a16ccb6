//! Per-route memoisation of the middleware chain.
//!
//! A route's chain is the global middleware followed by the middleware the
//! route picked up from its groups and its own builder. Routes never change
//! their own middleware once traffic flows, so the only thing that can make a
//! cached chain stale is a later [`Router::use_middleware`], which bumps the
//! router's version. A cached chain is served only while its stamp equals the
//! current version.
//!
//! The cache slot is an [`ArcSwapOption`]: readers load version and chain as
//! one snapshot without taking a lock, and a stale reader simply rebuilds and
//! stores a fresh pair.
//!
//! [`Router::use_middleware`]: crate::Router::use_middleware

use std::sync::Arc;

use arc_swap::ArcSwapOption;

use crate::middleware::BoxedMiddleware;

/// An assembled, shareable middleware sequence.
pub(crate) type Chain = Arc<[BoxedMiddleware]>;

struct Stamped {
    version: u64,
    chain: Chain,
}

#[derive(Default)]
pub(crate) struct ChainCache {
    slot: ArcSwapOption<Stamped>,
}

impl ChainCache {
    /// Returns the cached chain when it was built at `version`, otherwise
    /// rebuilds it with `build` and caches the result.
    pub(crate) fn get_or_build(&self, version: u64, build: impl FnOnce() -> Chain) -> Chain {
        if let Some(stamped) = &*self.slot.load() {
            if stamped.version == version {
                return Arc::clone(&stamped.chain);
            }
        }
        let chain = build();
        self.slot.store(Some(Arc::new(Stamped { version, chain: Arc::clone(&chain) })));
        chain
    }

    pub(crate) fn invalidate(&self) {
        self.slot.store(None);
    }
}

/// Global middleware first, in registration order, then the route's own.
pub(crate) fn assemble(global: &[BoxedMiddleware], route: &[BoxedMiddleware]) -> Chain {
    global.iter().chain(route).cloned().collect()
}
