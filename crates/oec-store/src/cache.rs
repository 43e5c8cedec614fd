//! The cache tier: a TTL-bounded, in-memory map keyed by `session:{id}`
//! (spec §6.4). Built on `moka`, which already gives lock-free concurrent
//! reads and per-entry TTL without this crate hand-rolling eviction.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use oec_protocol::{SessionContext, SessionId};

/// Default TTL window per spec §4.1 ("default 24 hours").
pub const DEFAULT_TTL_SECONDS: u64 = 24 * 60 * 60;

#[derive(Clone)]
pub struct SessionCache {
    inner: Cache<SessionId, Arc<SessionContext>>,
}

impl SessionCache {
    pub fn new(ttl: Duration) -> Self {
        let inner = Cache::builder().time_to_live(ttl).build();
        Self { inner }
    }

    pub async fn get(&self, id: SessionId) -> Option<Arc<SessionContext>> {
        self.inner.get(&id).await
    }

    /// Insert or refresh an entry, resetting its TTL (spec §4.1: "on durable
    /// hit, repopulates cache with refreshed TTL").
    pub async fn put(&self, ctx: Arc<SessionContext>) {
        self.inner.insert(ctx.session_id, ctx).await;
    }

    pub async fn invalidate(&self, id: SessionId) {
        self.inner.invalidate(&id).await;
    }

    /// Expire an entry immediately without touching the durable tier — used
    /// by tests to exercise the "cache loss mid-session" scenario (spec §8
    /// scenario 5) and by operational tooling that wants to force a rewarm.
    pub async fn evict(&self, id: SessionId) {
        self.inner.invalidate(&id).await;
    }
}
