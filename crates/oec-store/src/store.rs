//! The dual-tier, write-through `SessionStore` (spec §4.1).

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use oec_protocol::{SessionContext, SessionId};
use tracing::instrument;

use crate::cache::{SessionCache, DEFAULT_TTL_SECONDS};
use crate::durable::DurableStore;
use crate::errors::StoreError;

#[derive(Debug, Clone)]
pub struct SessionStoreConfig {
    pub durable_base_path: PathBuf,
    pub cache_ttl: Duration,
}

impl Default for SessionStoreConfig {
    fn default() -> Self {
        Self {
            durable_base_path: PathBuf::from("session_store"),
            cache_ttl: Duration::from_secs(DEFAULT_TTL_SECONDS),
        }
    }
}

/// CRUD over [`SessionContext`] with a fast cache tier in front of a durable
/// filesystem tier.
///
/// # Guarantees (spec §4.1)
///
/// - **Write-through**: [`SessionStore::create`] and [`SessionStore::update`]
///   only report success once the durable write has landed; the cache is
///   populated *after*, so a crash of the cache never loses a committed
///   write — the next [`SessionStore::get`] rebuilds it from disk.
/// - **Read-your-writes**: within one process, a `get` issued after an
///   `update` returns sees an equal-or-newer context, because the cache is
///   refreshed synchronously as part of the same call that wrote to disk.
/// - **No cross-session ordering**: operations on distinct session IDs are
///   fully independent; this type imposes no cross-key lock.
///
/// Per-session write serialization is **not** this type's job — spec §4.1
/// assigns that to the orchestrator's workflow-stage gating (§4.4), since it
/// depends on business rules this crate has no visibility into. `moka`
/// guarantees no torn reads on a single key regardless.
#[derive(Clone)]
pub struct SessionStore {
    cache: SessionCache,
    durable: DurableStore,
}

impl SessionStore {
    pub fn new(config: SessionStoreConfig) -> Self {
        Self {
            cache: SessionCache::new(config.cache_ttl),
            durable: DurableStore::new(config.durable_base_path),
        }
    }

    /// Write `ctx` to both tiers. The caller only observes success once the
    /// durable write has completed (spec §4.1).
    #[instrument(skip(self, ctx), fields(session_id = %ctx.session_id))]
    pub async fn create(&self, ctx: SessionContext) -> Result<(), StoreError> {
        self.durable.write(&ctx).await?;
        self.cache.put(Arc::new(ctx)).await;
        Ok(())
    }

    /// Read-through: cache first, durable on miss, rewarming the cache on a
    /// durable hit (spec §4.1).
    #[instrument(skip(self))]
    pub async fn get(&self, id: SessionId) -> Result<SessionContext, StoreError> {
        if let Some(cached) = self.cache.get(id).await {
            return Ok((*cached).clone());
        }

        let ctx = self.durable.read(id).await?;
        self.cache.put(Arc::new(ctx.clone())).await;
        Ok(ctx)
    }

    /// Refresh `last_updated` (monotonically, never moving it backward
    /// relative to the previously stored value) and re-run the write-through
    /// path.
    #[instrument(skip(self, ctx), fields(session_id = %ctx.session_id))]
    pub async fn update(&self, mut ctx: SessionContext) -> Result<(), StoreError> {
        let now = Utc::now();
        ctx.last_updated = ctx.last_updated.max(now);

        if let Ok(previous) = self.get(ctx.session_id).await {
            if ctx.last_updated < previous.last_updated {
                ctx.last_updated = previous.last_updated;
            }
        }

        self.create(ctx).await
    }

    /// Remove from both tiers. Idempotent: deleting an unknown session is
    /// not an error (spec §4.1).
    #[instrument(skip(self))]
    pub async fn delete(&self, id: SessionId) -> Result<(), StoreError> {
        self.cache.invalidate(id).await;
        self.durable.delete(id).await
    }

    /// Test/operational hook: simulate cache loss without touching the
    /// durable tier (spec §8 scenario 5, "cache loss mid-session").
    pub async fn evict_from_cache(&self, id: SessionId) {
        self.cache.evict(id).await;
    }
}
