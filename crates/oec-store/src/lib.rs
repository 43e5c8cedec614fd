//! Dual-tier session persistence (spec §4.1): a `moka` in-memory cache tier
//! with TTL in front of a durable, atomically-written JSON-per-session
//! filesystem tier, composed behind one write-through [`SessionStore`].
//!
//! Grounded on the teacher's [`ThoughtChain`](thoughtchain) durable-memory
//! design (append-only, on-disk, hash-verifiable records) generalized here
//! to a CRUD store with overwrite semantics, since a `SessionContext` is
//! mutated in place rather than appended to.

mod cache;
mod durable;
mod errors;
mod store;

pub use cache::{SessionCache, DEFAULT_TTL_SECONDS};
pub use durable::DurableStore;
pub use errors::StoreError;
pub use store::{SessionStore, SessionStoreConfig};
