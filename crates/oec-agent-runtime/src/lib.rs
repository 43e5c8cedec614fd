//! The shared Agent Framework base (spec §4.5): every specialized agent
//! binary wires this crate's [`server::serve`] to its own [`dispatch::DispatchTable`],
//! reaches the orchestrator through [`context_client::ContextClient`], and
//! registers itself at startup via [`registration::register_with_startup_retries`].
//!
//! Grounded on the teacher's capability-interface redesign flag (spec §9:
//! "replace abstract-base-class agent hierarchy with a capability interface
//! ... plus a shared agent-runtime record").

pub mod config;
pub mod context_client;
pub mod dispatch;
pub mod registration;
pub mod server;

pub use config::AgentRuntimeConfig;
pub use context_client::{ContextClient, ContextClientError};
pub use dispatch::{DispatchTable, TaskHandler};
pub use registration::{register_once, register_with_startup_retries};
pub use server::serve;
