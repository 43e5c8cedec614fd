//! The resilient `call_llm` wrapper (spec §4.5): provider selection pinned
//! per-agent at startup, bounded retry classified by error kind.
//!
//! Three pieces: [`config::LlmConfig`] (resolved once at agent startup from
//! environment variables), [`client::LlmClient`] (one HTTP implementation
//! shared by both [`config::ProviderKind`]s, since both speak an
//! OpenAI-compatible chat-completions wire format), and [`retry::call_llm`]
//! (the backoff schedule, spec §4.5's "Retry policy").

mod client;
mod config;
mod errors;
mod retry;

pub use client::{Completion, HttpLlmClient, LlmClient};
pub use config::{LlmConfig, ProviderKind};
pub use errors::{LlmCallError, LlmCallFailed, LlmErrorKind};
pub use retry::call_llm;
