//! Bearer-token validation shared by the orchestrator's internal surface and
//! every agent's registration/context-RPC client (SPEC_FULL §3: "Bearer-token
//! authentication between agents and the orchestrator's internal surface").
//!
//! Grounded on the teacher's `AuthConfig::validate` (`mcp_server_builder_utils.rs`):
//! hash both sides with SHA-256 and compare in constant time so a timing
//! oracle can't be used to guess the token byte-by-byte.

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Validate an `Authorization` header value against an expected bearer
/// token. `header` is the raw header value, e.g. `"Bearer abc123"`.
pub fn validate_bearer(expected_token: &str, header: &str) -> bool {
    match header.strip_prefix("Bearer ") {
        Some(provided) => {
            let expected_hash = Sha256::digest(expected_token.as_bytes());
            let provided_hash = Sha256::digest(provided.as_bytes());
            expected_hash.ct_eq(&provided_hash).into()
        }
        None => false,
    }
}

/// Render the `Authorization` header value a client should send.
pub fn bearer_header(token: &str) -> String {
    format!("Bearer {token}")
}
