//! Opaque identifiers shared across the orchestrator and agent processes.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A session's primary key: 128 bits of randomness rendered as a UUID token.
///
/// `SessionId` is the only handle clients and agents ever see for a session —
/// there is no sequential or guessable component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Mint a fresh, random session identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Render as the canonical hyphenated text token used in URLs and storage keys.
    pub fn as_token(&self) -> String {
        self.0.to_string()
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for SessionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Identifier of a single envelope, unique per hop. Used only for idempotence
/// bookkeeping at the transport layer — envelopes are never persisted or replayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(Uuid);

impl MessageId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
