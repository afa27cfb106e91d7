//! Opaque handles and the service that allocates them.

use rand::Rng;
use rand::distributions::Alphanumeric;
use serde::{Deserialize, Serialize};

/// Number of characters in every generated handle.
pub const HANDLE_LENGTH: usize = 20;

/// Identifies one saga execution (one admitted order).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderHandle(String);

impl OrderHandle {
    /// Wraps an existing handle string, e.g. one received from a client.
    pub fn new(handle: impl Into<String>) -> Self {
        Self(handle.into())
    }

    /// Returns the handle as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for OrderHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for OrderHandle {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for OrderHandle {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Identifies a whole submitted batch.
///
/// Every order admitted with a batch carries this value as its
/// `incomingOrderHash`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BatchHandle(String);

impl BatchHandle {
    /// Wraps an existing handle string.
    pub fn new(handle: impl Into<String>) -> Self {
        Self(handle.into())
    }

    /// Returns the handle as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BatchHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for BatchHandle {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for BatchHandle {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Allocates collision-resistant opaque tokens.
///
/// One generator serves every kind of identifier the system hands out:
/// order handles, batch handles, cart line-item instance ids and address ids.
pub trait HandleGenerator: Send + Sync {
    /// Produces a fresh random token.
    fn token(&self) -> String;

    /// Allocates a new order handle.
    fn order_handle(&self) -> OrderHandle {
        OrderHandle(self.token())
    }

    /// Allocates a new batch handle.
    fn batch_handle(&self) -> BatchHandle {
        BatchHandle(self.token())
    }
}

/// Generates 20-character alphanumeric tokens from the thread-local CSPRNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomHandleGenerator;

impl RandomHandleGenerator {
    /// Creates a new generator.
    pub fn new() -> Self {
        Self
    }
}

impl HandleGenerator for RandomHandleGenerator {
    fn token(&self) -> String {
        rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(HANDLE_LENGTH)
            .map(char::from)
            .collect()
    }
}
