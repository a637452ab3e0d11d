//! Identity types for livelog.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a game server instance on the core.
///
/// The core hands these out as opaque strings (`INSTANCE_` followed by a
/// UUID), so no parsing is attempted here.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct InstanceUuid(String);

impl InstanceUuid {
    /// Wrap an instance identifier.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The identifier as sent on the wire.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check whether this is the empty placeholder identifier.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for InstanceUuid {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for InstanceUuid {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl AsRef<str> for InstanceUuid {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InstanceUuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for InstanceUuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "InstanceUuid({})", self.0)
    }
}

/// Stable per-event identifier used to deduplicate redelivered events.
///
/// Two records carrying the same key are the same logical event, even if
/// their other fields differ.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct IdempotencyKey(String);

impl IdempotencyKey {
    /// Wrap a key.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The key as sent on the wire.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for IdempotencyKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for IdempotencyKey {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for IdempotencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for IdempotencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IdempotencyKey({})", self.0)
    }
}
