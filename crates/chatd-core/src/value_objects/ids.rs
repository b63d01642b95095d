//! Identifier newtypes
//!
//! Connections, identities, and rooms are all addressed by opaque string
//! tokens. Newtypes keep them from being mixed up at call sites.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Transport-scoped connection identifier
///
/// Generated when a socket is accepted and never reused for the lifetime of
/// the process.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(String);

impl ConnectionId {
    /// Generate a fresh connection id
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Wrap an existing id value
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the id as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short prefix of the id, used when deriving provisional identities
    ///
    /// Counts characters, not bytes, so ids from arbitrary strings are safe.
    #[must_use]
    pub fn short(&self) -> &str {
        match self.0.char_indices().nth(8) {
            Some((end, _)) => &self.0[..end],
            None => &self.0,
        }
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a bound identity
///
/// Either the id of a looked-up external account or a provisional id derived
/// from the connection's own id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentityId(String);

impl IdentityId {
    /// Wrap an existing id value
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Derive the provisional identity id for a connection
    ///
    /// The derivation uses the connection's own id, so the result is unique
    /// for the lifetime of that connection.
    #[must_use]
    pub fn provisional_for(connection: &ConnectionId) -> Self {
        Self(format!("guest-{}", connection.short()))
    }

    /// Get the id as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdentityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Name of a broadcast room
///
/// Rooms are schema-less to the coordination core: any name is valid and a
/// room springs into existence on first reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomName(String);

impl RoomName {
    /// Wrap a room name
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Get the name as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RoomName {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for RoomName {
    fn from(name: String) -> Self {
        Self(name)
    }
}
