//! Identity entity
//!
//! The principal bound to a connection. Exactly one identity is bound per
//! connection, either resolved from the external directory or synthesized
//! locally when no handshake completes in time.

use crate::value_objects::{ConnectionId, IdentityId};
use serde::{Deserialize, Serialize};

/// The principal bound to a connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Opaque unique identity token
    pub id: IdentityId,

    /// Name shown to other room members
    pub display_name: String,

    /// Whether this identity was synthesized locally instead of resolved
    /// from the external directory
    pub provisional: bool,
}

impl Identity {
    /// Create an identity resolved from an external-account lookup
    pub fn registered(id: IdentityId, display_name: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            provisional: false,
        }
    }

    /// Synthesize the provisional identity for a connection
    ///
    /// The id is derived from the connection's own id, so it is unique for
    /// the lifetime of that connection.
    #[must_use]
    pub fn provisional_for(connection: &ConnectionId) -> Self {
        let id = IdentityId::provisional_for(connection);
        let display_name = id.as_str().to_string();
        Self {
            id,
            display_name,
            provisional: true,
        }
    }
}

/// Credentials presented by a client during the identity handshake
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Opaque token understood by the external directory
    pub token: String,
}

impl Credentials {
    /// Create credentials from a raw token
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}
