//! Collaborator port definitions
//!
//! Calls into these traits are the only suspension points in the
//! coordination core's event handling; code after an await must re-validate
//! state because other events may have been processed in the meantime.

use async_trait::async_trait;

use crate::entities::{ChatMessage, Credentials, Identity};
use crate::error::CollaboratorError;
use crate::value_objects::RoomName;

/// Result type for collaborator operations
pub type CollabResult<T> = Result<T, CollaboratorError>;

/// External identity lookup
///
/// `Ok(None)` means the credentials resolved to no account; the distinction
/// from `Err` matters only for logging, both are handshake failures to the
/// caller.
#[async_trait]
pub trait IdentityDirectory: Send + Sync {
    /// Resolve credentials to an identity
    async fn lookup_identity(&self, credentials: &Credentials) -> CollabResult<Option<Identity>>;
}

/// External message persistence and history
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Fetch up to `limit` recent messages for a room, oldest first
    async fn recent_messages(&self, room: &RoomName, limit: usize) -> CollabResult<Vec<ChatMessage>>;

    /// Persist a message (best-effort; the live broadcast never waits on this)
    async fn persist_message(&self, message: &ChatMessage) -> CollabResult<()>;
}
