//! Chat message entity

use crate::value_objects::{IdentityId, RoomName};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A message sent to a room
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Unique message id
    pub id: String,

    /// Room the message was sent to
    pub room: RoomName,

    /// Identity of the author
    pub author: IdentityId,

    /// Author display name at the time of sending
    pub author_name: String,

    /// Message body
    pub content: String,

    /// When the message was accepted by the server
    pub sent_at: DateTime<Utc>,
}

impl ChatMessage {
    /// Create a new message stamped with the current time
    pub fn new(
        room: RoomName,
        author: IdentityId,
        author_name: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            room,
            author,
            author_name: author_name.into(),
            content: content.into(),
            sent_at: Utc::now(),
        }
    }
}
