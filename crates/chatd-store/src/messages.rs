//! In-memory message store
//!
//! Keeps a bounded, append-ordered history per room. The interior lock is
//! held only for the duration of a copy or append, never across an await.

use async_trait::async_trait;
use chatd_core::{ChatMessage, CollabResult, MessageStore, RoomName};
use parking_lot::RwLock;
use std::collections::{HashMap, VecDeque};

const DEFAULT_RETENTION: usize = 500;

/// Message store backed by per-room ring buffers
pub struct MemoryMessageStore {
    rooms: RwLock<HashMap<RoomName, VecDeque<ChatMessage>>>,
    retention: usize,
}

impl MemoryMessageStore {
    /// Create a store retaining up to 500 messages per room
    #[must_use]
    pub fn new() -> Self {
        Self::with_retention(DEFAULT_RETENTION)
    }

    /// Create a store retaining up to `retention` messages per room
    #[must_use]
    pub fn with_retention(retention: usize) -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
            retention,
        }
    }

    /// Total number of retained messages across all rooms
    pub fn len(&self) -> usize {
        self.rooms.read().values().map(VecDeque::len).sum()
    }

    /// Whether no messages are retained
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryMessageStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessageStore for MemoryMessageStore {
    /// The most recent `limit` messages for a room, oldest first
    async fn recent_messages(
        &self,
        room: &RoomName,
        limit: usize,
    ) -> CollabResult<Vec<ChatMessage>> {
        let rooms = self.rooms.read();
        let Some(history) = rooms.get(room) else {
            return Ok(Vec::new());
        };

        let skip = history.len().saturating_sub(limit);
        Ok(history.iter().skip(skip).cloned().collect())
    }

    async fn persist_message(&self, message: &ChatMessage) -> CollabResult<()> {
        let mut rooms = self.rooms.write();
        let history = rooms.entry(message.room.clone()).or_default();

        history.push_back(message.clone());
        while history.len() > self.retention {
            history.pop_front();
        }

        tracing::trace!(
            room = %message.room,
            message_id = %message.id,
            retained = history.len(),
            "Message persisted"
        );
        Ok(())
    }
}

impl std::fmt::Debug for MemoryMessageStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryMessageStore")
            .field("rooms", &self.rooms.read().len())
            .field("retention", &self.retention)
            .finish()
    }
}
