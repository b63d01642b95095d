//! Inbound and outbound event types
//!
//! `PresenceEvent` is everything that can reach the coordinator's queue:
//! transport events plus expirations posted by the timer wheel. `ServerEvent`
//! is the ordered notification stream sent back out to connections.

use chatd_core::{ChatMessage, ConnectionId, Credentials, Identity, IdentityId, RoomName};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// An event consumed by the presence coordinator
#[derive(Debug)]
pub enum PresenceEvent {
    /// A transport connection was accepted
    Connected {
        connection: ConnectionId,
        sender: mpsc::Sender<ServerEvent>,
    },

    /// The client presented credentials for identity binding
    Handshake {
        connection: ConnectionId,
        credentials: Credentials,
    },

    /// The client asked to switch rooms
    JoinRoom {
        connection: ConnectionId,
        room: RoomName,
    },

    /// The client signalled typing activity
    Typing { connection: ConnectionId },

    /// The client explicitly stopped typing
    StopTyping { connection: ConnectionId },

    /// The client sent a chat message
    ChatMessage {
        connection: ConnectionId,
        content: String,
    },

    /// The transport connection closed
    Disconnected { connection: ConnectionId },

    /// The handshake fallback window elapsed without a binding
    HandshakeExpired { connection: ConnectionId },

    /// A typing decay timer fired
    TypingExpired { identity: IdentityId },
}

/// A notification delivered to connections
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Identity binding completed for this connection
    Ready { identity: Identity, room: RoomName },

    /// An identity joined the room
    Joined { room: RoomName, identity: Identity },

    /// An identity left the room
    Left { room: RoomName, identity: Identity },

    /// An identity started typing in the room
    TypingStarted {
        room: RoomName,
        identity: IdentityId,
    },

    /// An identity stopped typing (explicitly or by decay)
    TypingStopped {
        room: RoomName,
        identity: IdentityId,
    },

    /// Recent room history, oldest first, delivered on join
    RoomBacklog {
        room: RoomName,
        messages: Vec<ChatMessage>,
    },

    /// A chat message was accepted and fanned out
    Message { message: ChatMessage },

    /// The handshake was explicitly rejected; the transport will close
    HandshakeRejected { reason: String },
}

impl ServerEvent {
    /// Short event name for logging
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Ready { .. } => "ready",
            Self::Joined { .. } => "joined",
            Self::Left { .. } => "left",
            Self::TypingStarted { .. } => "typing_started",
            Self::TypingStopped { .. } => "typing_stopped",
            Self::RoomBacklog { .. } => "room_backlog",
            Self::Message { .. } => "message",
            Self::HandshakeRejected { .. } => "handshake_rejected",
        }
    }
}
