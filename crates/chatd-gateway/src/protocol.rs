//! Client wire protocol
//!
//! Inbound JSON frames tagged by `type`. The outbound direction reuses
//! [`chatd_presence::ServerEvent`] directly, tagged by `event`.

use serde::{Deserialize, Serialize};

/// A frame received from a client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Present credentials for identity binding
    Handshake { token: String },

    /// Switch to another room
    JoinRoom { room: String },

    /// Typing activity in the current room
    Typing,

    /// Explicit typing stop
    StopTyping,

    /// Send a chat message to the current room
    Message { content: String },
}

impl ClientMessage {
    /// Parse a frame from its JSON text
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}
