//! # chatd-presence
//!
//! The live session/room coordination core: turns a pool of independently
//! connecting clients into a consistent view of who is in which room, who is
//! typing, and who just joined or left.
//!
//! All state mutations happen on a single event-processing task owned by
//! [`PresenceCoordinator`]; the transport talks to it through a cloneable
//! [`PresenceHandle`]. Timers (the handshake fallback window and typing
//! decay) post back into the same event queue, so no handler ever races
//! another for the same connection.

pub mod connection;
pub mod coordinator;
pub mod events;
pub mod rooms;
pub mod timer;
pub mod typing;

// Re-export commonly used types at crate root
pub use connection::{ConnectionRecord, ConnectionRegistry};
pub use coordinator::{PresenceCoordinator, PresenceHandle, PresenceSettings};
pub use events::{PresenceEvent, ServerEvent};
pub use rooms::{JoinOutcome, RoomRegistry};
pub use timer::TimerWheel;
pub use typing::{TypingTracker, TypingTransition};
