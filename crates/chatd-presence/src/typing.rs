//! Typing tracker
//!
//! Debounces noisy typing signals into a clean start/stop sequence per room:
//! one `typing_started` when an identity first marks typing, one
//! `typing_stopped` when it explicitly stops or the decay timer fires after
//! a quiet period. Re-marking while already typing only re-arms the timer,
//! so outbound traffic is bounded independent of input rate.
//!
//! Invariant (mirroring room membership): an identity is typing in at most
//! one room at a time.

use crate::events::PresenceEvent;
use crate::timer::TimerWheel;
use chatd_core::{IdentityId, RoomName};
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use tokio::sync::mpsc;

/// State change produced by a typing mark
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypingTransition {
    /// The identity was not previously typing in this room
    pub started: bool,
    /// The identity had typing state in a different room that was cleared
    pub stopped_elsewhere: Option<RoomName>,
}

/// Per-room set of currently-typing identities with decaying entries
pub struct TypingTracker {
    typing: HashMap<RoomName, HashSet<IdentityId>>,
    by_identity: HashMap<IdentityId, RoomName>,
    timers: TimerWheel<IdentityId>,
    events: mpsc::UnboundedSender<PresenceEvent>,
    decay: Duration,
}

impl TypingTracker {
    /// Create a tracker posting decay expirations into `events`
    pub fn new(decay: Duration, events: mpsc::UnboundedSender<PresenceEvent>) -> Self {
        Self {
            typing: HashMap::new(),
            by_identity: HashMap::new(),
            timers: TimerWheel::new(),
            events,
            decay,
        }
    }

    /// Record typing activity, (re)arming the decay timer
    ///
    /// Inserting always replaces any pending decay timer for the identity.
    pub fn mark_typing(&mut self, room: &RoomName, identity: &IdentityId) -> TypingTransition {
        let stopped_elsewhere = match self.by_identity.get(identity) {
            Some(current) if current != room => self.remove(identity),
            _ => None,
        };

        let started = self
            .typing
            .entry(room.clone())
            .or_default()
            .insert(identity.clone());
        self.by_identity.insert(identity.clone(), room.clone());

        let events = self.events.clone();
        let expired = identity.clone();
        self.timers.schedule(identity.clone(), self.decay, move || {
            let _ = events.send(PresenceEvent::TypingExpired { identity: expired });
        });

        tracing::trace!(
            identity = %identity,
            room = %room,
            started = started,
            "Typing marked"
        );

        TypingTransition {
            started,
            stopped_elsewhere,
        }
    }

    /// Explicit stop (message sent, input cleared)
    ///
    /// Cancels the decay timer; returns whether the identity was actually
    /// typing in the given room.
    pub fn mark_stopped(&mut self, room: &RoomName, identity: &IdentityId) -> bool {
        if self.by_identity.get(identity) != Some(room) {
            return false;
        }

        self.timers.cancel(identity);
        self.remove(identity);
        tracing::trace!(identity = %identity, room = %room, "Typing stopped");
        true
    }

    /// Room-agnostic cleanup for room-leave and disconnect
    ///
    /// Tolerant of the identity having no typing state at all. Returns the
    /// room whose state was cleared.
    pub fn clear(&mut self, identity: &IdentityId) -> Option<RoomName> {
        self.timers.cancel(identity);
        let room = self.remove(identity)?;
        tracing::trace!(identity = %identity, room = %room, "Typing cleared");
        Some(room)
    }

    /// Handle a fired decay timer
    ///
    /// The timer is already gone from the wheel; this removes the state and
    /// reports the room so the coordinator can emit `typing_stopped`.
    /// Returns `None` if the state was cleared between firing and handling.
    pub fn on_decay(&mut self, identity: &IdentityId) -> Option<RoomName> {
        let room = self.remove(identity)?;
        tracing::trace!(identity = %identity, room = %room, "Typing decayed");
        Some(room)
    }

    /// Whether an identity is currently typing in a room
    pub fn is_typing(&self, room: &RoomName, identity: &IdentityId) -> bool {
        self.by_identity.get(identity) == Some(room)
    }

    /// Number of identities typing in a room
    pub fn typist_count(&self, room: &RoomName) -> usize {
        self.typing.get(room).map_or(0, HashSet::len)
    }

    /// Number of pending decay timers (test observability)
    pub fn pending_decays(&self) -> usize {
        self.timers.pending_count()
    }

    fn remove(&mut self, identity: &IdentityId) -> Option<RoomName> {
        let room = self.by_identity.remove(identity)?;
        if let Some(typists) = self.typing.get_mut(&room) {
            typists.remove(identity);
        }
        Some(room)
    }
}

impl std::fmt::Debug for TypingTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypingTracker")
            .field("typists", &self.by_identity.len())
            .field("decay", &self.decay)
            .finish()
    }
}
