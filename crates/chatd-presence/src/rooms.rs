//! Room registry
//!
//! Owns room membership sets and enforces the single-room invariant: an
//! identity appears in at most one room's member set at a time, because
//! `join` always removes it from its previous room first. Rooms are created
//! on first reference and never destroyed; an empty room simply stays empty.

use chatd_core::{IdentityId, RoomName};
use std::collections::{HashMap, HashSet};

/// Membership deltas produced by a join
///
/// For a room switch `left` names the old room; field order mirrors the
/// notification order the coordinator must emit (left strictly before
/// joined). `joined` is `None` when the identity was already in the target
/// room and the join was a no-op.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinOutcome {
    pub left: Option<RoomName>,
    pub joined: Option<RoomName>,
}

impl JoinOutcome {
    /// Whether the join changed nothing
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.joined.is_none()
    }
}

/// Registry of room membership
#[derive(Debug, Default)]
pub struct RoomRegistry {
    rooms: HashMap<RoomName, HashSet<IdentityId>>,
    occupancy: HashMap<IdentityId, RoomName>,
}

impl RoomRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Move an identity into a room, leaving its previous room first
    ///
    /// Idempotent when the identity is already in the target room.
    pub fn join(&mut self, identity: &IdentityId, room: &RoomName) -> JoinOutcome {
        if self.occupancy.get(identity) == Some(room) {
            return JoinOutcome {
                left: None,
                joined: None,
            };
        }

        let left = self.leave(identity);

        self.rooms
            .entry(room.clone())
            .or_default()
            .insert(identity.clone());
        self.occupancy.insert(identity.clone(), room.clone());

        tracing::trace!(identity = %identity, room = %room, left = ?left, "Room joined");

        JoinOutcome {
            left,
            joined: Some(room.clone()),
        }
    }

    /// Remove an identity from whichever room it occupies
    ///
    /// Idempotent if the identity is in no room. Returns the room it left.
    pub fn leave(&mut self, identity: &IdentityId) -> Option<RoomName> {
        let room = self.occupancy.remove(identity)?;
        if let Some(members) = self.rooms.get_mut(&room) {
            members.remove(identity);
        }

        tracing::trace!(identity = %identity, room = %room, "Room left");
        Some(room)
    }

    /// Iterate the identities currently in a room
    ///
    /// Read-only view; an unknown room is simply empty.
    pub fn members_of<'a>(&'a self, room: &RoomName) -> impl Iterator<Item = &'a IdentityId> {
        self.rooms.get(room).into_iter().flatten()
    }

    /// Number of identities in a room
    pub fn member_count(&self, room: &RoomName) -> usize {
        self.rooms.get(room).map_or(0, HashSet::len)
    }

    /// Room an identity currently occupies, if any
    pub fn room_of(&self, identity: &IdentityId) -> Option<&RoomName> {
        self.occupancy.get(identity)
    }

    /// Number of rooms ever referenced
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}
