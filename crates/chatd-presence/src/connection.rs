//! Connection registry
//!
//! Owns the authoritative per-connection record and resolves the race
//! between the identity handshake and the fallback timer. Identity binding
//! is write-once: whichever path binds first wins, and the loser is told so.

use crate::events::{PresenceEvent, ServerEvent};
use crate::timer::TimerWheel;
use chatd_core::{ConnectionId, DomainError, Identity, IdentityId};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

/// Per-connection state, owned exclusively by [`ConnectionRegistry`]
///
/// Other components reference connections only by identity id; they never
/// hold their own copy of this record.
#[derive(Debug)]
pub struct ConnectionRecord {
    id: ConnectionId,
    identity: Option<Identity>,
    room: Option<chatd_core::RoomName>,
    sender: mpsc::Sender<ServerEvent>,
    connected_at: Instant,
}

impl ConnectionRecord {
    /// Get the connection id
    pub fn id(&self) -> &ConnectionId {
        &self.id
    }

    /// Get the bound identity, if binding has completed
    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    /// Whether an identity has been bound
    pub fn is_bound(&self) -> bool {
        self.identity.is_some()
    }

    /// Room the connection currently occupies
    pub fn room(&self) -> Option<&chatd_core::RoomName> {
        self.room.as_ref()
    }

    /// Outbound channel for this connection
    pub fn sender(&self) -> &mpsc::Sender<ServerEvent> {
        &self.sender
    }

    /// How long the connection has been open
    pub fn age(&self) -> Duration {
        self.connected_at.elapsed()
    }
}

/// Registry of live connections and their identity bindings
pub struct ConnectionRegistry {
    connections: HashMap<ConnectionId, ConnectionRecord>,
    by_identity: HashMap<IdentityId, ConnectionId>,
    timers: TimerWheel<ConnectionId>,
    events: mpsc::UnboundedSender<PresenceEvent>,
    handshake_timeout: Duration,
}

impl ConnectionRegistry {
    /// Create a registry posting fallback expirations into `events`
    pub fn new(handshake_timeout: Duration, events: mpsc::UnboundedSender<PresenceEvent>) -> Self {
        Self {
            connections: HashMap::new(),
            by_identity: HashMap::new(),
            timers: TimerWheel::new(),
            events,
            handshake_timeout,
        }
    }

    /// Register a new, unbound connection and arm its fallback timer
    ///
    /// If no binding completes before the fallback window elapses, a
    /// `HandshakeExpired` event is posted and a provisional identity will be
    /// bound by the coordinator.
    pub fn on_connect(&mut self, id: ConnectionId, sender: mpsc::Sender<ServerEvent>) {
        if self.connections.contains_key(&id) {
            tracing::error!(connection_id = %id, "Duplicate connection id ignored");
            return;
        }

        let record = ConnectionRecord {
            id: id.clone(),
            identity: None,
            room: None,
            sender,
            connected_at: Instant::now(),
        };
        self.connections.insert(id.clone(), record);

        let events = self.events.clone();
        let connection = id.clone();
        self.timers
            .schedule(id.clone(), self.handshake_timeout, move || {
                let _ = events.send(PresenceEvent::HandshakeExpired { connection });
            });

        tracing::debug!(connection_id = %id, "Connection registered");
    }

    /// Bind an identity to a connection (write-once)
    ///
    /// Cancels the fallback timer on success. Returns `AlreadyBound` if a
    /// binding exists; the first binding always wins.
    pub fn bind(&mut self, id: &ConnectionId, identity: Identity) -> Result<Identity, DomainError> {
        let record = self
            .connections
            .get_mut(id)
            .ok_or_else(|| DomainError::ConnectionNotFound(id.clone()))?;

        if let Some(existing) = &record.identity {
            return Err(DomainError::AlreadyBound(existing.id.clone()));
        }

        self.timers.cancel(id);
        record.identity = Some(identity.clone());
        self.by_identity.insert(identity.id.clone(), id.clone());

        tracing::debug!(
            connection_id = %id,
            identity = %identity.id,
            provisional = identity.provisional,
            "Identity bound"
        );

        Ok(identity)
    }

    /// Synthesize and bind the provisional identity for a connection
    ///
    /// Used when the fallback timer fires with no binding in place; goes
    /// through the same write-once path as a real handshake.
    pub fn bind_provisional(&mut self, id: &ConnectionId) -> Result<Identity, DomainError> {
        self.bind(id, Identity::provisional_for(id))
    }

    /// Remove a connection, cancelling its fallback timer
    ///
    /// Safe to call whether or not binding ever completed. Dropping the
    /// returned record drops the outbound sender, which closes the transport.
    pub fn on_disconnect(&mut self, id: &ConnectionId) -> Option<ConnectionRecord> {
        self.timers.cancel(id);

        let record = self.connections.remove(id)?;
        if let Some(identity) = &record.identity {
            self.by_identity.remove(&identity.id);
        }

        tracing::debug!(connection_id = %id, "Connection removed");
        Some(record)
    }

    /// Record which room the connection occupies
    pub fn set_room(&mut self, id: &ConnectionId, room: Option<chatd_core::RoomName>) {
        if let Some(record) = self.connections.get_mut(id) {
            record.room = room;
        }
    }

    /// Look up a connection record by connection id
    pub fn get(&self, id: &ConnectionId) -> Option<&ConnectionRecord> {
        self.connections.get(id)
    }

    /// Look up a connection record by bound identity id
    pub fn by_identity(&self, identity: &IdentityId) -> Option<&ConnectionRecord> {
        self.by_identity
            .get(identity)
            .and_then(|id| self.connections.get(id))
    }

    /// Number of live connections
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Number of pending fallback timers (test observability)
    pub fn pending_fallbacks(&self) -> usize {
        self.timers.pending_count()
    }
}

impl std::fmt::Debug for ConnectionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionRegistry")
            .field("connections", &self.connections.len())
            .field("bound", &self.by_identity.len())
            .finish()
    }
}
