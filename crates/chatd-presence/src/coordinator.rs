//! Presence coordinator
//!
//! The only component that touches the outbound transport. Owns the
//! connection, room, and typing registries and processes inbound events one
//! at a time on a single task, so every handler runs to completion (or to a
//! collaborator await) without interleaving. Code after a collaborator await
//! re-validates state, because other events may have been processed during
//! the suspension.

use crate::connection::ConnectionRegistry;
use crate::events::{PresenceEvent, ServerEvent};
use crate::rooms::RoomRegistry;
use crate::typing::TypingTracker;
use chatd_core::{
    ChatMessage, ConnectionId, Credentials, Identity, IdentityId, IdentityDirectory,
    MessageStore, RoomName,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Tunables for the coordination core
#[derive(Debug, Clone)]
pub struct PresenceSettings {
    /// Room every identity joins when binding completes
    pub default_room: RoomName,
    /// Number of recent messages delivered on join
    pub backlog_limit: usize,
    /// Fallback window before a provisional identity is bound
    pub handshake_timeout: Duration,
    /// Quiet period before typing state decays
    pub typing_decay: Duration,
}

impl Default for PresenceSettings {
    fn default() -> Self {
        Self {
            default_room: RoomName::from("lobby"),
            backlog_limit: 50,
            handshake_timeout: Duration::from_secs(10),
            typing_decay: Duration::from_secs(3),
        }
    }
}

/// Transport-facing handle to the coordinator
///
/// Cheap to clone; every method posts an event into the coordinator's queue
/// and returns immediately.
#[derive(Debug, Clone)]
pub struct PresenceHandle {
    events: mpsc::UnboundedSender<PresenceEvent>,
}

impl PresenceHandle {
    /// Register a newly accepted connection and its outbound channel
    pub fn connect(&self, connection: ConnectionId, sender: mpsc::Sender<ServerEvent>) {
        self.send(PresenceEvent::Connected { connection, sender });
    }

    /// Submit handshake credentials for identity binding
    pub fn handshake(&self, connection: ConnectionId, credentials: Credentials) {
        self.send(PresenceEvent::Handshake {
            connection,
            credentials,
        });
    }

    /// Request a room switch
    pub fn join_room(&self, connection: ConnectionId, room: RoomName) {
        self.send(PresenceEvent::JoinRoom { connection, room });
    }

    /// Signal typing activity
    pub fn typing(&self, connection: ConnectionId) {
        self.send(PresenceEvent::Typing { connection });
    }

    /// Signal an explicit typing stop
    pub fn stop_typing(&self, connection: ConnectionId) {
        self.send(PresenceEvent::StopTyping { connection });
    }

    /// Submit a chat message
    pub fn chat_message(&self, connection: ConnectionId, content: String) {
        self.send(PresenceEvent::ChatMessage {
            connection,
            content,
        });
    }

    /// Report that the transport connection closed
    pub fn disconnect(&self, connection: ConnectionId) {
        self.send(PresenceEvent::Disconnected { connection });
    }

    fn send(&self, event: PresenceEvent) {
        if self.events.send(event).is_err() {
            tracing::warn!("Presence coordinator has stopped; event dropped");
        }
    }
}

/// Orchestrates connection, room, and typing state for the whole process
pub struct PresenceCoordinator {
    connections: ConnectionRegistry,
    rooms: RoomRegistry,
    typing: TypingTracker,
    directory: Arc<dyn IdentityDirectory>,
    store: Arc<dyn MessageStore>,
    settings: PresenceSettings,
    events_tx: mpsc::UnboundedSender<PresenceEvent>,
    events_rx: mpsc::UnboundedReceiver<PresenceEvent>,
}

impl PresenceCoordinator {
    /// Create a coordinator with its own event queue
    pub fn new(
        settings: PresenceSettings,
        directory: Arc<dyn IdentityDirectory>,
        store: Arc<dyn MessageStore>,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        Self {
            connections: ConnectionRegistry::new(settings.handshake_timeout, events_tx.clone()),
            rooms: RoomRegistry::new(),
            typing: TypingTracker::new(settings.typing_decay, events_tx.clone()),
            directory,
            store,
            settings,
            events_tx,
            events_rx,
        }
    }

    /// Get a transport-facing handle
    pub fn handle(&self) -> PresenceHandle {
        PresenceHandle {
            events: self.events_tx.clone(),
        }
    }

    /// Process inbound events until the process shuts down
    pub async fn run(mut self) {
        tracing::info!(
            default_room = %self.settings.default_room,
            handshake_timeout_ms = self.settings.handshake_timeout.as_millis() as u64,
            typing_decay_ms = self.settings.typing_decay.as_millis() as u64,
            "Presence coordinator started"
        );

        while let Some(event) = self.events_rx.recv().await {
            self.process(event).await;
        }

        tracing::info!("Presence coordinator stopped");
    }

    async fn process(&mut self, event: PresenceEvent) {
        match event {
            PresenceEvent::Connected { connection, sender } => {
                self.connections.on_connect(connection, sender);
            }
            PresenceEvent::Handshake {
                connection,
                credentials,
            } => self.on_handshake(connection, credentials).await,
            PresenceEvent::HandshakeExpired { connection } => {
                self.on_handshake_expired(connection).await;
            }
            PresenceEvent::JoinRoom { connection, room } => {
                self.on_join_room(connection, room).await;
            }
            PresenceEvent::Typing { connection } => self.on_typing(&connection),
            PresenceEvent::StopTyping { connection } => self.on_stop_typing(&connection),
            PresenceEvent::TypingExpired { identity } => self.on_typing_expired(&identity),
            PresenceEvent::ChatMessage {
                connection,
                content,
            } => self.on_chat_message(&connection, content),
            PresenceEvent::Disconnected { connection } => self.on_disconnect(&connection),
        }
    }

    /// Handshake path of the identity-binding race
    ///
    /// An explicit rejection (lookup error or unknown credentials) terminates
    /// the connection; it never triggers provisional binding. Only the
    /// independent fallback timer does that.
    async fn on_handshake(&mut self, connection: ConnectionId, credentials: Credentials) {
        let Some(record) = self.connections.get(&connection) else {
            tracing::debug!(connection_id = %connection, "Handshake for unknown connection ignored");
            return;
        };
        if let Some(identity) = record.identity() {
            tracing::info!(
                connection_id = %connection,
                identity = %identity.id,
                "Handshake after binding; first binding wins"
            );
            return;
        }

        let directory = Arc::clone(&self.directory);
        let lookup = directory.lookup_identity(&credentials).await;

        // Re-validate: the connection may have disconnected or the fallback
        // timer may have bound a provisional identity during the lookup.
        let Some(record) = self.connections.get(&connection) else {
            tracing::debug!(connection_id = %connection, "Connection closed during identity lookup");
            return;
        };
        if let Some(identity) = record.identity() {
            tracing::info!(
                connection_id = %connection,
                identity = %identity.id,
                "Fallback bound during identity lookup; first binding wins"
            );
            return;
        }

        match lookup {
            Ok(Some(identity)) => match self.connections.bind(&connection, identity) {
                Ok(identity) => self.finish_binding(connection, identity).await,
                Err(e) => {
                    // Unreachable after the re-validation above; a caller bug
                    tracing::error!(connection_id = %connection, error = %e, "Binding failed");
                }
            },
            Ok(None) => {
                tracing::info!(connection_id = %connection, "Credentials resolved to no account");
                self.reject_handshake(&connection, "unknown credentials");
            }
            Err(e) => {
                tracing::warn!(connection_id = %connection, error = %e, "Identity lookup failed");
                self.reject_handshake(&connection, "identity directory unavailable");
            }
        }
    }

    /// Timeout path of the identity-binding race
    async fn on_handshake_expired(&mut self, connection: ConnectionId) {
        let Some(record) = self.connections.get(&connection) else {
            return;
        };
        // A completed binding cancels the fallback timer, but re-validate
        // anyway: the expiry event may already be queued when binding lands.
        if record.is_bound() {
            return;
        }

        match self.connections.bind_provisional(&connection) {
            Ok(identity) => {
                tracing::info!(
                    connection_id = %connection,
                    identity = %identity.id,
                    "No handshake within fallback window; provisional identity bound"
                );
                self.finish_binding(connection, identity).await;
            }
            Err(e) => {
                tracing::error!(connection_id = %connection, error = %e, "Provisional binding failed");
            }
        }
    }

    /// Shared tail of both binding paths: default room, notifications, backlog
    async fn finish_binding(&mut self, connection: ConnectionId, identity: Identity) {
        let room = self.settings.default_room.clone();

        let outcome = self.rooms.join(&identity.id, &room);
        debug_assert!(outcome.left.is_none(), "fresh identity cannot leave a room");
        self.connections.set_room(&connection, Some(room.clone()));

        self.send_to(
            &connection,
            ServerEvent::Ready {
                identity: identity.clone(),
                room: room.clone(),
            },
        );
        let identity_id = identity.id.clone();
        self.broadcast(
            &room,
            Some(&identity_id),
            ServerEvent::Joined {
                room: room.clone(),
                identity,
            },
        );
        self.deliver_backlog(&connection, room).await;
    }

    /// Reject the handshake and terminate the connection
    ///
    /// Removing the record drops the outbound sender; the transport's send
    /// loop closes the socket when the channel closes.
    fn reject_handshake(&mut self, connection: &ConnectionId, reason: &str) {
        self.send_to(
            connection,
            ServerEvent::HandshakeRejected {
                reason: reason.to_string(),
            },
        );
        self.connections.on_disconnect(connection);
    }

    /// Room switch: left before joined, typing cleared in the old room
    async fn on_join_room(&mut self, connection: ConnectionId, room: RoomName) {
        let Some(record) = self.connections.get(&connection) else {
            return;
        };
        let Some(identity) = record.identity().cloned() else {
            tracing::debug!(connection_id = %connection, "Room join before binding ignored");
            return;
        };

        let outcome = self.rooms.join(&identity.id, &room);
        if outcome.is_noop() {
            return;
        }

        if let Some(old) = outcome.left {
            if self.typing.mark_stopped(&old, &identity.id) {
                self.broadcast(
                    &old,
                    Some(&identity.id),
                    ServerEvent::TypingStopped {
                        room: old.clone(),
                        identity: identity.id.clone(),
                    },
                );
            }
            self.broadcast(
                &old,
                Some(&identity.id),
                ServerEvent::Left {
                    room: old.clone(),
                    identity: identity.clone(),
                },
            );
        }

        self.connections.set_room(&connection, Some(room.clone()));
        self.broadcast(
            &room,
            Some(&identity.id),
            ServerEvent::Joined {
                room: room.clone(),
                identity: identity.clone(),
            },
        );

        tracing::debug!(
            connection_id = %connection,
            identity = %identity.id,
            room = %room,
            "Room switched"
        );

        self.deliver_backlog(&connection, room).await;
    }

    fn on_typing(&mut self, connection: &ConnectionId) {
        let Some((identity, room)) = self.bound_room(connection) else {
            return;
        };

        let transition = self.typing.mark_typing(&room, &identity);

        // Invariant repair: typing state can only exist in the current room
        if let Some(other) = transition.stopped_elsewhere {
            self.broadcast(
                &other,
                Some(&identity),
                ServerEvent::TypingStopped {
                    room: other.clone(),
                    identity: identity.clone(),
                },
            );
        }

        if transition.started {
            self.broadcast(
                &room,
                Some(&identity),
                ServerEvent::TypingStarted {
                    room: room.clone(),
                    identity: identity.clone(),
                },
            );
        }
    }

    fn on_stop_typing(&mut self, connection: &ConnectionId) {
        let Some((identity, room)) = self.bound_room(connection) else {
            return;
        };

        if self.typing.mark_stopped(&room, &identity) {
            self.broadcast(
                &room,
                Some(&identity),
                ServerEvent::TypingStopped {
                    room: room.clone(),
                    identity: identity.clone(),
                },
            );
        }
    }

    fn on_typing_expired(&mut self, identity: &IdentityId) {
        if let Some(room) = self.typing.on_decay(identity) {
            self.broadcast(
                &room,
                Some(identity),
                ServerEvent::TypingStopped {
                    room: room.clone(),
                    identity: identity.clone(),
                },
            );
        }
    }

    fn on_chat_message(&mut self, connection: &ConnectionId, content: String) {
        let Some(record) = self.connections.get(connection) else {
            return;
        };
        let (Some(identity), Some(room)) = (record.identity().cloned(), record.room().cloned())
        else {
            tracing::debug!(connection_id = %connection, "Message before binding ignored");
            return;
        };

        // Sending a message is an explicit typing stop
        if self.typing.mark_stopped(&room, &identity.id) {
            self.broadcast(
                &room,
                Some(&identity.id),
                ServerEvent::TypingStopped {
                    room: room.clone(),
                    identity: identity.id.clone(),
                },
            );
        }

        let message = ChatMessage::new(
            room.clone(),
            identity.id.clone(),
            identity.display_name.clone(),
            content,
        );

        // Live broadcast happens regardless of persistence success; the
        // sender receives the echo as delivery confirmation.
        self.broadcast(&room, None, ServerEvent::Message {
            message: message.clone(),
        });

        let store = Arc::clone(&self.store);
        tokio::spawn(async move {
            if let Err(e) = store.persist_message(&message).await {
                tracing::warn!(
                    error = %e,
                    message_id = %message.id,
                    "Message persistence failed"
                );
            }
        });
    }

    /// Unwind everything a connection may have reached: typing, membership,
    /// registry record, then the departure notification
    fn on_disconnect(&mut self, connection: &ConnectionId) {
        let identity = self
            .connections
            .get(connection)
            .and_then(|r| r.identity().cloned());

        // Typing cleanup first, so it can never race a membership check that
        // would find the identity already gone.
        if let Some(identity) = &identity {
            if let Some(room) = self.typing.clear(&identity.id) {
                self.broadcast(
                    &room,
                    Some(&identity.id),
                    ServerEvent::TypingStopped {
                        room: room.clone(),
                        identity: identity.id.clone(),
                    },
                );
            }
        }

        let left_room = identity
            .as_ref()
            .and_then(|identity| self.rooms.leave(&identity.id));

        self.connections.on_disconnect(connection);

        if let (Some(identity), Some(room)) = (identity, left_room) {
            self.broadcast(
                &room,
                None,
                ServerEvent::Left {
                    room: room.clone(),
                    identity,
                },
            );
        }

        tracing::info!(connection_id = %connection, "Connection cleaned up");
    }

    /// Identity and current room for a bound connection
    fn bound_room(&self, connection: &ConnectionId) -> Option<(IdentityId, RoomName)> {
        let record = self.connections.get(connection)?;
        let identity = record.identity()?.id.clone();
        let room = record.room()?.clone();
        Some((identity, room))
    }

    /// Deliver recent room history to a connection, oldest first
    ///
    /// Best-effort: a failed fetch is logged and the join proceeds without
    /// history.
    async fn deliver_backlog(&mut self, connection: &ConnectionId, room: RoomName) {
        let store = Arc::clone(&self.store);
        let fetched = store
            .recent_messages(&room, self.settings.backlog_limit)
            .await;

        match fetched {
            Ok(messages) => {
                // Re-validate: the connection may have switched rooms or
                // disconnected while the fetch was in flight.
                let still_there = self
                    .connections
                    .get(connection)
                    .is_some_and(|record| record.room() == Some(&room));
                if !still_there {
                    tracing::debug!(
                        connection_id = %connection,
                        room = %room,
                        "Connection moved during backlog fetch; dropping backlog"
                    );
                    return;
                }

                self.send_to(connection, ServerEvent::RoomBacklog { room, messages });
            }
            Err(e) => {
                tracing::warn!(
                    connection_id = %connection,
                    room = %room,
                    error = %e,
                    "Backlog fetch failed; continuing without history"
                );
            }
        }
    }

    /// Send an event to every member of a room, except `exclude`
    fn broadcast(&self, room: &RoomName, exclude: Option<&IdentityId>, event: ServerEvent) {
        let mut delivered = 0usize;

        for member in self.rooms.members_of(room) {
            if exclude == Some(member) {
                continue;
            }
            let Some(record) = self.connections.by_identity(member) else {
                continue;
            };
            if record.sender().try_send(event.clone()).is_ok() {
                delivered += 1;
            } else {
                tracing::warn!(
                    identity = %member,
                    event = event.name(),
                    "Outbound channel full or closed; event dropped"
                );
            }
        }

        tracing::trace!(
            room = %room,
            event = event.name(),
            delivered = delivered,
            "Broadcast to room"
        );
    }

    /// Send an event to a single connection
    fn send_to(&self, connection: &ConnectionId, event: ServerEvent) {
        let Some(record) = self.connections.get(connection) else {
            return;
        };
        if record.sender().try_send(event.clone()).is_err() {
            tracing::warn!(
                connection_id = %connection,
                event = event.name(),
                "Outbound channel full or closed; event dropped"
            );
        }
    }
}

impl std::fmt::Debug for PresenceCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PresenceCoordinator")
            .field("connections", &self.connections)
            .field("rooms", &self.rooms.room_count())
            .field("typing", &self.typing)
            .finish()
    }
}
