//! Test harness for driving a live coordinator
//!
//! Runs a real `PresenceCoordinator` on its own task, backed by the in-memory
//! store and a static directory. Tests connect simulated clients and assert
//! on the ordered event streams each client receives.
//!
//! All timing-sensitive tests run under `start_paused = true`, so fallback
//! windows and typing decay elapse instantly and deterministically.

use anyhow::Result;
use chatd_core::{
    ChatMessage, ConnectionId, Credentials, Identity, IdentityId, MessageStore, RoomName,
};
use chatd_presence::{PresenceCoordinator, PresenceHandle, PresenceSettings, ServerEvent};
use chatd_store::{MemoryMessageStore, StaticDirectory};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::fixtures::standard_directory;

/// How long `expect` waits before declaring an event missing
///
/// Under paused time this only bounds how far the clock may auto-advance.
const EXPECT_TIMEOUT: Duration = Duration::from_secs(60);

/// A coordinator running on its own task, plus its backing store
pub struct TestHarness {
    presence: PresenceHandle,
    store: Arc<MemoryMessageStore>,
    settings: PresenceSettings,
}

impl TestHarness {
    /// Start a coordinator with the standard accounts and default settings
    pub fn start() -> Self {
        Self::with_directory(standard_directory())
    }

    /// Start a coordinator with a custom directory
    pub fn with_directory(directory: StaticDirectory) -> Self {
        Self::with_parts(PresenceSettings::default(), directory)
    }

    /// Start a coordinator with custom settings and directory
    pub fn with_parts(settings: PresenceSettings, directory: StaticDirectory) -> Self {
        let store = Arc::new(MemoryMessageStore::new());
        let coordinator =
            PresenceCoordinator::new(settings.clone(), Arc::new(directory), store.clone());
        let presence = coordinator.handle();
        tokio::spawn(coordinator.run());

        Self {
            presence,
            store,
            settings,
        }
    }

    /// Get the coordinator handle
    pub fn presence(&self) -> &PresenceHandle {
        &self.presence
    }

    /// Get the backing message store
    pub fn store(&self) -> &MemoryMessageStore {
        &self.store
    }

    /// Get the settings the coordinator was started with
    pub fn settings(&self) -> &PresenceSettings {
        &self.settings
    }

    /// Write a message straight into the store, bypassing the coordinator
    pub async fn seed_message(&self, room: &str, author: &str, content: &str) -> Result<()> {
        let message = ChatMessage::new(
            RoomName::from(room),
            IdentityId::new(author),
            author,
            content,
        );
        self.store.persist_message(&message).await?;
        Ok(())
    }

    /// Connect a new simulated client
    pub fn connect(&self) -> TestClient {
        let id = ConnectionId::generate();
        let (tx, rx) = mpsc::channel(self.settings.backlog_limit.max(64));
        self.presence.connect(id.clone(), tx);

        TestClient {
            id,
            presence: self.presence.clone(),
            rx,
        }
    }

    /// Connect a client and complete its handshake with `token`
    ///
    /// Returns the client together with the identity and backlog from its
    /// `ready` sequence.
    pub async fn connect_ready(&self, token: &str) -> (TestClient, Identity, Vec<ChatMessage>) {
        let mut client = self.connect();
        client.handshake(token);
        let (identity, backlog) = client.expect_ready().await;
        (client, identity, backlog)
    }
}

/// One simulated client connection
pub struct TestClient {
    id: ConnectionId,
    presence: PresenceHandle,
    rx: mpsc::Receiver<ServerEvent>,
}

impl TestClient {
    /// The connection id this client was registered under
    pub fn id(&self) -> &ConnectionId {
        &self.id
    }

    /// Present handshake credentials
    pub fn handshake(&self, token: &str) {
        self.presence
            .handshake(self.id.clone(), Credentials::new(token));
    }

    /// Switch rooms
    pub fn join(&self, room: &str) {
        self.presence.join_room(self.id.clone(), RoomName::from(room));
    }

    /// Signal typing activity
    pub fn typing(&self) {
        self.presence.typing(self.id.clone());
    }

    /// Signal an explicit typing stop
    pub fn stop_typing(&self) {
        self.presence.stop_typing(self.id.clone());
    }

    /// Send a chat message
    pub fn send(&self, content: &str) {
        self.presence.chat_message(self.id.clone(), content.to_string());
    }

    /// Report the transport as closed
    pub fn disconnect(&self) {
        self.presence.disconnect(self.id.clone());
    }

    /// Wait for the next event and assert its name
    pub async fn expect(&mut self, name: &str) -> ServerEvent {
        let received = tokio::time::timeout(EXPECT_TIMEOUT, self.rx.recv())
            .await
            .unwrap_or_else(|_| panic!("timed out waiting for {name}"));
        let event = received.unwrap_or_else(|| panic!("channel closed waiting for {name}"));
        assert_eq!(event.name(), name, "unexpected event: {event:?}");
        event
    }

    /// Wait for the `ready` / `room_backlog` pair that completes binding
    pub async fn expect_ready(&mut self) -> (Identity, Vec<ChatMessage>) {
        let ready = self.expect("ready").await;
        let ServerEvent::Ready { identity, .. } = ready else {
            unreachable!();
        };

        let backlog = self.expect("room_backlog").await;
        let ServerEvent::RoomBacklog { messages, .. } = backlog else {
            unreachable!();
        };

        (identity, messages)
    }

    /// Let the coordinator drain its queue
    pub async fn settle(&self) {
        for _ in 0..16 {
            tokio::task::yield_now().await;
        }
    }

    /// Assert no event is waiting after the coordinator settles
    pub async fn assert_silent(&mut self) {
        self.settle().await;
        if let Ok(event) = self.rx.try_recv() {
            panic!("expected silence, got {event:?}");
        }
    }

    /// Assert the outbound channel was closed by the coordinator
    pub async fn expect_closed(&mut self) {
        let received = tokio::time::timeout(EXPECT_TIMEOUT, self.rx.recv())
            .await
            .expect("timed out waiting for the channel to close");
        assert!(received.is_none(), "expected a closed channel, got {received:?}");
    }
}
