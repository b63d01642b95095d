//! Session lifecycle and room membership tests
//!
//! Run with: cargo test -p integration-tests --test presence_tests

use chatd_core::IdentityId;
use chatd_presence::ServerEvent;
use integration_tests::{
    standard_directory, TestHarness, ALICE_TOKEN, BOB_TOKEN, CAROL_TOKEN, UNKNOWN_TOKEN,
};

#[tokio::test(start_paused = true)]
async fn test_handshake_enters_default_room() {
    let harness = TestHarness::start();

    let (mut alice, identity, backlog) = harness.connect_ready(ALICE_TOKEN).await;
    assert_eq!(identity.id, IdentityId::new("u-alice"));
    assert_eq!(identity.display_name, "alice");
    assert!(!identity.provisional);
    assert!(backlog.is_empty());

    // A second binding is announced to the first member
    let (_bob, bob_identity, _) = harness.connect_ready(BOB_TOKEN).await;
    let joined = alice.expect("joined").await;
    match joined {
        ServerEvent::Joined { room, identity } => {
            assert_eq!(room.as_str(), "lobby");
            assert_eq!(identity.id, bob_identity.id);
        }
        other => panic!("unexpected event {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_handshake_timeout_binds_provisional_identity() {
    let harness = TestHarness::start();

    let mut client = harness.connect();
    // No handshake; the fallback window elapses under paused time.
    let (identity, _) = client.expect_ready().await;

    assert!(identity.provisional);
    assert_eq!(identity.id, IdentityId::provisional_for(client.id()));
    assert_eq!(identity.display_name, identity.id.as_str());
}

#[tokio::test(start_paused = true)]
async fn test_late_handshake_loses_to_fallback() {
    let harness = TestHarness::start();

    let mut client = harness.connect();
    let (identity, _) = client.expect_ready().await;
    assert!(identity.provisional);

    // The handshake arrives after the fallback already bound; first wins.
    client.handshake(ALICE_TOKEN);
    client.assert_silent().await;
}

#[tokio::test(start_paused = true)]
async fn test_unknown_credentials_reject_and_close() {
    let harness = TestHarness::start();
    let (mut alice, ..) = harness.connect_ready(ALICE_TOKEN).await;

    let mut client = harness.connect();
    client.handshake(UNKNOWN_TOKEN);

    let rejected = client.expect("handshake_rejected").await;
    assert!(matches!(rejected, ServerEvent::HandshakeRejected { .. }));
    client.expect_closed().await;

    // The rejected connection never reached any room
    alice.assert_silent().await;
}

#[tokio::test(start_paused = true)]
async fn test_directory_outage_rejects_instead_of_guessing() {
    let harness = TestHarness::with_directory(standard_directory().into_unavailable());

    let mut client = harness.connect();
    client.handshake(ALICE_TOKEN);

    client.expect("handshake_rejected").await;
    client.expect_closed().await;
}

#[tokio::test(start_paused = true)]
async fn test_room_switch_emits_left_then_joined() {
    let harness = TestHarness::start();

    let (mut alice, ..) = harness.connect_ready(ALICE_TOKEN).await;
    let (mut bob, bob_identity, _) = harness.connect_ready(BOB_TOKEN).await;
    alice.expect("joined").await;

    let (mut carol, ..) = harness.connect_ready(CAROL_TOKEN).await;
    alice.expect("joined").await;
    bob.expect("joined").await;

    carol.join("rust");

    // Lobby members see the departure; carol receives the new room's history.
    let left = alice.expect("left").await;
    match left {
        ServerEvent::Left { room, identity } => {
            assert_eq!(room.as_str(), "lobby");
            assert_eq!(identity.id, IdentityId::new("u-carol"));
        }
        other => panic!("unexpected event {other:?}"),
    }
    bob.expect("left").await;
    carol.expect("room_backlog").await;

    // Bob follows; carol, already in the room, sees him arrive.
    bob.join("rust");
    alice.expect("left").await;
    let joined = carol.expect("joined").await;
    match joined {
        ServerEvent::Joined { room, identity } => {
            assert_eq!(room.as_str(), "rust");
            assert_eq!(identity.id, bob_identity.id);
        }
        other => panic!("unexpected event {other:?}"),
    }
    bob.expect("room_backlog").await;
}

#[tokio::test(start_paused = true)]
async fn test_joining_current_room_is_a_noop() {
    let harness = TestHarness::start();

    let (mut alice, ..) = harness.connect_ready(ALICE_TOKEN).await;
    let (mut bob, ..) = harness.connect_ready(BOB_TOKEN).await;
    alice.expect("joined").await;

    bob.join("lobby");
    bob.assert_silent().await;
    alice.assert_silent().await;
}

#[tokio::test(start_paused = true)]
async fn test_requests_before_binding_are_ignored() {
    let harness = TestHarness::start();

    let client = harness.connect();
    client.join("rust");
    client.typing();
    client.send("too early");

    // None of it took effect; the fallback still lands in the default room.
    let mut client = client;
    let ready = client.expect("ready").await;
    match ready {
        ServerEvent::Ready { room, .. } => assert_eq!(room.as_str(), "lobby"),
        other => panic!("unexpected event {other:?}"),
    }
    client.expect("room_backlog").await;
    assert!(harness.store().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_disconnect_notifies_remaining_members() {
    let harness = TestHarness::start();

    let (mut alice, ..) = harness.connect_ready(ALICE_TOKEN).await;
    let (bob, bob_identity, _) = harness.connect_ready(BOB_TOKEN).await;
    alice.expect("joined").await;

    bob.disconnect();

    let left = alice.expect("left").await;
    match left {
        ServerEvent::Left { identity, .. } => assert_eq!(identity.id, bob_identity.id),
        other => panic!("unexpected event {other:?}"),
    }
    alice.assert_silent().await;
}

#[tokio::test(start_paused = true)]
async fn test_disconnect_before_binding_is_quiet() {
    let harness = TestHarness::start();
    let (mut alice, ..) = harness.connect_ready(ALICE_TOKEN).await;

    let client = harness.connect();
    client.disconnect();

    // No binding ever happened, so nothing is announced and the fallback
    // timer never fires for the departed connection.
    alice.assert_silent().await;
}
