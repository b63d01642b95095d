//! Typing indicator and message fan-out tests
//!
//! Run with: cargo test -p integration-tests --test messaging_tests

use chatd_core::IdentityId;
use chatd_presence::ServerEvent;
use integration_tests::{TestHarness, ALICE_TOKEN, BOB_TOKEN, CAROL_TOKEN};

#[tokio::test(start_paused = true)]
async fn test_message_fans_out_to_all_members_including_sender() {
    let harness = TestHarness::start();

    let (mut alice, ..) = harness.connect_ready(ALICE_TOKEN).await;
    let (mut bob, ..) = harness.connect_ready(BOB_TOKEN).await;
    alice.expect("joined").await;

    bob.send("hello lobby");

    for client in [&mut alice, &mut bob] {
        let event = client.expect("message").await;
        match event {
            ServerEvent::Message { message } => {
                assert_eq!(message.author, IdentityId::new("u-bob"));
                assert_eq!(message.author_name, "bob");
                assert_eq!(message.content, "hello lobby");
                assert_eq!(message.room.as_str(), "lobby");
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    // Persistence is asynchronous but completes once the queue settles
    bob.settle().await;
    assert_eq!(harness.store().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_backlog_is_recent_messages_oldest_first() {
    let harness = TestHarness::start();
    let limit = harness.settings().backlog_limit;

    for i in 0..limit + 10 {
        harness
            .seed_message("lobby", "u-old", &format!("m{i}"))
            .await
            .unwrap();
    }

    let (_alice, _, backlog) = harness.connect_ready(ALICE_TOKEN).await;

    assert_eq!(backlog.len(), limit);
    assert_eq!(backlog.first().unwrap().content, "m10");
    assert_eq!(backlog.last().unwrap().content, format!("m{}", limit + 9));
}

#[tokio::test(start_paused = true)]
async fn test_typing_starts_once_and_decays() {
    let harness = TestHarness::start();

    let (mut alice, ..) = harness.connect_ready(ALICE_TOKEN).await;
    let (mut bob, ..) = harness.connect_ready(BOB_TOKEN).await;
    alice.expect("joined").await;

    // Repeated marks from one client produce a single start
    alice.typing();
    alice.typing();
    alice.typing();

    let started = bob.expect("typing_started").await;
    match started {
        ServerEvent::TypingStarted { identity, room } => {
            assert_eq!(identity, IdentityId::new("u-alice"));
            assert_eq!(room.as_str(), "lobby");
        }
        other => panic!("unexpected event {other:?}"),
    }

    // The quiet period elapses and the decay is announced exactly once
    let stopped = bob.expect("typing_stopped").await;
    assert!(matches!(stopped, ServerEvent::TypingStopped { .. }));
    bob.assert_silent().await;

    // The typist never hears about their own typing state
    alice.assert_silent().await;
}

#[tokio::test(start_paused = true)]
async fn test_explicit_stop_cancels_decay() {
    let harness = TestHarness::start();

    let (mut alice, ..) = harness.connect_ready(ALICE_TOKEN).await;
    let (mut bob, ..) = harness.connect_ready(BOB_TOKEN).await;
    alice.expect("joined").await;

    alice.typing();
    bob.expect("typing_started").await;

    alice.stop_typing();
    bob.expect("typing_stopped").await;

    // No decay follows the explicit stop
    bob.assert_silent().await;
}

#[tokio::test(start_paused = true)]
async fn test_sending_a_message_stops_typing() {
    let harness = TestHarness::start();

    let (mut alice, ..) = harness.connect_ready(ALICE_TOKEN).await;
    let (mut bob, ..) = harness.connect_ready(BOB_TOKEN).await;
    alice.expect("joined").await;

    alice.typing();
    bob.expect("typing_started").await;

    alice.send("done typing");

    // Peers see the stop before the message; the author only sees the echo.
    bob.expect("typing_stopped").await;
    bob.expect("message").await;
    alice.expect("message").await;
    alice.assert_silent().await;
}

#[tokio::test(start_paused = true)]
async fn test_room_switch_clears_typing_in_old_room() {
    let harness = TestHarness::start();

    let (mut alice, ..) = harness.connect_ready(ALICE_TOKEN).await;
    let (mut bob, ..) = harness.connect_ready(BOB_TOKEN).await;
    alice.expect("joined").await;

    bob.typing();
    alice.expect("typing_started").await;

    bob.join("rust");

    let stopped = alice.expect("typing_stopped").await;
    match stopped {
        ServerEvent::TypingStopped { room, identity } => {
            assert_eq!(room.as_str(), "lobby");
            assert_eq!(identity, IdentityId::new("u-bob"));
        }
        other => panic!("unexpected event {other:?}"),
    }
    alice.expect("left").await;
    bob.expect("room_backlog").await;

    // The decay timer was cancelled along with the state
    alice.assert_silent().await;
    bob.assert_silent().await;
}

#[tokio::test(start_paused = true)]
async fn test_disconnect_clears_typing() {
    let harness = TestHarness::start();

    let (mut alice, ..) = harness.connect_ready(ALICE_TOKEN).await;
    let (mut bob, ..) = harness.connect_ready(BOB_TOKEN).await;
    alice.expect("joined").await;

    bob.typing();
    alice.expect("typing_started").await;

    bob.disconnect();

    alice.expect("typing_stopped").await;
    alice.expect("left").await;
    alice.assert_silent().await;
}

#[tokio::test(start_paused = true)]
async fn test_messages_stay_inside_their_room() {
    let harness = TestHarness::start();

    let (mut alice, ..) = harness.connect_ready(ALICE_TOKEN).await;
    let (mut bob, ..) = harness.connect_ready(BOB_TOKEN).await;
    alice.expect("joined").await;
    let (mut carol, ..) = harness.connect_ready(CAROL_TOKEN).await;
    alice.expect("joined").await;
    bob.expect("joined").await;

    carol.join("rust");
    alice.expect("left").await;
    bob.expect("left").await;
    carol.expect("room_backlog").await;

    carol.send("anyone here?");
    carol.expect("message").await;

    // Lobby members hear nothing from the other room
    alice.assert_silent().await;
    bob.assert_silent().await;
}
