#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::indexing_slicing
)]
//! Integration tests for [`GameClient`] against a real in-process server.
//!
//! Each test connects one or two clients over [`LocalTransport`] pairs and
//! checks what the handle reports: acknowledgements, tracked state, events
//! and the [`MatchView`] folded from them.
//!
//! [`GameClient`]: fading_tictactoe::GameClient
//! [`LocalTransport`]: fading_tictactoe::LocalTransport
//! [`MatchView`]: fading_tictactoe::MatchView

mod common;

use common::{connect_client, next_matching, spawn_server};
use fading_tictactoe::{
    ClientConfig, ErrorCode, GameClient, GameError, GameEvent, LocalTransport, MatchStatus,
    MatchView, Symbol, Transport,
};
use tokio::sync::mpsc;

/// Feed every event currently queued into `view` until `pred` holds for one
/// of them.
async fn fold_until(
    view: &mut MatchView,
    events: &mut mpsc::Receiver<GameEvent>,
    pred: impl Fn(&GameEvent) -> bool,
) {
    loop {
        let event = tokio::time::timeout(common::STEP_TIMEOUT, events.recv())
            .await
            .expect("timed out waiting for an event")
            .expect("event channel closed");
        view.apply(&event);
        if pred(&event) {
            return;
        }
    }
}

// ════════════════════════════════════════════════════════════════════
// Seating
// ════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn welcome_sets_connection_id() {
    let server = spawn_server();
    let (client, _events) = connect_client(&server).await;

    assert!(client.is_connected());
    assert!(client.connection_id().await.is_some());
    assert_eq!(client.current_room_id().await, None);
    assert_eq!(client.symbol().await, None);
}

#[tokio::test]
async fn create_then_join_tracks_room_and_symbols() {
    let server = spawn_server();
    let (alice, _alice_events) = connect_client(&server).await;
    let (bob, mut bob_events) = connect_client(&server).await;

    let ack = alice.create_room().await.unwrap();
    assert!(ack.success);
    let room = ack.room_id.unwrap();
    assert_eq!(alice.current_room_id().await.as_deref(), Some(room.as_str()));
    assert_eq!(alice.symbol().await, Some(Symbol::O));

    let ack = bob.join_room(room.clone()).await.unwrap();
    assert_eq!(ack.symbol, Some(Symbol::X));
    assert_eq!(bob.symbol().await, Some(Symbol::X));

    let start = next_matching(&mut bob_events, |e| matches!(e, GameEvent::GameStart { .. })).await;
    let GameEvent::GameStart { current_turn, .. } = start else {
        unreachable!()
    };
    assert_eq!(Some(current_turn), alice.connection_id().await);
}

#[tokio::test]
async fn failed_join_is_an_ack_not_an_error() {
    let server = spawn_server();
    let (client, _events) = connect_client(&server).await;

    let ack = client.join_room("MISSING").await.unwrap();
    assert!(!ack.success);
    assert_eq!(ack.error_code, Some(ErrorCode::RoomNotFound));
    assert_eq!(client.current_room_id().await, None);
}

#[tokio::test]
async fn ack_also_arrives_as_event() {
    let server = spawn_server();
    let (client, mut events) = connect_client(&server).await;

    let ack = client.create_room().await.unwrap();
    let event = next_matching(&mut events, |e| matches!(e, GameEvent::Acknowledged { .. })).await;
    assert_eq!(
        event,
        GameEvent::Acknowledged {
            request_id: 1,
            ack
        }
    );
}

// ════════════════════════════════════════════════════════════════════
// A full match seen through MatchView
// ════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn full_match_projects_into_views() {
    let server = spawn_server();
    let (alice, mut alice_events) = connect_client(&server).await;
    let (bob, mut bob_events) = connect_client(&server).await;

    let mut alice_view = MatchView::new();
    alice_view.connected = true;
    alice_view.my_id = alice.connection_id().await;
    let mut bob_view = MatchView::new();
    bob_view.connected = true;
    bob_view.my_id = bob.connection_id().await;

    let room = alice.create_room().await.unwrap().room_id.unwrap();
    fold_until(&mut alice_view, &mut alice_events, |e| {
        matches!(e, GameEvent::Acknowledged { .. })
    })
    .await;
    assert_eq!(alice_view.status(), MatchStatus::WaitingForOpponent);

    bob.join_room(room.clone()).await.unwrap();
    for (view, events) in [
        (&mut alice_view, &mut alice_events),
        (&mut bob_view, &mut bob_events),
    ] {
        fold_until(view, events, |e| matches!(e, GameEvent::GameStart { .. })).await;
    }
    assert_eq!(alice_view.status(), MatchStatus::YourTurn);
    assert_eq!(bob_view.status(), MatchStatus::OpponentsTurn);
    assert!(alice_view.can_move(4));
    assert!(!bob_view.can_move(4));

    // O takes the main diagonal while X plays the top row's right side.
    for (by_alice, position) in [(true, 0), (false, 1), (true, 4), (false, 2)] {
        let client = if by_alice { &alice } else { &bob };
        let ack = client.make_move(room.clone(), position).await.unwrap();
        assert!(ack.success);
        assert_eq!(ack.game_over, None);
        for (view, events) in [
            (&mut alice_view, &mut alice_events),
            (&mut bob_view, &mut bob_events),
        ] {
            fold_until(view, events, |e| matches!(e, GameEvent::MoveMade { .. })).await;
        }
    }
    assert_eq!(alice_view.board.count(Symbol::O), 2);
    assert_eq!(bob_view.board, alice_view.board);

    let ack = alice.make_move(room.clone(), 8).await.unwrap();
    assert_eq!(ack.game_over, Some(true));
    for (view, events) in [
        (&mut alice_view, &mut alice_events),
        (&mut bob_view, &mut bob_events),
    ] {
        fold_until(view, events, |e| matches!(e, GameEvent::GameOver { .. })).await;
    }
    assert_eq!(alice_view.status(), MatchStatus::Won);
    assert_eq!(bob_view.status(), MatchStatus::Lost);
    assert_eq!(alice_view.winning_line, Some([0, 4, 8]));
    assert!(!alice_view.can_move(5));

    // The winner held the turn, so the loser opens the rematch.
    let ack = bob.restart_game(room.clone()).await.unwrap();
    assert!(ack.success);
    for (view, events) in [
        (&mut alice_view, &mut alice_events),
        (&mut bob_view, &mut bob_events),
    ] {
        fold_until(view, events, |e| matches!(e, GameEvent::GameRestart { .. })).await;
    }
    assert_eq!(bob_view.status(), MatchStatus::YourTurn);
    assert_eq!(alice_view.status(), MatchStatus::OpponentsTurn);
    assert_eq!(alice_view.board, fading_tictactoe::Board::EMPTY);
    assert_eq!(alice_view.winner, None);
}

#[tokio::test]
async fn opponent_leaving_shows_in_view() {
    let server = spawn_server();
    let (alice, mut alice_events) = connect_client(&server).await;
    let (mut bob, _bob_events) = connect_client(&server).await;

    let mut view = MatchView::new();
    view.connected = true;
    view.my_id = alice.connection_id().await;

    let room = alice.create_room().await.unwrap().room_id.unwrap();
    bob.join_room(room).await.unwrap();
    fold_until(&mut view, &mut alice_events, |e| {
        matches!(e, GameEvent::GameStart { .. })
    })
    .await;

    bob.shutdown().await;
    assert!(!bob.is_connected());

    fold_until(&mut view, &mut alice_events, |e| {
        matches!(e, GameEvent::GameOver { .. })
    })
    .await;
    assert!(view.opponent_left);
    assert_eq!(view.status(), MatchStatus::OpponentLeft);
    assert_eq!(view.status().to_string(), "Opponent left the game");
}

// ════════════════════════════════════════════════════════════════════
// Lifecycle
// ════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn requests_fail_after_shutdown() {
    let server = spawn_server();
    let (mut client, mut events) = connect_client(&server).await;

    client.shutdown().await;
    let last = next_matching(&mut events, |e| matches!(e, GameEvent::Disconnected { .. })).await;
    assert_eq!(
        last,
        GameEvent::Disconnected {
            reason: Some("client shut down".into())
        }
    );

    let err = client.create_room().await.unwrap_err();
    assert!(matches!(err, GameError::TransportDisconnected));
}

#[tokio::test]
async fn unanswered_request_times_out() {
    // A peer that accepts frames but never answers them.
    let (client_end, _silent_peer) = LocalTransport::pair();
    let config = ClientConfig::new().with_request_timeout(std::time::Duration::from_millis(50));
    let (client, _events) = GameClient::start(client_end, config);

    let err = client.create_room().await.unwrap_err();
    assert!(matches!(err, GameError::Timeout));
    assert!(client.is_connected());
}

#[tokio::test]
async fn server_closing_the_connection_disconnects_the_client() {
    let (client_end, mut server_end) = LocalTransport::pair();
    let (client, mut events) = GameClient::start(client_end, ClientConfig::new());

    server_end.close().await.unwrap();

    let last = next_matching(&mut events, |e| matches!(e, GameEvent::Disconnected { .. })).await;
    assert_eq!(last, GameEvent::Disconnected { reason: None });
    assert!(!client.is_connected());
}
