//! Integration tests for the Quizforge server: real WebSocket clients
//! against a real listener, driving full games end to end.
//!
//! Room timings are shrunk so a complete duel finishes in well under a
//! second of wall time.

use std::net::SocketAddr;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use quizforge::prelude::*;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

// =========================================================================
// Harness
// =========================================================================

fn fast_config() -> RoomConfig {
    RoomConfig {
        countdown: Duration::from_millis(50),
        question_time_limit: Duration::from_millis(300),
        inter_question_pause: Duration::from_millis(50),
        retention: Duration::from_millis(200),
        ..RoomConfig::default()
    }
}

async fn start_server(config: RoomConfig) -> SocketAddr {
    let server = QuizServer::builder()
        .bind("127.0.0.1:0")
        .room_config(config)
        .build()
        .await
        .expect("server should bind");
    let addr = server.local_addr().expect("listener has an address");
    tokio::spawn(server.run());
    addr
}

struct Client {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl Client {
    async fn connect(addr: SocketAddr) -> Self {
        let url = format!("ws://{addr}");
        let (ws, _resp) = tokio_tungstenite::connect_async(url.as_str())
            .await
            .expect("client should connect");
        Self { ws }
    }

    async fn send(&mut self, intent: &ClientIntent) {
        let json = serde_json::to_string(intent).unwrap();
        self.ws
            .send(Message::Text(json.into()))
            .await
            .expect("send should succeed");
    }

    async fn send_raw(&mut self, text: &str) {
        self.ws
            .send(Message::Text(text.to_string().into()))
            .await
            .expect("send should succeed");
    }

    /// Next server event, with a generous deadline.
    async fn next(&mut self) -> ServerEvent {
        loop {
            let msg = tokio::time::timeout(
                Duration::from_secs(2),
                self.ws.next(),
            )
            .await
            .expect("timed out waiting for an event")
            .expect("stream ended unexpectedly")
            .expect("websocket error");

            match msg {
                Message::Text(text) => {
                    return serde_json::from_str(text.as_str())
                        .expect("server sent unparseable event");
                }
                _ => continue,
            }
        }
    }

    /// Skips ahead to the first event matching `pred`.
    async fn next_matching(
        &mut self,
        pred: impl Fn(&ServerEvent) -> bool,
    ) -> ServerEvent {
        loop {
            let event = self.next().await;
            if pred(&event) {
                return event;
            }
        }
    }
}

fn sample_questions(count: usize) -> Vec<Question> {
    (0..count)
        .map(|i| Question {
            text: format!("Question {i}?"),
            options: vec!["alpha".into(), "beta".into(), "gamma".into()],
            correct_index: 1,
            explanation: None,
        })
        .collect()
}

/// Creates a room as `host` and returns its code.
async fn create_room(host: &mut Client, questions: Vec<Question>) -> RoomCode {
    host.send(&ClientIntent::CreateRoom {
        player_name: "ada".into(),
        question_set: questions,
    })
    .await;

    // The host's own seating broadcast arrives first, then the reply.
    let event = host
        .next_matching(|e| matches!(e, ServerEvent::RoomCreated { .. }))
        .await;
    match event {
        ServerEvent::RoomCreated {
            success: true,
            room_id: Some(code),
            ..
        } => code,
        other => panic!("room creation failed: {other:?}"),
    }
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn test_create_room_returns_valid_code() {
    let addr = start_server(fast_config()).await;
    let mut host = Client::connect(addr).await;

    let code = create_room(&mut host, sample_questions(1)).await;
    assert_eq!(code.as_str().len(), 6);
    assert!(code
        .as_str()
        .bytes()
        .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit()));
}

#[tokio::test]
async fn test_join_starts_the_game() {
    let addr = start_server(fast_config()).await;
    let mut host = Client::connect(addr).await;
    let mut guest = Client::connect(addr).await;

    let code = create_room(&mut host, sample_questions(1)).await;

    guest
        .send(&ClientIntent::JoinRoom {
            room_id: code.clone(),
            player_name: "grace".into(),
        })
        .await;

    // Guest: own seating broadcast, game start, then the join reply.
    assert!(matches!(
        guest.next().await,
        ServerEvent::PlayerJoined { player_name, total_players, .. }
            if player_name == "grace" && total_players == 2
    ));
    assert!(matches!(
        guest.next().await,
        ServerEvent::GameStarted { total_questions: 1 }
    ));
    assert!(matches!(
        guest.next().await,
        ServerEvent::RoomJoined { success: true, room_id: Some(id), .. }
            if id == code
    ));

    // Host sees the guest arrive and the game start.
    assert!(matches!(
        host.next().await,
        ServerEvent::PlayerJoined { player_name, .. }
            if player_name == "grace"
    ));
    assert!(matches!(host.next().await, ServerEvent::GameStarted { .. }));

    // Countdown elapses, first question goes out to both.
    assert!(matches!(
        host.next().await,
        ServerEvent::NewQuestion { question_index: 0, .. }
    ));
    assert!(matches!(
        guest.next().await,
        ServerEvent::NewQuestion { question_index: 0, .. }
    ));
}

#[tokio::test]
async fn test_join_unknown_room_reports_not_found() {
    let addr = start_server(fast_config()).await;
    let mut client = Client::connect(addr).await;

    client
        .send(&ClientIntent::JoinRoom {
            room_id: RoomCode::parse("ZZZZZ0").unwrap(),
            player_name: "grace".into(),
        })
        .await;

    match client.next().await {
        ServerEvent::RoomJoined {
            success: false,
            error: Some(kind),
            ..
        } => assert_eq!(kind, ErrorKind::RoomNotFound),
        other => panic!("expected failed room_joined, got {other:?}"),
    }
}

#[tokio::test]
async fn test_third_client_is_rejected() {
    let addr = start_server(fast_config()).await;
    let mut host = Client::connect(addr).await;
    let mut guest = Client::connect(addr).await;
    let mut third = Client::connect(addr).await;

    let code = create_room(&mut host, sample_questions(1)).await;
    guest
        .send(&ClientIntent::JoinRoom {
            room_id: code.clone(),
            player_name: "grace".into(),
        })
        .await;
    guest
        .next_matching(|e| matches!(e, ServerEvent::RoomJoined { .. }))
        .await;

    third
        .send(&ClientIntent::JoinRoom {
            room_id: code,
            player_name: "carol".into(),
        })
        .await;
    match third.next().await {
        ServerEvent::RoomJoined {
            success: false,
            error: Some(kind),
            ..
        } => assert_eq!(kind, ErrorKind::RoomFull),
        other => panic!("expected failed room_joined, got {other:?}"),
    }
}

#[tokio::test]
async fn test_full_duel_produces_winner() {
    let addr = start_server(fast_config()).await;
    let mut host = Client::connect(addr).await;
    let mut guest = Client::connect(addr).await;

    let code = create_room(&mut host, sample_questions(2)).await;
    guest
        .send(&ClientIntent::JoinRoom {
            room_id: code,
            player_name: "grace".into(),
        })
        .await;

    for _round in 0..2 {
        host.next_matching(|e| matches!(e, ServerEvent::NewQuestion { .. }))
            .await;
        guest
            .next_matching(|e| matches!(e, ServerEvent::NewQuestion { .. }))
            .await;

        // Host answers correctly, guest wrong.
        host.send(&ClientIntent::SubmitAnswer { answer: 1 }).await;
        guest.send(&ClientIntent::SubmitAnswer { answer: 0 }).await;

        assert!(matches!(
            host.next_matching(
                |e| matches!(e, ServerEvent::AnswerReceived { .. })
            )
            .await,
            ServerEvent::AnswerReceived { success: true }
        ));

        let results = match host
            .next_matching(
                |e| matches!(e, ServerEvent::QuestionResults { .. }),
            )
            .await
        {
            ServerEvent::QuestionResults {
                correct_answer,
                results,
                ..
            } => {
                assert_eq!(correct_answer, "beta");
                results
            }
            other => panic!("expected question_results, got {other:?}"),
        };
        let ada = results.iter().find(|r| r.player_name == "ada").unwrap();
        let grace =
            results.iter().find(|r| r.player_name == "grace").unwrap();
        assert!(ada.is_correct);
        assert!(ada.points_earned >= 100);
        assert!(!grace.is_correct);
        assert_eq!(grace.points_earned, 0);
    }

    match host
        .next_matching(|e| matches!(e, ServerEvent::GameEnded { .. }))
        .await
    {
        ServerEvent::GameEnded {
            results,
            game_result,
            winner,
        } => {
            assert_eq!(game_result, GameOutcome::Winner);
            assert_eq!(winner.as_deref(), Some("ada"));
            assert_eq!(results[0].player_name, "ada");
            assert_eq!(results[1].total_score, 0);
        }
        other => panic!("expected game_ended, got {other:?}"),
    }

    // Guest receives the same closing broadcast.
    assert!(matches!(
        guest
            .next_matching(|e| matches!(e, ServerEvent::GameEnded { .. }))
            .await,
        ServerEvent::GameEnded { .. }
    ));
}

#[tokio::test]
async fn test_unanswered_question_resolves_on_deadline() {
    let addr = start_server(fast_config()).await;
    let mut host = Client::connect(addr).await;
    let mut guest = Client::connect(addr).await;

    let code = create_room(&mut host, sample_questions(1)).await;
    guest
        .send(&ClientIntent::JoinRoom {
            room_id: code,
            player_name: "grace".into(),
        })
        .await;

    host.next_matching(|e| matches!(e, ServerEvent::NewQuestion { .. }))
        .await;

    // Nobody answers; the 300ms limit forces resolution.
    match host
        .next_matching(|e| matches!(e, ServerEvent::QuestionResults { .. }))
        .await
    {
        ServerEvent::QuestionResults { results, .. } => {
            assert_eq!(results.len(), 2);
            assert!(results.iter().all(|r| r.answer.is_none()));
            assert!(results.iter().all(|r| r.points_earned == 0));
        }
        other => panic!("expected question_results, got {other:?}"),
    }
}

#[tokio::test]
async fn test_answer_without_room_is_stale() {
    let addr = start_server(fast_config()).await;
    let mut client = Client::connect(addr).await;

    client.send(&ClientIntent::SubmitAnswer { answer: 0 }).await;
    match client.next().await {
        ServerEvent::Error { code, .. } => {
            assert_eq!(code, ErrorKind::StaleConnection);
        }
        other => panic!("expected error event, got {other:?}"),
    }
}

#[tokio::test]
async fn test_malformed_intent_is_reported_not_fatal() {
    let addr = start_server(fast_config()).await;
    let mut client = Client::connect(addr).await;

    client.send_raw("this is not json").await;
    assert!(matches!(
        client.next().await,
        ServerEvent::Error { code: ErrorKind::InvalidState, .. }
    ));

    // The connection survives and still serves intents.
    let code = create_room(&mut client, sample_questions(1)).await;
    assert_eq!(code.as_str().len(), 6);
}

#[tokio::test]
async fn test_empty_question_set_rejected() {
    let addr = start_server(fast_config()).await;
    let mut client = Client::connect(addr).await;

    client
        .send(&ClientIntent::CreateRoom {
            player_name: "ada".into(),
            question_set: vec![],
        })
        .await;
    match client.next().await {
        ServerEvent::RoomCreated {
            success: false,
            message: Some(msg),
            ..
        } => assert!(msg.contains("question set")),
        other => panic!("expected failed room_created, got {other:?}"),
    }
}

#[tokio::test]
async fn test_disconnect_mid_game_abandons() {
    let addr = start_server(fast_config()).await;
    let mut host = Client::connect(addr).await;
    let mut guest = Client::connect(addr).await;

    let code = create_room(&mut host, sample_questions(3)).await;
    guest
        .send(&ClientIntent::JoinRoom {
            room_id: code,
            player_name: "grace".into(),
        })
        .await;
    guest
        .next_matching(|e| matches!(e, ServerEvent::NewQuestion { .. }))
        .await;

    drop(host);

    assert!(matches!(
        guest
            .next_matching(|e| matches!(e, ServerEvent::PlayerLeft { .. }))
            .await,
        ServerEvent::PlayerLeft { .. }
    ));
    match guest
        .next_matching(|e| matches!(e, ServerEvent::GameEnded { .. }))
        .await
    {
        ServerEvent::GameEnded {
            game_result,
            winner,
            ..
        } => {
            assert_eq!(game_result, GameOutcome::Abandoned);
            assert!(winner.is_none());
        }
        other => panic!("expected game_ended, got {other:?}"),
    }
}

#[tokio::test]
async fn test_room_purged_after_retention() {
    let addr = start_server(fast_config()).await;
    let mut host = Client::connect(addr).await;
    let mut guest = Client::connect(addr).await;

    let code = create_room(&mut host, sample_questions(1)).await;
    guest
        .send(&ClientIntent::JoinRoom {
            room_id: code.clone(),
            player_name: "grace".into(),
        })
        .await;

    host.next_matching(|e| matches!(e, ServerEvent::NewQuestion { .. }))
        .await;
    host.send(&ClientIntent::SubmitAnswer { answer: 1 }).await;
    guest
        .next_matching(|e| matches!(e, ServerEvent::NewQuestion { .. }))
        .await;
    guest.send(&ClientIntent::SubmitAnswer { answer: 1 }).await;

    host.next_matching(|e| matches!(e, ServerEvent::GameEnded { .. }))
        .await;

    // Give retention (200ms) time to elapse and the reaper to run.
    tokio::time::sleep(Duration::from_millis(500)).await;

    let mut late = Client::connect(addr).await;
    late.send(&ClientIntent::JoinRoom {
        room_id: code,
        player_name: "carol".into(),
    })
    .await;
    match late.next().await {
        ServerEvent::RoomJoined {
            success: false,
            error: Some(kind),
            ..
        } => assert_eq!(kind, ErrorKind::RoomNotFound),
        other => panic!("expected failed room_joined, got {other:?}"),
    }
}
