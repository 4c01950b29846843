//! Per-connection handler: intent routing and room binding.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Derive the PlayerId from the connection id
//!   2. Spawn the outbound pump (room events → socket)
//!   3. Loop: receive intents → dispatch to the registry / bound room
//!   4. On close: unbind and deliver the leave to the room
//!
//! Every outbound message — direct replies and room broadcasts alike —
//! goes through the single event channel, so a client always sees its
//! `answer_received` ack before the `question_results` that answer
//! triggered.

use std::sync::Arc;

use quizforge_protocol::{
    consts::MAX_PLAYER_NAME_LEN, ClientIntent, Codec, ErrorKind, PlayerId,
    Question, RoomCode, ServerEvent,
};
use quizforge_room::{EventSender, RoomError};
use quizforge_transport::{Connection, WebSocketConnection};
use tokio::sync::mpsc;

use crate::server::ServerState;
use crate::QuizforgeError;

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection(
    conn: WebSocketConnection,
    state: Arc<ServerState>,
) -> Result<(), QuizforgeError> {
    let conn_id = conn.id();
    let player_id = PlayerId(conn_id.into_inner());
    tracing::debug!(%conn_id, %player_id, "handling new connection");

    // Outbound pump: everything destined for this client funnels through
    // one channel and one writer task.
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<ServerEvent>();
    let pump_conn = conn.clone();
    let codec = state.codec;
    let pump = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            let bytes = match codec.encode(&event) {
                Ok(bytes) => bytes,
                Err(e) => {
                    tracing::error!(error = %e, "failed to encode event");
                    continue;
                }
            };
            if let Err(e) = pump_conn.send(&bytes).await {
                tracing::debug!(error = %e, "outbound send failed");
                break;
            }
        }
    });

    // Inbound loop.
    loop {
        let data = match conn.recv().await {
            Ok(Some(data)) => data,
            Ok(None) => {
                tracing::info!(%player_id, "connection closed cleanly");
                break;
            }
            Err(e) => {
                tracing::debug!(%player_id, error = %e, "recv error");
                break;
            }
        };

        let intent: ClientIntent = match state.codec.decode(&data) {
            Ok(intent) => intent,
            Err(e) => {
                tracing::debug!(
                    %player_id, error = %e, "failed to decode intent"
                );
                send_error(
                    &event_tx,
                    ErrorKind::InvalidState,
                    &format!("malformed message: {e}"),
                );
                continue;
            }
        };

        dispatch_intent(&state, player_id, &event_tx, intent).await;
    }

    // Disconnect: unbind first, then deliver the leave outside the
    // registry lock so a busy room can't stall other connections.
    let room = state.rooms.lock().await.disconnect(player_id);
    if let Some(room) = room {
        if let Err(e) = room.leave(player_id).await {
            tracing::debug!(%player_id, error = %e, "leave delivery failed");
        }
    }

    drop(event_tx);
    pump.abort();
    Ok(())
}

/// Routes one decoded intent. Intent failures are reported to the client
/// and never tear down the connection.
async fn dispatch_intent(
    state: &Arc<ServerState>,
    player_id: PlayerId,
    event_tx: &EventSender,
    intent: ClientIntent,
) {
    match intent {
        ClientIntent::CreateRoom {
            player_name,
            question_set,
        } => {
            handle_create_room(
                state,
                player_id,
                event_tx,
                player_name,
                question_set,
            )
            .await;
        }
        ClientIntent::JoinRoom {
            room_id,
            player_name,
        } => {
            handle_join_room(state, player_id, event_tx, room_id, player_name)
                .await;
        }
        ClientIntent::SubmitAnswer { answer } => {
            handle_submit_answer(state, player_id, event_tx, answer).await;
        }
    }
}

async fn handle_create_room(
    state: &Arc<ServerState>,
    player_id: PlayerId,
    event_tx: &EventSender,
    player_name: String,
    question_set: Vec<Question>,
) {
    let name = player_name.trim().to_string();
    if let Err(message) = validate_name(&name) {
        send_event(
            event_tx,
            ServerEvent::RoomCreated {
                success: false,
                room_id: None,
                message: Some(message),
            },
        );
        return;
    }
    if let Err(message) = validate_questions(&question_set) {
        send_event(
            event_tx,
            ServerEvent::RoomCreated {
                success: false,
                room_id: None,
                message: Some(message),
            },
        );
        return;
    }

    // One room per connection. Creation seats the host and records the
    // binding in one step, so there is no window where the room exists
    // without its host.
    let result = {
        let mut rooms = state.rooms.lock().await;
        if rooms.binding(player_id).is_some() {
            send_error(
                event_tx,
                ErrorKind::InvalidState,
                "already seated in a room",
            );
            return;
        }
        rooms.create_room(player_id, name, event_tx.clone(), question_set)
    };

    match result {
        Ok(handle) => {
            let code = handle.code().clone();
            tracing::info!(%player_id, %code, "room created");
            send_event(
                event_tx,
                ServerEvent::RoomCreated {
                    success: true,
                    room_id: Some(code),
                    message: None,
                },
            );
        }
        Err(e) => {
            tracing::warn!(%player_id, error = %e, "create failed");
            send_event(
                event_tx,
                ServerEvent::RoomCreated {
                    success: false,
                    room_id: None,
                    message: Some(e.to_string()),
                },
            );
        }
    }
}

async fn handle_join_room(
    state: &Arc<ServerState>,
    player_id: PlayerId,
    event_tx: &EventSender,
    room_id: RoomCode,
    player_name: String,
) {
    let name = player_name.trim().to_string();
    if let Err(message) = validate_name(&name) {
        send_event(
            event_tx,
            ServerEvent::RoomJoined {
                success: false,
                room_id: None,
                error: Some(ErrorKind::InvalidState),
                message: Some(message),
            },
        );
        return;
    }

    let lookup = {
        let mut rooms = state.rooms.lock().await;
        if rooms.binding(player_id).is_some() {
            send_error(
                event_tx,
                ErrorKind::InvalidState,
                "already seated in a room",
            );
            return;
        }
        // Bind optimistically so a concurrent intent from the same
        // connection can't double-join; rolled back on failure.
        let lookup = rooms.get(&room_id);
        if lookup.is_ok() {
            rooms.bind(player_id, room_id.clone());
        }
        lookup
    };

    let result = match lookup {
        Ok(handle) => handle.join(player_id, name, event_tx.clone()).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => {
            tracing::info!(%player_id, code = %room_id, "player joined room");
            send_event(
                event_tx,
                ServerEvent::RoomJoined {
                    success: true,
                    room_id: Some(room_id),
                    error: None,
                    message: None,
                },
            );
        }
        Err(e) => {
            state.rooms.lock().await.disconnect(player_id);
            send_event(
                event_tx,
                ServerEvent::RoomJoined {
                    success: false,
                    room_id: None,
                    error: Some(e.kind()),
                    message: Some(e.to_string()),
                },
            );
        }
    }
}

async fn handle_submit_answer(
    state: &Arc<ServerState>,
    player_id: PlayerId,
    event_tx: &EventSender,
    answer: usize,
) {
    let handle = {
        let rooms = state.rooms.lock().await;
        match rooms.binding(player_id) {
            Some(code) => rooms.get(code),
            None => Err(RoomError::Stale(player_id)),
        }
    };

    let result = match handle {
        Ok(handle) => handle.submit(player_id, answer).await,
        Err(e) => Err(e),
    };

    // The room actor sends the ack on success; only failures are
    // reported from here.
    if let Err(e) = result {
        tracing::debug!(%player_id, error = %e, "answer rejected");
        send_error(event_tx, e.kind(), &e.to_string());
    }
}

fn validate_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("player name must not be empty".into());
    }
    // The limit is in characters, not bytes — multibyte names count by
    // what the player sees.
    if name.chars().count() > MAX_PLAYER_NAME_LEN {
        return Err(format!(
            "player name exceeds {MAX_PLAYER_NAME_LEN} characters"
        ));
    }
    Ok(())
}

fn validate_questions(questions: &[Question]) -> Result<(), String> {
    if questions.is_empty() {
        return Err("question set must not be empty".into());
    }
    for (i, question) in questions.iter().enumerate() {
        if let Err(e) = question.validate() {
            return Err(format!("question {i}: {e}"));
        }
    }
    Ok(())
}

fn send_event(event_tx: &EventSender, event: ServerEvent) {
    // A dead pump means the client is gone; nothing left to report to.
    let _ = event_tx.send(event);
}

fn send_error(event_tx: &EventSender, code: ErrorKind, message: &str) {
    send_event(
        event_tx,
        ServerEvent::Error {
            code,
            message: message.to_string(),
        },
    );
}
