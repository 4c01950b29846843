//! Self-playing quiz duel demo.
//!
//! Starts an in-process Quizforge server, then drives two scripted
//! WebSocket clients through a complete game over the bundled sample
//! question set: "red" creates the room and always answers correctly,
//! "blue" joins and always picks the first option. Per-question results
//! and the final standings are printed as they arrive.
//!
//! ```text
//! cargo run -p quiz-duel
//! ```

use std::error::Error;
use std::net::SocketAddr;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use quizforge::prelude::*;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

type BoxError = Box<dyn Error + Send + Sync>;

// ---------------------------------------------------------------------------
// Bundled sample question set
// ---------------------------------------------------------------------------

/// The demo's question set. Any client can supply its own via
/// `create_room`; this one ships with the repo so a duel can run out of
/// the box.
fn sample_questions() -> Vec<Question> {
    vec![
        Question {
            text: "Which planet is known as the Red Planet?".into(),
            options: vec![
                "Mars".into(),
                "Venus".into(),
                "Jupiter".into(),
                "Mercury".into(),
            ],
            correct_index: 0,
            explanation: Some(
                "Iron oxide dust gives Mars its reddish color.".into(),
            ),
        },
        Question {
            text: "What is the largest ocean on Earth?".into(),
            options: vec![
                "Atlantic".into(),
                "Pacific".into(),
                "Indian".into(),
                "Arctic".into(),
            ],
            correct_index: 1,
            explanation: Some(
                "The Pacific covers about a third of the planet's surface."
                    .into(),
            ),
        },
        Question {
            text: "Which element has the chemical symbol O?".into(),
            options: vec![
                "Osmium".into(),
                "Gold".into(),
                "Oxygen".into(),
                "Tin".into(),
            ],
            correct_index: 2,
            explanation: None,
        },
        Question {
            text: "How many continents are there?".into(),
            options: vec!["five".into(), "six".into(), "seven".into()],
            correct_index: 2,
            explanation: None,
        },
        Question {
            text: "What year did the first human land on the Moon?".into(),
            options: vec![
                "1959".into(),
                "1969".into(),
                "1972".into(),
                "1981".into(),
            ],
            correct_index: 1,
            explanation: Some("Apollo 11 touched down in July 1969.".into()),
        },
    ]
}

/// Shortened timings so the demo finishes in a few seconds. A real
/// deployment keeps `RoomConfig::default()` — the protocol constants.
fn demo_config() -> RoomConfig {
    RoomConfig {
        countdown: Duration::from_millis(500),
        question_time_limit: Duration::from_millis(5_000),
        inter_question_pause: Duration::from_millis(500),
        ..RoomConfig::default()
    }
}

// ---------------------------------------------------------------------------
// Scripted clients
// ---------------------------------------------------------------------------

struct Client {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl Client {
    async fn connect(addr: SocketAddr) -> Result<Self, BoxError> {
        let url = format!("ws://{addr}");
        let (ws, _resp) =
            tokio_tungstenite::connect_async(url.as_str()).await?;
        Ok(Self { ws })
    }

    async fn send(&mut self, intent: &ClientIntent) -> Result<(), BoxError> {
        let json = serde_json::to_string(intent)?;
        self.ws.send(Message::Text(json.into())).await?;
        Ok(())
    }

    async fn next(&mut self) -> Result<ServerEvent, BoxError> {
        loop {
            let msg = self
                .ws
                .next()
                .await
                .ok_or("connection closed mid-game")??;
            if let Message::Text(text) = msg {
                return Ok(serde_json::from_str(text.as_str())?);
            }
        }
    }
}

/// The guest: joins the room and always picks the first option.
async fn run_guest(
    addr: SocketAddr,
    code: RoomCode,
) -> Result<(), BoxError> {
    let mut client = Client::connect(addr).await?;
    client
        .send(&ClientIntent::JoinRoom {
            room_id: code,
            player_name: "blue".into(),
        })
        .await?;

    loop {
        match client.next().await? {
            ServerEvent::NewQuestion { .. } => {
                client
                    .send(&ClientIntent::SubmitAnswer { answer: 0 })
                    .await?;
            }
            ServerEvent::GameEnded { .. } => return Ok(()),
            _ => {}
        }
    }
}

/// The host: creates the room with the sample set, answers every
/// question correctly, and narrates the game.
async fn run_host(addr: SocketAddr) -> Result<(), BoxError> {
    let questions = sample_questions();
    let mut client = Client::connect(addr).await?;
    client
        .send(&ClientIntent::CreateRoom {
            player_name: "red".into(),
            question_set: questions.clone(),
        })
        .await?;

    let code = loop {
        match client.next().await? {
            ServerEvent::RoomCreated {
                success: true,
                room_id: Some(code),
                ..
            } => break code,
            ServerEvent::RoomCreated { message, .. } => {
                return Err(format!(
                    "room creation failed: {}",
                    message.unwrap_or_default()
                )
                .into());
            }
            _ => {}
        }
    };
    println!("room {code} open, waiting for an opponent");

    let guest = tokio::spawn(run_guest(addr, code));

    loop {
        match client.next().await? {
            ServerEvent::PlayerJoined {
                player_name,
                total_players,
                ..
            } => {
                println!("{player_name} joined ({total_players}/2)");
            }
            ServerEvent::NewQuestion {
                question_index,
                question,
                ..
            } => {
                println!("Q{}: {}", question_index + 1, question.text);
                let answer = questions[question_index].correct_index;
                client
                    .send(&ClientIntent::SubmitAnswer { answer })
                    .await?;
            }
            ServerEvent::QuestionResults {
                correct_answer,
                results,
                ..
            } => {
                println!("  correct: {correct_answer}");
                for r in &results {
                    println!(
                        "  {}: +{} (total {})",
                        r.player_name, r.points_earned, r.total_score
                    );
                }
            }
            ServerEvent::GameEnded {
                results,
                game_result,
                winner,
            } => {
                println!("game over: {game_result:?}");
                if let Some(winner) = winner {
                    println!("winner: {winner}");
                }
                for standing in &results {
                    println!(
                        "  {} — {}",
                        standing.player_name, standing.total_score
                    );
                }
                break;
            }
            _ => {}
        }
    }

    guest.await??;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    eprintln!("starting quiz duel demo");

    let server = QuizServer::builder()
        .bind("127.0.0.1:0")
        .room_config(demo_config())
        .build()
        .await?;
    let addr = server.local_addr()?;
    tokio::spawn(server.run());

    run_host(addr).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_questions_are_structurally_valid() {
        let questions = sample_questions();
        assert!(questions.len() >= 2);
        for question in &questions {
            question.validate().unwrap();
        }
    }

    #[tokio::test]
    async fn test_demo_duel_plays_to_completion() {
        let server = QuizServer::builder()
            .bind("127.0.0.1:0")
            .room_config(RoomConfig {
                countdown: Duration::from_millis(20),
                question_time_limit: Duration::from_millis(500),
                inter_question_pause: Duration::from_millis(20),
                ..RoomConfig::default()
            })
            .build()
            .await
            .unwrap();
        let addr = server.local_addr().unwrap();
        tokio::spawn(server.run());

        tokio::time::timeout(Duration::from_secs(10), run_host(addr))
            .await
            .expect("demo duel timed out")
            .expect("demo duel failed");
    }
}
