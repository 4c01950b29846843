//! # Quizforge
//!
//! Real-time two-player quiz duel server over WebSockets.
//!
//! Two players share a room identified by a 6-character join code and
//! race through a fixed sequence of multiple-choice questions. Faster
//! correct answers score more; the room resolves each question exactly
//! once, as soon as both have answered or the time limit elapses.
//!
//! This crate ties the layers together: `quizforge-transport` carries
//! the WebSocket traffic, `quizforge-protocol` defines the JSON wire
//! format, and `quizforge-room` runs each game as its own actor task.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use quizforge::prelude::*;
//!
//! # async fn run() -> Result<(), QuizforgeError> {
//! let server = QuizServer::builder()
//!     .bind("0.0.0.0:8080")
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod error;
mod handler;
mod server;

pub use error::QuizforgeError;
pub use server::{QuizServer, QuizServerBuilder};

/// Common imports for building and running a Quizforge server.
pub mod prelude {
    pub use crate::{QuizServer, QuizServerBuilder, QuizforgeError};
    pub use quizforge_protocol::{
        consts, AnswerResult, ClientIntent, Codec, ErrorKind, FinalStanding,
        GameOutcome, JsonCodec, PlayerId, PublicQuestion, Question, RoomCode,
        ServerEvent,
    };
    pub use quizforge_room::{RoomConfig, RoomPhase};
}
