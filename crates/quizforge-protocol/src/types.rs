//! Core protocol types for Quizforge's wire format.
//!
//! Everything a quiz client sends or receives is defined here. The JSON
//! shapes are part of the wire contract: event tags are snake_case
//! (`"new_question"`), field names are camelCase (`"playerName"`), and
//! identifiers serialize as plain values, not wrapped objects.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{ProtocolError, PublicQuestion, Question};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for a player.
///
/// Newtype over the transport connection id — a player's identity lives
/// exactly as long as their connection (reconnection/resume is out of
/// scope). `#[serde(transparent)]` makes `PlayerId(42)` serialize as
/// just `42`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// A room's short join code: exactly 6 uppercase-alphanumeric characters.
///
/// Codes are what players type to join a friend's game, so the charset is
/// deliberately small and unambiguous. Parsing uppercases its input, so
/// `"ab12cd"` and `"AB12CD"` name the same room. Serializes as a plain
/// string; deserialization goes through validation (`try_from`), so a
/// malformed code is a decode error, not a silent bad lookup.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoomCode(String);

impl RoomCode {
    /// Room codes are always exactly this many characters.
    pub const LEN: usize = 6;

    /// The characters a room code may contain.
    pub const ALPHABET: &'static [u8] =
        b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

    /// Parses and normalizes a room code.
    ///
    /// # Errors
    /// Returns [`ProtocolError::InvalidRoomCode`] for the wrong length or
    /// characters outside [`Self::ALPHABET`].
    pub fn parse(s: &str) -> Result<Self, ProtocolError> {
        let code = s.trim().to_ascii_uppercase();
        if code.len() != Self::LEN {
            return Err(ProtocolError::InvalidRoomCode(format!(
                "expected {} characters, got {}",
                Self::LEN,
                code.len()
            )));
        }
        if !code.bytes().all(|b| Self::ALPHABET.contains(&b)) {
            return Err(ProtocolError::InvalidRoomCode(format!(
                "{code:?} contains characters outside A-Z0-9"
            )));
        }
        Ok(Self(code))
    }

    /// The code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for RoomCode {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for RoomCode {
    type Error = ProtocolError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<RoomCode> for String {
    fn from(code: RoomCode) -> Self {
        code.0
    }
}

// ---------------------------------------------------------------------------
// Error kinds
// ---------------------------------------------------------------------------

/// Machine-readable failure kinds reported to clients.
///
/// Every rejected intent carries one of these so clients can branch on
/// the kind instead of string-matching messages. All of them are local
/// and recoverable — a rejection never affects other players or the room.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Join with an unknown room code.
    RoomNotFound,
    /// Join against a room already at capacity.
    RoomFull,
    /// Join after the game started.
    GameAlreadyInProgress,
    /// An intent the room's current state doesn't allow — e.g. an answer
    /// outside `playing`, or after the question already resolved.
    InvalidState,
    /// A second answer from the same connection for the same question.
    DuplicateSubmission,
    /// An intent from a connection with no bound room or player.
    StaleConnection,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::RoomNotFound => "room_not_found",
            Self::RoomFull => "room_full",
            Self::GameAlreadyInProgress => "game_already_in_progress",
            Self::InvalidState => "invalid_state",
            Self::DuplicateSubmission => "duplicate_submission",
            Self::StaleConnection => "stale_connection",
        };
        f.write_str(s)
    }
}

/// How a game concluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameOutcome {
    /// A scored completion with a single highest scorer.
    Winner,
    /// A scored completion with equal final scores.
    Tie,
    /// The player count dropped below two mid-game. Not a scored
    /// completion; no winner is named.
    Abandoned,
}

// ---------------------------------------------------------------------------
// Client → server intents
// ---------------------------------------------------------------------------

/// Messages a client sends to the server.
///
/// `#[serde(tag = "type")]` produces internally tagged JSON:
/// `{ "type": "join_room", "roomId": "AB12CD", "playerName": "ada" }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "snake_case",
    rename_all_fields = "camelCase"
)]
pub enum ClientIntent {
    /// Open a new room seeded with a question sequence; the sender
    /// becomes the host and first seated player.
    CreateRoom {
        player_name: String,
        question_set: Vec<Question>,
    },

    /// Join an existing room by its code.
    JoinRoom {
        room_id: RoomCode,
        player_name: String,
    },

    /// Answer the currently open question. `answer` is an index into the
    /// question's option list.
    SubmitAnswer { answer: usize },
}

// ---------------------------------------------------------------------------
// Server → client events
// ---------------------------------------------------------------------------

/// One player's entry in a question's results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerResult {
    pub player_id: PlayerId,
    pub player_name: String,
    /// The text of the chosen option, or `null` if the player never
    /// answered before the question resolved.
    pub answer: Option<String>,
    pub is_correct: bool,
    /// Milliseconds from question broadcast to submission; pinned to the
    /// time limit for absent answers.
    pub response_time: u64,
    pub points_earned: u32,
    /// Cumulative score after this question.
    pub total_score: u32,
}

/// One player's final standing in `game_ended`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalStanding {
    pub player_id: PlayerId,
    pub player_name: String,
    pub total_score: u32,
}

/// Messages the server sends to clients.
///
/// Replies to a specific intent (`room_created`, `room_joined`,
/// `answer_received`) go only to the originating connection; everything
/// else is broadcast to the whole room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "snake_case",
    rename_all_fields = "camelCase"
)]
pub enum ServerEvent {
    /// Reply to `create_room`.
    RoomCreated {
        success: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        room_id: Option<RoomCode>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },

    /// Reply to `join_room`. On failure, `error` carries the distinct
    /// rejection kind (not found / full / in progress).
    RoomJoined {
        success: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        room_id: Option<RoomCode>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<ErrorKind>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },

    /// A player was seated in the room.
    PlayerJoined {
        player_id: PlayerId,
        player_name: String,
        total_players: usize,
    },

    /// A player left or disconnected.
    PlayerLeft { player_id: PlayerId },

    /// The room is full and the pre-game countdown has begun.
    GameStarted { total_questions: usize },

    /// A question is open for answers. `start_time` is unix milliseconds
    /// at broadcast; `time_limit` is milliseconds.
    NewQuestion {
        question_index: usize,
        question: PublicQuestion,
        time_limit: u64,
        start_time: u64,
    },

    /// Acknowledgement that a submitted answer was recorded.
    AnswerReceived { success: bool },

    /// A question resolved — exactly once per question, whether every
    /// player answered or the time limit elapsed.
    QuestionResults {
        correct_answer: String,
        explanation: Option<String>,
        results: Vec<AnswerResult>,
    },

    /// The game is over.
    GameEnded {
        results: Vec<FinalStanding>,
        game_result: GameOutcome,
        /// Display name of the winner; absent on a tie or abandonment.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        winner: Option<String>,
    },

    /// A rejected intent, reported only to the originating connection.
    Error { code: ErrorKind, message: String },
}

// =========================================================================
// Tests
// =========================================================================
