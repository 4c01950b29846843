//! Room configuration and phase machine.

use std::time::Duration;

use quizforge_protocol::consts;

// ---------------------------------------------------------------------------
// RoomConfig
// ---------------------------------------------------------------------------

/// Timings and capacity for a room.
///
/// Defaults are the fixed protocol constants clients are built against.
/// The config is injectable (per registry, not global) so tests can run
/// a full game in milliseconds.
#[derive(Debug, Clone)]
pub struct RoomConfig {
    /// Number of seats. The protocol fixes this at 2.
    pub capacity: usize,

    /// How long players have to answer each question.
    pub question_time_limit: Duration,

    /// Pre-game countdown between the second join and question 0.
    pub countdown: Duration,

    /// Pause between a question's results and the next question.
    pub inter_question_pause: Duration,

    /// How long a finished room stays queryable before it is purged.
    pub retention: Duration,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            capacity: consts::ROOM_CAPACITY,
            question_time_limit: Duration::from_millis(
                consts::QUESTION_TIME_LIMIT_MS,
            ),
            countdown: Duration::from_millis(consts::COUNTDOWN_MS),
            inter_question_pause: Duration::from_millis(
                consts::INTER_QUESTION_PAUSE_MS,
            ),
            retention: Duration::from_millis(consts::ROOM_RETENTION_MS),
        }
    }
}

// ---------------------------------------------------------------------------
// RoomPhase
// ---------------------------------------------------------------------------

/// The lifecycle phase of a room.
///
/// Transitions are one-directional with no revisiting:
///
/// ```text
/// Waiting → Playing → Finished
/// ```
///
/// - **Waiting**: one player seated, accepting a second join.
/// - **Playing**: both seats taken; countdown or a question cycle is
///   active.
/// - **Finished**: terminal. Results are computed; the room lingers for
///   the retention window, then is purged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomPhase {
    Waiting,
    Playing,
    Finished,
}

impl RoomPhase {
    /// Returns `true` if the room is accepting new players.
    pub fn is_joinable(&self) -> bool {
        matches!(self, Self::Waiting)
    }

    /// Returns `true` if a game is in progress.
    pub fn is_playing(&self) -> bool {
        matches!(self, Self::Playing)
    }

    /// The next phase in the strict ordering, or `None` from the
    /// terminal phase.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Waiting => Some(Self::Playing),
            Self::Playing => Some(Self::Finished),
            Self::Finished => None,
        }
    }
}

impl std::fmt::Display for RoomPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Waiting => write!(f, "waiting"),
            Self::Playing => write!(f, "playing"),
            Self::Finished => write!(f, "finished"),
        }
    }
}
