//! Error types for the room layer.

use quizforge_protocol::{ErrorKind, PlayerId, RoomCode};

/// Errors that can occur during room operations.
///
/// All of these are local to the connection that caused them — a
/// rejected intent never aborts the room or affects other players.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// No room exists under this code.
    #[error("room {0} not found")]
    NotFound(RoomCode),

    /// The room is already at capacity.
    #[error("room {0} is full")]
    RoomFull(RoomCode),

    /// The game already started; late joins are rejected.
    #[error("game in room {0} is already in progress")]
    GameInProgress(RoomCode),

    /// The room's current state doesn't allow this operation — e.g. an
    /// answer submitted outside `playing`, or after the question
    /// resolved.
    #[error("invalid room state for this operation: {0}")]
    InvalidState(String),

    /// A second answer from the same player for the same question.
    /// First write wins; duplicates are rejected, not overwritten.
    #[error("player {0} already answered this question")]
    DuplicateSubmission(PlayerId),

    /// An intent from a connection with no seat in any room.
    #[error("connection {0} has no seat in any room")]
    Stale(PlayerId),

    /// The room's command channel is closed — the actor is gone
    /// (typically a race with the retention purge).
    #[error("room {0} is unavailable")]
    Unavailable(RoomCode),
}

impl RoomError {
    /// The wire-level failure kind reported to clients.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::RoomNotFound,
            Self::RoomFull(_) => ErrorKind::RoomFull,
            Self::GameInProgress(_) => ErrorKind::GameAlreadyInProgress,
            Self::InvalidState(_) => ErrorKind::InvalidState,
            Self::DuplicateSubmission(_) => ErrorKind::DuplicateSubmission,
            Self::Stale(_) => ErrorKind::StaleConnection,
            // A purged room looks identical to an unknown one from the
            // client's side.
            Self::Unavailable(_) => ErrorKind::RoomNotFound,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code() -> RoomCode {
        RoomCode::parse("AB12CD").unwrap()
    }

    #[test]
    fn test_kind_mapping_covers_the_taxonomy() {
        assert_eq!(
            RoomError::NotFound(code()).kind(),
            ErrorKind::RoomNotFound
        );
        assert_eq!(RoomError::RoomFull(code()).kind(), ErrorKind::RoomFull);
        assert_eq!(
            RoomError::GameInProgress(code()).kind(),
            ErrorKind::GameAlreadyInProgress
        );
        assert_eq!(
            RoomError::InvalidState("x".into()).kind(),
            ErrorKind::InvalidState
        );
        assert_eq!(
            RoomError::DuplicateSubmission(PlayerId(1)).kind(),
            ErrorKind::DuplicateSubmission
        );
        assert_eq!(
            RoomError::Stale(PlayerId(1)).kind(),
            ErrorKind::StaleConnection
        );
        assert_eq!(
            RoomError::Unavailable(code()).kind(),
            ErrorKind::RoomNotFound
        );
    }

    #[test]
    fn test_messages_name_the_subject() {
        assert!(RoomError::RoomFull(code()).to_string().contains("AB12CD"));
        assert!(RoomError::DuplicateSubmission(PlayerId(7))
            .to_string()
            .contains("P-7"));
    }
}
