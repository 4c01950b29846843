//! Error types for the protocol layer.

/// Errors that can occur in the protocol layer.
///
/// These cover serialization failures and structural problems with wire
/// data (bad room codes, malformed question sets). Game-rule violations
/// are *not* protocol errors — those live in the room layer and are
/// reported to clients as structured [`ServerEvent::Error`] events.
///
/// [`ServerEvent::Error`]: crate::ServerEvent::Error
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (malformed JSON, missing fields, wrong types).
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// A room code with the wrong length or characters outside the
    /// uppercase-alphanumeric charset.
    #[error("invalid room code: {0}")]
    InvalidRoomCode(String),

    /// A question that fails structural validation — empty prompt, fewer
    /// than two options, or a correct-answer index out of range.
    #[error("invalid question: {0}")]
    InvalidQuestion(String),
}
