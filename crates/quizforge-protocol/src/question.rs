//! Quiz question content.
//!
//! Questions are supplied by clients (or a content service) when a room
//! is created. The server performs only *structural* validation — it has
//! no opinion on whether the content is factually correct.
//!
//! The correct option is identified by a stable index into `options`, not
//! by text equality: two options with identical text would otherwise make
//! answer matching ambiguous.

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

/// A single quiz question as stored server-side, correct answer included.
///
/// This full form only ever travels client → server (inside
/// `create_room`). What goes back out during play is [`PublicQuestion`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    /// The prompt shown to players.
    pub text: String,

    /// The answer options, in presentation order. Order is fixed for the
    /// lifetime of the room.
    pub options: Vec<String>,

    /// Index into `options` of the canonical correct answer.
    pub correct_index: usize,

    /// Optional explanation revealed alongside the results.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

impl Question {
    /// Structurally validates the question.
    ///
    /// Checks presence only: non-empty prompt, at least two options, no
    /// empty option text, and `correct_index` in range.
    pub fn validate(&self) -> Result<(), ProtocolError> {
        if self.text.trim().is_empty() {
            return Err(ProtocolError::InvalidQuestion(
                "question text is empty".into(),
            ));
        }
        if self.options.len() < 2 {
            return Err(ProtocolError::InvalidQuestion(format!(
                "need at least 2 options, got {}",
                self.options.len()
            )));
        }
        if self.options.iter().any(|o| o.trim().is_empty()) {
            return Err(ProtocolError::InvalidQuestion(
                "option text is empty".into(),
            ));
        }
        if self.correct_index >= self.options.len() {
            return Err(ProtocolError::InvalidQuestion(format!(
                "correct index {} out of range for {} options",
                self.correct_index,
                self.options.len()
            )));
        }
        Ok(())
    }

    /// The text of the canonical correct option.
    ///
    /// Only meaningful after [`validate`](Self::validate) has passed.
    pub fn correct_text(&self) -> &str {
        &self.options[self.correct_index]
    }

    /// The redacted form broadcast to players: prompt and options, never
    /// the correct answer or explanation.
    pub fn public(&self) -> PublicQuestion {
        PublicQuestion {
            text: self.text.clone(),
            options: self.options.clone(),
        }
    }
}

/// What players see while a question is open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicQuestion {
    /// The prompt shown to players.
    pub text: String,
    /// The answer options, in presentation order.
    pub options: Vec<String>,
}
