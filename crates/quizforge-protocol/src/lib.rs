//! Wire protocol for Quizforge.
//!
//! This crate defines the "language" that quiz clients and the server speak:
//!
//! - **Types** ([`ClientIntent`], [`ServerEvent`], [`RoomCode`], etc.) —
//!   the message structures that travel on the wire.
//! - **Questions** ([`Question`], [`PublicQuestion`]) — quiz content as
//!   supplied by clients, and the redacted form broadcast during play.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how messages are
//!   converted to/from bytes.
//! - **Constants** ([`consts`]) — the fixed protocol timings and limits
//!   that clients rely on for behavioral compatibility.
//! - **Errors** ([`ProtocolError`]) — what can go wrong during
//!   encoding/decoding and structural validation.
//!
//! # Architecture
//!
//! The protocol layer sits between transport (raw bytes) and the room
//! layer (game state). It doesn't know about connections or rooms — it
//! only knows how to serialize, deserialize, and structurally validate
//! messages.
//!
//! ```text
//! Transport (bytes) → Protocol (ClientIntent / ServerEvent) → Room (quiz state)
//! ```

pub mod consts;

mod codec;
mod error;
mod question;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use question::{PublicQuestion, Question};
pub use types::{
    AnswerResult, ClientIntent, ErrorKind, FinalStanding, GameOutcome,
    PlayerId, RoomCode, ServerEvent,
};
