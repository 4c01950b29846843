//! Quiz room lifecycle management for Quizforge.
//!
//! Each room is an isolated two-player game session running as its own
//! Tokio task (actor model) with its own phase machine, question
//! scheduler, and score totals. All mutation of a room's state happens
//! inside that one task, in arrival order — no locks, no cross-room
//! interaction.
//!
//! # Key types
//!
//! - [`RoomRegistry`] — owned store of active rooms, keyed by join code
//! - [`RoomHandle`] — send commands to a running room actor
//! - [`RoomPhase`] — the `waiting → playing → finished` state machine
//! - [`RoomConfig`] — timings and capacity (protocol defaults, injectable
//!   for tests)
//! - [`score`] — the pure scoring function

mod config;
mod error;
mod registry;
mod room;
mod score;

pub use config::{RoomConfig, RoomPhase};
pub use error::RoomError;
pub use registry::RoomRegistry;
pub use room::{EventSender, RoomHandle, RoomInfo};
pub use score::score;
