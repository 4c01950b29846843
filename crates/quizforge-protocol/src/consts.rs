//! Fixed protocol constants.
//!
//! Clients hard-code their countdown animations and answer timers around
//! these values, so they are part of the wire contract — changing one is
//! a protocol version bump, not a config tweak. Server-side code reads
//! them through `RoomConfig` defaults rather than using them directly.

/// Number of players in a quiz duel. Rooms never seat more.
pub const ROOM_CAPACITY: usize = 2;

/// How long players have to answer each question, in milliseconds.
pub const QUESTION_TIME_LIMIT_MS: u64 = 15_000;

/// Pre-game countdown between the second join and question 0.
pub const COUNTDOWN_MS: u64 = 3_000;

/// Pause between a question's results and the next question.
pub const INTER_QUESTION_PAUSE_MS: u64 = 5_000;

/// How long a finished room stays queryable before it is purged.
pub const ROOM_RETENTION_MS: u64 = 30_000;

/// Base points for a correct answer.
pub const SCORE_BASE: u32 = 100;

/// Maximum time bonus on top of the base, at zero latency.
pub const SCORE_MAX_BONUS: u32 = 50;

/// Maximum accepted length of a player display name, in characters.
pub const MAX_PLAYER_NAME_LEN: usize = 32;
