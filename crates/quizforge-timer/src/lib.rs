//! Cancellable deadline scheduler for Quizforge room actors.
//!
//! A quiz room's progression is a chain of single deadlines: pre-game
//! countdown, per-question timeout, inter-question pause, post-game
//! retention. At any instant, at most one of them is pending — so instead
//! of juggling spawned timer tasks and stale closures, each room owns one
//! [`RoomTimer`] holding at most one armed deadline.
//!
//! Cancellation is deterministic by construction: disarming a deadline
//! (or dropping the timer with its room actor) means it can never fire.
//! There is no timer callback that can outlive its room.
//!
//! # Integration
//!
//! The timer is designed to sit inside a room actor's `tokio::select!`
//! loop:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(cmd) = inbox.recv() => { /* handle commands */ }
//!         kind = timer.fired() => { /* countdown elapsed, question timed out, ... */ }
//!     }
//! }
//! ```
//!
//! While disarmed, [`RoomTimer::fired`] pends forever — `select!` simply
//! keeps processing the other branches.

use std::time::Duration;

use tokio::time::{self, Instant};
use tracing::trace;

/// Which room deadline is armed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// Pre-game countdown between the second join and question 0.
    Countdown,
    /// The active question's answer window.
    QuestionTimeout,
    /// Pause between a question's results and the next question.
    InterQuestion,
    /// Delay before a finished room is purged.
    Retention,
}

impl std::fmt::Display for TimerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Countdown => "countdown",
            Self::QuestionTimeout => "question_timeout",
            Self::InterQuestion => "inter_question",
            Self::Retention => "retention",
        };
        f.write_str(s)
    }
}

/// A single-slot, cancellable deadline. One per room actor.
///
/// Arming is last-write-wins: a new `arm` replaces whatever was pending.
/// That matches the room lifecycle, where phases are strictly sequential
/// and a new phase always supersedes the old one's deadline.
#[derive(Debug, Default)]
pub struct RoomTimer {
    armed: Option<(TimerKind, Instant)>,
}

impl RoomTimer {
    /// Creates a timer with nothing armed.
    pub fn new() -> Self {
        Self { armed: None }
    }

    /// Arms a deadline `after` from now, replacing any pending one.
    pub fn arm(&mut self, kind: TimerKind, after: Duration) {
        if let Some((old, _)) = self.armed {
            trace!(%old, new = %kind, "replacing armed deadline");
        }
        self.armed = Some((kind, Instant::now() + after));
    }

    /// Disarms the pending deadline, if any. A disarmed deadline never
    /// fires.
    pub fn cancel(&mut self) {
        if let Some((kind, _)) = self.armed.take() {
            trace!(%kind, "deadline cancelled");
        }
    }

    /// Waits until the armed deadline is due, disarms it, and returns its
    /// kind.
    ///
    /// While disarmed, this future pends forever — it will never resolve
    /// on its own, but `tokio::select!` will still process other
    /// branches. Cancel-safe: dropping the future before the deadline
    /// leaves it armed.
    pub async fn fired(&mut self) -> TimerKind {
        let (kind, at) = match self.armed {
            Some(armed) => armed,
            None => {
                // Never completes — select! handles the other branches.
                std::future::pending::<()>().await;
                unreachable!()
            }
        };

        time::sleep_until(at).await;
        self.armed = None;
        trace!(%kind, "deadline fired");
        kind
    }

    /// The kind of the armed deadline, if any.
    pub fn armed_kind(&self) -> Option<TimerKind> {
        self.armed.map(|(kind, _)| kind)
    }

    /// Whether any deadline is pending.
    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    /// Time left until the armed deadline, or `None` when disarmed.
    /// Saturates at zero once the deadline is due.
    pub fn remaining(&self) -> Option<Duration> {
        self.armed
            .map(|(_, at)| at.saturating_duration_since(Instant::now()))
    }
}
