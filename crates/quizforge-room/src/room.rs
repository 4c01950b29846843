//! Room actor: an isolated Tokio task that owns one quiz session.
//!
//! Each room runs in its own task, communicating with the outside world
//! through an mpsc channel. All mutation of room state — seats, answers,
//! the question index — happens inside this task, one event at a time in
//! arrival order. That serialization is what makes the double-trigger
//! question resolution (all-answered vs. timeout) race-free: whichever
//! path runs first closes the question, and the other becomes a no-op.

use std::collections::HashMap;
use std::ops::ControlFlow;
use std::time::{SystemTime, UNIX_EPOCH};

use quizforge_protocol::{
    AnswerResult, FinalStanding, GameOutcome, PlayerId, PublicQuestion,
    Question, RoomCode, ServerEvent,
};
use quizforge_timer::{RoomTimer, TimerKind};
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;

use crate::{score, RoomConfig, RoomError, RoomPhase};

/// Channel sender for delivering server events to one player's
/// connection handler.
pub type EventSender = mpsc::UnboundedSender<ServerEvent>;

/// Commands sent to a room actor through its channel.
///
/// The `oneshot::Sender` in some variants is a reply channel — the
/// caller sends a command and awaits the outcome on it.
pub(crate) enum RoomCommand {
    /// Seat a player.
    Join {
        player_id: PlayerId,
        name: String,
        sender: EventSender,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },

    /// Record an answer for the open question.
    Submit {
        player_id: PlayerId,
        choice: usize,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },

    /// Remove a player (disconnect). Fire-and-forget.
    Leave { player_id: PlayerId },

    /// Request a snapshot of room metadata.
    Info { reply: oneshot::Sender<RoomInfo> },

    /// Shut down the room immediately.
    Shutdown,
}

/// A snapshot of room metadata (not the quiz content itself).
#[derive(Debug, Clone)]
pub struct RoomInfo {
    /// The room's join code.
    pub code: RoomCode,
    /// Current lifecycle phase.
    pub phase: RoomPhase,
    /// Number of players currently seated.
    pub player_count: usize,
    /// Seats available in total.
    pub capacity: usize,
    /// Index of the current question (0 until the game starts).
    pub current_question: usize,
    /// Length of the fixed question sequence.
    pub total_questions: usize,
}

/// Handle to a running room actor. Used to send commands to it.
///
/// Cheap to clone — it's just an `mpsc::Sender` wrapper. The
/// [`RoomRegistry`](crate::RoomRegistry) holds one per room.
#[derive(Clone, Debug)]
pub struct RoomHandle {
    code: RoomCode,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    /// The room's join code.
    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    /// Seats a player in the room.
    pub async fn join(
        &self,
        player_id: PlayerId,
        name: String,
        sender: EventSender,
    ) -> Result<(), RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Join {
                player_id,
                name,
                sender,
                reply: reply_tx,
            })
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))?
    }

    /// Submits an answer for the currently open question.
    pub async fn submit(
        &self,
        player_id: PlayerId,
        choice: usize,
    ) -> Result<(), RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Submit {
                player_id,
                choice,
                reply: reply_tx,
            })
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))?
    }

    /// Removes a player from the room (fire-and-forget).
    pub async fn leave(&self, player_id: PlayerId) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Leave { player_id })
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))
    }

    /// Requests the current room info.
    pub async fn info(&self) -> Result<RoomInfo, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Info { reply: reply_tx })
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))
    }

    /// Tells the room to shut down immediately.
    pub async fn shutdown(&self) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Shutdown)
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))
    }
}

/// A seated player.
struct Player {
    id: PlayerId,
    name: String,
    score: u32,
}

/// One recorded answer for the open question. First write wins.
struct Answer {
    choice: usize,
    is_correct: bool,
    latency_ms: u64,
}

/// The internal room actor state. Runs inside a Tokio task.
struct RoomActor {
    code: RoomCode,
    config: RoomConfig,
    phase: RoomPhase,
    /// Seated players, host first. Never exceeds `config.capacity`.
    players: Vec<Player>,
    /// Per-player outbound event channels.
    senders: HashMap<PlayerId, EventSender>,
    /// The immutable question sequence chosen at creation.
    questions: Vec<Question>,
    /// Only ever increases; `< questions.len()` while playing.
    current_index: usize,
    /// `true` from a question's broadcast until its resolution. A closed
    /// question rejects every submission, which is what makes resolution
    /// exactly-once.
    question_open: bool,
    question_start: Instant,
    /// Answers for the open question, cleared when the next one begins.
    answers: HashMap<PlayerId, Answer>,
    timer: RoomTimer,
    inbox: mpsc::Receiver<RoomCommand>,
    /// Notifies the registry's reaper that this room is done.
    closed: mpsc::UnboundedSender<RoomCode>,
}

impl RoomActor {
    /// Runs the actor loop until the room closes.
    async fn run(mut self) {
        tracing::info!(code = %self.code, "room opened");

        loop {
            tokio::select! {
                cmd = self.inbox.recv() => match cmd {
                    Some(cmd) => {
                        if self.handle_command(cmd).is_break() {
                            break;
                        }
                    }
                    // Registry dropped the handle — room was removed.
                    None => break,
                },
                kind = self.timer.fired() => {
                    if self.handle_deadline(kind).is_break() {
                        break;
                    }
                }
            }
        }

        tracing::info!(code = %self.code, "room closed");
    }

    fn handle_command(&mut self, cmd: RoomCommand) -> ControlFlow<()> {
        match cmd {
            RoomCommand::Join {
                player_id,
                name,
                sender,
                reply,
            } => {
                let result = self.handle_join(player_id, name, sender);
                let _ = reply.send(result);
            }
            RoomCommand::Submit {
                player_id,
                choice,
                reply,
            } => {
                let result = self.handle_submit(player_id, choice);
                let _ = reply.send(result);
            }
            RoomCommand::Leave { player_id } => {
                return self.handle_leave(player_id);
            }
            RoomCommand::Info { reply } => {
                let _ = reply.send(self.info());
            }
            RoomCommand::Shutdown => {
                tracing::info!(code = %self.code, "room shutting down");
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    }

    /// Reacts to an elapsed deadline. Each kind drives the next step of
    /// the `countdown → question → results → …` chain.
    fn handle_deadline(&mut self, kind: TimerKind) -> ControlFlow<()> {
        match kind {
            TimerKind::Countdown => self.begin_question(0),
            TimerKind::QuestionTimeout => {
                tracing::debug!(
                    code = %self.code,
                    question = self.current_index,
                    "time limit elapsed, forcing resolution"
                );
                self.resolve_question();
            }
            TimerKind::InterQuestion => {
                self.begin_question(self.current_index + 1);
            }
            TimerKind::Retention => {
                let _ = self.closed.send(self.code.clone());
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    }

    fn handle_join(
        &mut self,
        player_id: PlayerId,
        name: String,
        sender: EventSender,
    ) -> Result<(), RoomError> {
        // Capacity before phase: a third join against a running
        // two-player room reports "full", not "in progress".
        if self.players.len() >= self.config.capacity {
            return Err(RoomError::RoomFull(self.code.clone()));
        }
        if self.phase != RoomPhase::Waiting {
            return Err(RoomError::GameInProgress(self.code.clone()));
        }
        if self.players.iter().any(|p| p.id == player_id) {
            return Err(RoomError::InvalidState(format!(
                "player {player_id} is already seated in room {}",
                self.code
            )));
        }

        self.players.push(Player {
            id: player_id,
            name: name.clone(),
            score: 0,
        });
        self.senders.insert(player_id, sender);
        tracing::info!(
            code = %self.code,
            %player_id,
            players = self.players.len(),
            "player joined"
        );

        self.broadcast(ServerEvent::PlayerJoined {
            player_id,
            player_name: name,
            total_players: self.players.len(),
        });

        // Second seat taken: waiting → playing, countdown to question 0.
        if self.players.len() == self.config.capacity {
            self.phase = RoomPhase::Playing;
            self.broadcast(ServerEvent::GameStarted {
                total_questions: self.questions.len(),
            });
            self.timer.arm(TimerKind::Countdown, self.config.countdown);
            tracing::info!(
                code = %self.code,
                questions = self.questions.len(),
                "game starting"
            );
        }

        Ok(())
    }

    fn handle_submit(
        &mut self,
        player_id: PlayerId,
        choice: usize,
    ) -> Result<(), RoomError> {
        if self.phase != RoomPhase::Playing {
            return Err(RoomError::InvalidState(format!(
                "room {} is {}, not playing",
                self.code, self.phase
            )));
        }
        if !self.question_open {
            // Late arrival after forced resolution, or during the
            // countdown / inter-question pause.
            return Err(RoomError::InvalidState(
                "no question is open for answers".into(),
            ));
        }
        if !self.players.iter().any(|p| p.id == player_id) {
            return Err(RoomError::Stale(player_id));
        }
        if self.answers.contains_key(&player_id) {
            return Err(RoomError::DuplicateSubmission(player_id));
        }

        let question = &self.questions[self.current_index];
        if choice >= question.options.len() {
            return Err(RoomError::InvalidState(format!(
                "option {choice} out of range for {} options",
                question.options.len()
            )));
        }

        let limit_ms = self.config.question_time_limit.as_millis() as u64;
        let latency_ms =
            (self.question_start.elapsed().as_millis() as u64).min(limit_ms);
        let is_correct = choice == question.correct_index;

        self.answers.insert(
            player_id,
            Answer {
                choice,
                is_correct,
                latency_ms,
            },
        );
        tracing::debug!(
            code = %self.code,
            %player_id,
            question = self.current_index,
            latency_ms,
            "answer recorded"
        );

        // Ack goes out before any results broadcast.
        self.send_to(player_id, ServerEvent::AnswerReceived { success: true });

        // Early resolution: every seated player has answered. Cancel the
        // pending timeout so it can't fire a second resolution.
        if self.answers.len() == self.players.len() {
            self.timer.cancel();
            self.resolve_question();
        }

        Ok(())
    }

    fn handle_leave(&mut self, player_id: PlayerId) -> ControlFlow<()> {
        let Some(pos) =
            self.players.iter().position(|p| p.id == player_id)
        else {
            tracing::debug!(
                code = %self.code,
                %player_id,
                "leave from non-member, ignoring"
            );
            return ControlFlow::Continue(());
        };

        self.players.remove(pos);
        self.senders.remove(&player_id);
        self.answers.remove(&player_id);
        tracing::info!(
            code = %self.code,
            %player_id,
            players = self.players.len(),
            "player left"
        );

        // Last player gone: close right away, taking any pending timer
        // with us.
        if self.players.is_empty() {
            let _ = self.closed.send(self.code.clone());
            return ControlFlow::Break(());
        }

        self.broadcast(ServerEvent::PlayerLeft { player_id });

        // Dropping below capacity mid-game is an abandonment, not a
        // scored completion.
        if self.phase == RoomPhase::Playing {
            self.timer.cancel();
            self.finish(GameOutcome::Abandoned);
        }

        ControlFlow::Continue(())
    }

    /// Opens question `index`: clears the answer map, records the start
    /// instant, arms the timeout, and broadcasts the redacted question.
    fn begin_question(&mut self, index: usize) {
        self.current_index = index;
        self.answers.clear();
        self.question_open = true;
        self.question_start = Instant::now();
        self.timer.arm(
            TimerKind::QuestionTimeout,
            self.config.question_time_limit,
        );

        let public: PublicQuestion = self.questions[index].public();
        tracing::debug!(
            code = %self.code,
            question = index,
            "question opened"
        );
        self.broadcast(ServerEvent::NewQuestion {
            question_index: index,
            question: public,
            time_limit: self.config.question_time_limit.as_millis() as u64,
            start_time: unix_ms(),
        });
    }

    /// Closes the current question and broadcasts its results. Runs
    /// exactly once per question: the early path cancels the timeout
    /// before calling this, and the closed flag rejects anything after.
    fn resolve_question(&mut self) {
        self.question_open = false;
        self.timer.cancel();

        let limit_ms = self.config.question_time_limit.as_millis() as u64;
        let mut results = Vec::with_capacity(self.players.len());

        for i in 0..self.players.len() {
            let player_id = self.players[i].id;
            let question = &self.questions[self.current_index];

            let (answer_text, is_correct, response_time, points) =
                match self.answers.get(&player_id) {
                    Some(answer) => (
                        Some(question.options[answer.choice].clone()),
                        answer.is_correct,
                        answer.latency_ms,
                        score(answer.is_correct, answer.latency_ms, limit_ms),
                    ),
                    // Absent: latency pinned to the limit, no points.
                    None => (None, false, limit_ms, 0),
                };

            self.players[i].score += points;
            results.push(AnswerResult {
                player_id,
                player_name: self.players[i].name.clone(),
                answer: answer_text,
                is_correct,
                response_time,
                points_earned: points,
                total_score: self.players[i].score,
            });
        }

        let question = &self.questions[self.current_index];
        let event = ServerEvent::QuestionResults {
            correct_answer: question.correct_text().to_string(),
            explanation: question.explanation.clone(),
            results,
        };
        self.broadcast(event);
        tracing::debug!(
            code = %self.code,
            question = self.current_index,
            "question resolved"
        );

        if self.current_index + 1 < self.questions.len() {
            self.timer.arm(
                TimerKind::InterQuestion,
                self.config.inter_question_pause,
            );
        } else {
            let outcome = self.scored_outcome();
            self.finish(outcome);
        }
    }

    /// Winner or tie, by final score. Only meaningful for a scored
    /// completion with both seats still taken.
    fn scored_outcome(&self) -> GameOutcome {
        let mut scores = self.players.iter().map(|p| p.score);
        match (scores.next(), scores.next()) {
            (Some(a), Some(b)) if a == b => GameOutcome::Tie,
            (Some(_), Some(_)) => GameOutcome::Winner,
            // A single remaining player shouldn't reach here, but a tie
            // report is the safe fallback.
            _ => GameOutcome::Tie,
        }
    }

    /// Transitions to `finished`, broadcasts final standings, and arms
    /// the retention purge.
    fn finish(&mut self, outcome: GameOutcome) {
        self.phase = RoomPhase::Finished;
        self.question_open = false;

        let mut standings: Vec<FinalStanding> = self
            .players
            .iter()
            .map(|p| FinalStanding {
                player_id: p.id,
                player_name: p.name.clone(),
                total_score: p.score,
            })
            .collect();
        standings.sort_by(|a, b| b.total_score.cmp(&a.total_score));

        let winner = match outcome {
            GameOutcome::Winner => {
                standings.first().map(|s| s.player_name.clone())
            }
            GameOutcome::Tie | GameOutcome::Abandoned => None,
        };

        tracing::info!(code = %self.code, ?outcome, "game ended");
        self.broadcast(ServerEvent::GameEnded {
            results: standings,
            game_result: outcome,
            winner,
        });

        self.timer.arm(TimerKind::Retention, self.config.retention);
    }

    /// Sends an event to every seated player.
    fn broadcast(&self, event: ServerEvent) {
        for player in &self.players {
            self.send_to(player.id, event.clone());
        }
    }

    /// Sends an event to a single player. Silently drops if the
    /// receiver is gone (connection already closed).
    fn send_to(&self, player_id: PlayerId, event: ServerEvent) {
        if let Some(sender) = self.senders.get(&player_id) {
            let _ = sender.send(event);
        }
    }

    fn info(&self) -> RoomInfo {
        RoomInfo {
            code: self.code.clone(),
            phase: self.phase,
            player_count: self.players.len(),
            capacity: self.config.capacity,
            current_question: self.current_index,
            total_questions: self.questions.len(),
        }
    }
}

/// Spawns a new room actor task with the host already seated and
/// returns a handle to it.
///
/// Seating the host here, before the handle exists, means there is no
/// window in which another connection could take the first seat of a
/// freshly created room.
///
/// `channel_size` bounds the command inbox — senders wait when it fills.
pub(crate) fn spawn_room(
    code: RoomCode,
    config: RoomConfig,
    questions: Vec<Question>,
    host_id: PlayerId,
    host_name: String,
    host_sender: EventSender,
    closed: mpsc::UnboundedSender<RoomCode>,
    channel_size: usize,
) -> RoomHandle {
    let (tx, rx) = mpsc::channel(channel_size);

    let mut senders = HashMap::new();
    senders.insert(host_id, host_sender.clone());
    let _ = host_sender.send(ServerEvent::PlayerJoined {
        player_id: host_id,
        player_name: host_name.clone(),
        total_players: 1,
    });

    let actor = RoomActor {
        code: code.clone(),
        config,
        phase: RoomPhase::Waiting,
        players: vec![Player {
            id: host_id,
            name: host_name,
            score: 0,
        }],
        senders,
        questions,
        current_index: 0,
        question_open: false,
        question_start: Instant::now(),
        answers: HashMap::new(),
        timer: RoomTimer::new(),
        inbox: rx,
        closed,
    };

    tokio::spawn(actor.run());

    RoomHandle { code, sender: tx }
}

/// Milliseconds since the unix epoch, for the `start_time` broadcast
/// field. Clients compare it against their own clock for display only.
fn unix_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
