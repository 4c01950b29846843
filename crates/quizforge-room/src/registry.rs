//! Room registry: code generation, lookup, and player bindings.
//!
//! The registry is plain data behind whatever lock the server chooses —
//! it spawns room actors but holds no task of its own. Removal is
//! implicit: dropping a room's handle closes the actor's inbox, which
//! ends its task and any pending timer with it.

use std::collections::HashMap;

use quizforge_protocol::{PlayerId, Question, RoomCode};
use rand::Rng;
use tokio::sync::mpsc;

use crate::room::spawn_room;
use crate::{EventSender, RoomConfig, RoomError, RoomHandle};

/// Command inbox depth for each room actor.
const COMMAND_CHANNEL_SIZE: usize = 64;

/// Owns every live room and the player → room bindings.
///
/// Not a global: construct one and share it however the server prefers.
/// Closed rooms announce themselves on the receiver returned by
/// [`RoomRegistry::new`]; the server drains it and calls
/// [`remove_room`](Self::remove_room) for each code.
pub struct RoomRegistry {
    config: RoomConfig,
    rooms: HashMap<RoomCode, RoomHandle>,
    bindings: HashMap<PlayerId, RoomCode>,
    closed_tx: mpsc::UnboundedSender<RoomCode>,
}

impl RoomRegistry {
    /// Creates an empty registry and the closed-room notification
    /// stream that goes with it.
    pub fn new(
        config: RoomConfig,
    ) -> (Self, mpsc::UnboundedReceiver<RoomCode>) {
        let (closed_tx, closed_rx) = mpsc::unbounded_channel();
        let registry = Self {
            config,
            rooms: HashMap::new(),
            bindings: HashMap::new(),
            closed_tx,
        };
        (registry, closed_rx)
    }

    /// Spawns a new room with a fresh code and the given question
    /// sequence, seats the host as its sole player, and returns the
    /// room's handle.
    ///
    /// The host is seated before the room becomes visible under its
    /// code, so no other join can ever take the first seat.
    ///
    /// # Errors
    /// Returns [`RoomError::InvalidState`] for an empty question
    /// sequence — a room with nothing to ask has no playable game.
    pub fn create_room(
        &mut self,
        host_id: PlayerId,
        host_name: String,
        host_sender: EventSender,
        questions: Vec<Question>,
    ) -> Result<RoomHandle, RoomError> {
        if questions.is_empty() {
            return Err(RoomError::InvalidState(
                "question sequence must not be empty".into(),
            ));
        }

        let code = self.generate_code();
        let handle = spawn_room(
            code.clone(),
            self.config.clone(),
            questions,
            host_id,
            host_name,
            host_sender,
            self.closed_tx.clone(),
            COMMAND_CHANNEL_SIZE,
        );
        self.rooms.insert(code.clone(), handle.clone());
        self.bindings.insert(host_id, code);
        tracing::debug!(rooms = self.rooms.len(), "room registered");
        Ok(handle)
    }

    /// Looks up a room by code.
    pub fn get(&self, code: &RoomCode) -> Result<RoomHandle, RoomError> {
        self.rooms
            .get(code)
            .cloned()
            .ok_or_else(|| RoomError::NotFound(code.clone()))
    }

    /// Records which room a player is seated in.
    pub fn bind(&mut self, player_id: PlayerId, code: RoomCode) {
        self.bindings.insert(player_id, code);
    }

    /// The room a player is currently bound to, if any.
    pub fn binding(&self, player_id: PlayerId) -> Option<&RoomCode> {
        self.bindings.get(&player_id)
    }

    /// Clears a player's binding and returns the handle of the room
    /// they were in, so the caller can deliver the leave outside any
    /// registry lock.
    pub fn disconnect(&mut self, player_id: PlayerId) -> Option<RoomHandle> {
        let code = self.bindings.remove(&player_id)?;
        self.rooms.get(&code).cloned()
    }

    /// Drops a closed room and any bindings that still point at it.
    /// Dropping the handle is what actually stops the actor.
    pub fn remove_room(&mut self, code: &RoomCode) {
        if self.rooms.remove(code).is_some() {
            self.bindings.retain(|_, bound| bound != code);
            tracing::debug!(
                %code,
                rooms = self.rooms.len(),
                "room removed"
            );
        }
    }

    /// Number of live rooms.
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Draws random codes until one isn't taken. With a 36^6 code space
    /// collisions are vanishingly rare, so this loop runs once in
    /// practice.
    fn generate_code(&self) -> RoomCode {
        let mut rng = rand::rng();
        loop {
            let raw: String = (0..RoomCode::LEN)
                .map(|_| {
                    let idx = rng.random_range(0..RoomCode::ALPHABET.len());
                    RoomCode::ALPHABET[idx] as char
                })
                .collect();
            if let Ok(code) = RoomCode::parse(&raw) {
                if !self.rooms.contains_key(&code) {
                    return code;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quizforge_protocol::ServerEvent;

    fn sample_questions() -> Vec<Question> {
        vec![Question {
            text: "2 + 2?".into(),
            options: vec!["3".into(), "4".into()],
            correct_index: 1,
            explanation: None,
        }]
    }

    fn create(
        registry: &mut RoomRegistry,
        host: PlayerId,
    ) -> (RoomHandle, mpsc::UnboundedReceiver<ServerEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = registry
            .create_room(host, "ada".into(), tx, sample_questions())
            .unwrap();
        (handle, rx)
    }

    #[tokio::test]
    async fn test_create_room_registers_and_binds_host() {
        let (mut registry, _closed) = RoomRegistry::new(RoomConfig::default());
        let host = PlayerId(1);
        let (handle, _rx) = create(&mut registry, host);
        assert_eq!(registry.room_count(), 1);
        assert_eq!(registry.binding(host), Some(handle.code()));

        let found = registry.get(handle.code()).unwrap();
        assert_eq!(found.code(), handle.code());
    }

    #[tokio::test]
    async fn test_create_room_seats_host_immediately() {
        let (mut registry, _closed) = RoomRegistry::new(RoomConfig::default());
        let (handle, mut rx) = create(&mut registry, PlayerId(1));

        // The seat is taken from the instant the room exists, so a
        // concurrent join can only ever take the second seat.
        let info = handle.info().await.unwrap();
        assert_eq!(info.player_count, 1);
        assert!(matches!(
            rx.try_recv(),
            Ok(ServerEvent::PlayerJoined { total_players: 1, .. })
        ));
    }

    #[tokio::test]
    async fn test_create_room_rejects_empty_question_set() {
        let (mut registry, _closed) = RoomRegistry::new(RoomConfig::default());
        let (tx, _rx) = mpsc::unbounded_channel();
        let err = registry
            .create_room(PlayerId(1), "ada".into(), tx, Vec::new())
            .unwrap_err();
        assert!(matches!(err, RoomError::InvalidState(_)));
        assert_eq!(registry.room_count(), 0);
        assert_eq!(registry.binding(PlayerId(1)), None);
    }

    #[tokio::test]
    async fn test_codes_are_unique() {
        let (mut registry, _closed) = RoomRegistry::new(RoomConfig::default());
        let (a, _ra) = create(&mut registry, PlayerId(1));
        let (b, _rb) = create(&mut registry, PlayerId(2));
        assert_ne!(a.code(), b.code());
        assert_eq!(registry.room_count(), 2);
    }

    #[tokio::test]
    async fn test_unknown_code_is_not_found() {
        let (registry, _closed) = RoomRegistry::new(RoomConfig::default());
        let code = RoomCode::parse("ZZZZZZ").unwrap();
        assert!(matches!(
            registry.get(&code),
            Err(RoomError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_bindings_follow_room_removal() {
        let (mut registry, _closed) = RoomRegistry::new(RoomConfig::default());
        let host = PlayerId(7);
        let (handle, _rx) = create(&mut registry, host);
        let code = handle.code().clone();

        let guest = PlayerId(8);
        registry.bind(guest, code.clone());

        registry.remove_room(&code);
        assert_eq!(registry.binding(host), None);
        assert_eq!(registry.binding(guest), None);
        assert_eq!(registry.room_count(), 0);
    }

    #[tokio::test]
    async fn test_disconnect_returns_bound_room() {
        let (mut registry, _closed) = RoomRegistry::new(RoomConfig::default());
        let player = PlayerId(1);
        let (_handle, _rx) = create(&mut registry, player);

        let room = registry.disconnect(player);
        assert!(room.is_some());
        assert_eq!(registry.binding(player), None);

        // Second disconnect is a no-op.
        assert!(registry.disconnect(player).is_none());
    }
}
