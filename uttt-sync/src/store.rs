//! Room storage with optimistic concurrency
//!
//! Every write goes through one lock per store, so "read version, compare,
//! apply, write" is atomic. Two submissions against the same expected
//! version yield exactly one success.

use crate::protocol::{MoveAccepted, Rejection, RoomId, RoomSnapshot};
use crate::room::Room;
use chrono::Utc;
use rand::Rng;
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;
use thiserror::Error;
use uttt_core::{GameState, Move};

const ROOM_ID_LEN: usize = 6;
const ROOM_ID_CHARSET: &[u8] = b"0123456789ABCDEF";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("room {0} not found")]
    NotFound(RoomId),
    #[error("room store lock poisoned")]
    Poisoned,
}

impl From<StoreError> for Rejection {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => Rejection::NotFound(id),
            StoreError::Poisoned => Rejection::ServerFault(StoreError::Poisoned.to_string()),
        }
    }
}

/// Persistence seam consumed by the server and the sync tests
pub trait RoomStore: Send + Sync {
    /// Create a room with the creator seated as X; returns its new ID
    fn create(&self, password: &str, initial: GameState) -> Result<RoomId, StoreError>;

    /// Client-facing view of a room
    fn get(&self, room_id: &str) -> Result<RoomSnapshot, StoreError>;

    /// Full record, including the password
    fn room(&self, room_id: &str) -> Result<Room, StoreError>;

    /// Validate against the stored state and apply atomically.
    /// Order: room exists, version matches, then the rules engine checks.
    fn apply_validated_move(
        &self,
        room_id: &str,
        mv: Move,
        expected_version: u64,
    ) -> Result<MoveAccepted, Rejection>;

    /// Administrative write that bypasses move validation. The state is
    /// normalized and the version bumped so polling clients pick it up.
    fn update_raw(&self, room_id: &str, state: GameState) -> Result<u64, StoreError>;

    /// Lobby bookkeeping (seats, rematch flags); returns the updated room
    fn update_room(&self, room_id: &str, f: &mut dyn FnMut(&mut Room)) -> Result<Room, StoreError>;

    /// Drop rooms idle for longer than `retention`; returns how many went
    fn sweep_expired(&self, retention: Duration) -> Result<usize, StoreError>;
}

/// Generate a short uppercase room code
pub fn generate_room_id<R: Rng>(rng: &mut R) -> RoomId {
    (0..ROOM_ID_LEN)
        .map(|_| ROOM_ID_CHARSET[rng.gen_range(0..ROOM_ID_CHARSET.len())] as char)
        .collect()
}

/// In-process store
#[derive(Default)]
pub struct MemoryRoomStore {
    rooms: RwLock<HashMap<RoomId, Room>>,
}

impl MemoryRoomStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.read().map(|rooms| rooms.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Insert a fully built room (tests and imports)
    pub fn insert(&self, room: Room) -> Result<(), StoreError> {
        self.write()?.insert(room.id.clone(), room);
        Ok(())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<RoomId, Room>>, StoreError> {
        self.rooms.read().map_err(|_| StoreError::Poisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<RoomId, Room>>, StoreError> {
        self.rooms.write().map_err(|_| StoreError::Poisoned)
    }
}

impl RoomStore for MemoryRoomStore {
    fn create(&self, password: &str, initial: GameState) -> Result<RoomId, StoreError> {
        let mut rooms = self.write()?;
        let mut rng = rand::thread_rng();
        let id = loop {
            let candidate = generate_room_id(&mut rng);
            if !rooms.contains_key(&candidate) {
                break candidate;
            }
        };
        rooms.insert(id.clone(), Room::new(id.clone(), password, initial));
        Ok(id)
    }

    fn get(&self, room_id: &str) -> Result<RoomSnapshot, StoreError> {
        self.read()?
            .get(room_id)
            .map(Room::snapshot)
            .ok_or_else(|| StoreError::NotFound(room_id.to_string()))
    }

    fn room(&self, room_id: &str) -> Result<Room, StoreError> {
        self.read()?
            .get(room_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(room_id.to_string()))
    }

    fn apply_validated_move(
        &self,
        room_id: &str,
        mv: Move,
        expected_version: u64,
    ) -> Result<MoveAccepted, Rejection> {
        let mut rooms = self.write()?;
        let room = rooms
            .get_mut(room_id)
            .ok_or_else(|| Rejection::NotFound(room_id.to_string()))?;

        if room.version != expected_version {
            return Err(Rejection::StaleState {
                state: Box::new(room.state.clone()),
                version: room.version,
            });
        }

        let next = room.state.try_apply_move(mv)?;
        room.state = next;
        room.version += 1;
        room.touch();

        Ok(MoveAccepted {
            game_state: room.state.clone(),
            version: room.version,
        })
    }

    fn update_raw(&self, room_id: &str, state: GameState) -> Result<u64, StoreError> {
        let mut rooms = self.write()?;
        let room = rooms
            .get_mut(room_id)
            .ok_or_else(|| StoreError::NotFound(room_id.to_string()))?;
        room.state = state.normalized();
        room.version += 1;
        room.touch();
        Ok(room.version)
    }

    fn update_room(&self, room_id: &str, f: &mut dyn FnMut(&mut Room)) -> Result<Room, StoreError> {
        let mut rooms = self.write()?;
        let room = rooms
            .get_mut(room_id)
            .ok_or_else(|| StoreError::NotFound(room_id.to_string()))?;
        f(room);
        room.touch();
        Ok(room.clone())
    }

    fn sweep_expired(&self, retention: Duration) -> Result<usize, StoreError> {
        let now = Utc::now();
        let mut rooms = self.write()?;
        let before = rooms.len();
        rooms.retain(|_, room| !room.is_expired(now, retention));
        Ok(before - rooms.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use std::sync::Arc;
    use uttt_core::{BoardOutcome, Player};

    fn store_with_room() -> (MemoryRoomStore, RoomId) {
        let store = MemoryRoomStore::new();
        let id = store.create("", GameState::new()).unwrap();
        (store, id)
    }

    #[test]
    fn test_room_id_format() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(1);
        for _ in 0..50 {
            let id = generate_room_id(&mut rng);
            assert_eq!(id.len(), ROOM_ID_LEN);
            assert!(id.chars().all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
        }
    }

    #[test]
    fn test_create_and_get() {
        let (store, id) = store_with_room();
        let snapshot = store.get(&id).unwrap();
        assert_eq!(snapshot.version, 0);
        assert_eq!(snapshot.game_state, GameState::new());
        assert_eq!(store.get("NOPE00"), Err(StoreError::NotFound("NOPE00".into())));
    }

    #[test]
    fn test_versions_have_no_gaps() {
        let (store, id) = store_with_room();
        let moves = [
            Move::new(0, 4, Player::X),
            Move::new(4, 0, Player::O),
            Move::new(0, 0, Player::X),
        ];
        for (i, mv) in moves.into_iter().enumerate() {
            let accepted = store.apply_validated_move(&id, mv, i as u64).unwrap();
            assert_eq!(accepted.version, i as u64 + 1);
        }
        assert_eq!(store.get(&id).unwrap().version, 3);
    }

    #[test]
    fn test_validation_order() {
        let (store, id) = store_with_room();

        // Missing room beats everything
        assert_eq!(
            store.apply_validated_move("NOPE00", Move::new(9, 9, Player::O), 5),
            Err(Rejection::NotFound("NOPE00".into()))
        );

        // Stale version beats the rules checks
        match store.apply_validated_move(&id, Move::new(9, 9, Player::O), 5) {
            Err(Rejection::StaleState { version, state }) => {
                assert_eq!(version, 0);
                assert_eq!(*state, GameState::new());
            }
            other => panic!("expected stale state, got {:?}", other),
        }

        assert_eq!(
            store.apply_validated_move(&id, Move::new(9, 9, Player::O), 0),
            Err(Rejection::NotYourTurn)
        );
        assert_eq!(
            store.apply_validated_move(&id, Move::new(9, 0, Player::X), 0),
            Err(Rejection::InvalidBoard(9))
        );

        store.apply_validated_move(&id, Move::new(0, 4, Player::X), 0).unwrap();
        assert_eq!(
            store.apply_validated_move(&id, Move::new(1, 0, Player::O), 1),
            Err(Rejection::WrongBoard { required: 4 })
        );
        // Rejections leave the version alone
        assert_eq!(store.get(&id).unwrap().version, 1);
    }

    #[test]
    fn test_concurrent_submissions_one_winner() {
        for _ in 0..20 {
            let store = Arc::new(MemoryRoomStore::new());
            let id = store.create("", GameState::new()).unwrap();

            let results: Vec<_> = std::thread::scope(|scope| {
                let handles: Vec<_> = [Move::new(0, 0, Player::X), Move::new(8, 8, Player::X)]
                    .into_iter()
                    .map(|mv| {
                        let store = Arc::clone(&store);
                        let id = id.clone();
                        scope.spawn(move || store.apply_validated_move(&id, mv, 0))
                    })
                    .collect();
                handles.into_iter().map(|h| h.join().unwrap()).collect()
            });

            let successes = results.iter().filter(|r| r.is_ok()).count();
            let stale = results
                .iter()
                .filter(|r| matches!(r, Err(Rejection::StaleState { version: 1, .. })))
                .count();
            assert_eq!(successes, 1);
            assert_eq!(stale, 1);
            assert_eq!(store.get(&id).unwrap().version, 1);
        }
    }

    #[test]
    fn test_update_raw_normalizes_and_bumps_version() {
        let (store, id) = store_with_room();
        // Raw write pointing the active board at a board O already owns
        let mut value = serde_json::to_value(GameState::new()).unwrap();
        value["boardWinners"][2] = serde_json::json!("O");
        value["activeBoard"] = serde_json::json!(2);
        let raw: GameState = serde_json::from_value(value).unwrap();
        assert_eq!(raw.active_board(), Some(2));

        let version = store.update_raw(&id, raw).unwrap();
        assert_eq!(version, 1);

        let snapshot = store.get(&id).unwrap();
        assert_eq!(snapshot.game_state.board_outcome(2), BoardOutcome::Won(Player::O));
        assert_eq!(snapshot.game_state.active_board(), None);
        assert_eq!(
            store.update_raw("NOPE00", GameState::new()),
            Err(StoreError::NotFound("NOPE00".into()))
        );
    }

    #[test]
    fn test_update_room() {
        let (store, id) = store_with_room();
        let room = store.update_room(&id, &mut |room| room.join()).unwrap();
        assert_eq!(room.players.o, crate::protocol::Presence::Connected);
        assert_eq!(room.version, 0);
    }

    #[test]
    fn test_sweep_expired() {
        let (store, fresh) = store_with_room();
        let mut stale = Room::new("OLD001".into(), "", GameState::new());
        stale.last_updated = Utc::now() - chrono::Duration::hours(25);
        store.insert(stale).unwrap();
        assert_eq!(store.len(), 2);

        let removed = store.sweep_expired(Duration::from_secs(24 * 60 * 60)).unwrap();
        assert_eq!(removed, 1);
        assert!(store.get(&fresh).is_ok());
        assert!(store.get("OLD001").is_err());
    }
}
