//! Room record held by a store

use crate::protocol::{PerPlayer, Presence, RoomId, RoomSnapshot};
use chrono::{DateTime, Utc};
use std::time::Duration;
use uttt_core::{GameState, Player};

/// A synced room: authoritative game state plus lobby bookkeeping
#[derive(Clone, Debug)]
pub struct Room {
    pub id: RoomId,
    /// Empty means the room is open
    pub password: String,
    pub state: GameState,
    /// Starts at 0, +1 per accepted move or raw state write
    pub version: u64,
    pub players: PerPlayer<Presence>,
    pub rematch: PerPlayer<bool>,
    pub player_left: Option<Player>,
    pub last_updated: DateTime<Utc>,
}

impl Room {
    /// New room: creator sits as X, O seat waiting
    pub fn new(id: RoomId, password: impl Into<String>, state: GameState) -> Self {
        Self {
            id,
            password: password.into(),
            state: state.normalized(),
            version: 0,
            players: PerPlayer::new(Presence::Connected, Presence::Waiting),
            rematch: PerPlayer::default(),
            player_left: None,
            last_updated: Utc::now(),
        }
    }

    pub fn check_password(&self, supplied: Option<&str>) -> bool {
        self.password.is_empty() || supplied == Some(self.password.as_str())
    }

    pub fn touch(&mut self) {
        self.last_updated = Utc::now();
    }

    /// O takes the second seat (a repeat join is a no-op)
    pub fn join(&mut self) {
        if self.players.o != Presence::Connected {
            self.players.o = Presence::Connected;
        }
    }

    pub fn leave(&mut self, player: Player) {
        *self.players.get_mut(player) = Presence::Disconnected;
        self.player_left = Some(player);
    }

    pub fn rejoin(&mut self, player: Player) {
        *self.players.get_mut(player) = Presence::Connected;
        self.player_left = None;
    }

    /// Record a rematch request. Returns true, and clears both flags, once
    /// both players have asked.
    pub fn request_rematch(&mut self, player: Player) -> bool {
        *self.rematch.get_mut(player) = true;
        if self.rematch.x && self.rematch.o {
            self.rematch = PerPlayer::default();
            true
        } else {
            false
        }
    }

    /// No activity for longer than `retention`
    pub fn is_expired(&self, now: DateTime<Utc>, retention: Duration) -> bool {
        (now - self.last_updated)
            .to_std()
            .map(|age| age > retention)
            .unwrap_or(false)
    }

    pub fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot {
            room_id: self.id.clone(),
            game_state: self.state.clone(),
            version: self.version,
            players: self.players,
            rematch_requests: self.rematch,
            player_left: self.player_left,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room(password: &str) -> Room {
        Room::new("ABC123".to_string(), password, GameState::new())
    }

    #[test]
    fn test_new_room_seats() {
        let room = room("");
        assert_eq!(room.version, 0);
        assert_eq!(room.players.x, Presence::Connected);
        assert_eq!(room.players.o, Presence::Waiting);
        assert_eq!(room.player_left, None);
    }

    #[test]
    fn test_password_check() {
        assert!(room("").check_password(None));
        assert!(room("").check_password(Some("anything")));

        let locked = room("secret");
        assert!(locked.check_password(Some("secret")));
        assert!(!locked.check_password(Some("guess")));
        assert!(!locked.check_password(None));
    }

    #[test]
    fn test_leave_and_rejoin() {
        let mut room = room("");
        room.join();
        room.leave(Player::O);
        assert_eq!(room.players.o, Presence::Disconnected);
        assert_eq!(room.player_left, Some(Player::O));

        room.rejoin(Player::O);
        assert_eq!(room.players.o, Presence::Connected);
        assert_eq!(room.player_left, None);
    }

    #[test]
    fn test_rematch_needs_both_players() {
        let mut room = room("");
        assert!(!room.request_rematch(Player::X));
        assert!(!room.request_rematch(Player::X));
        assert!(room.rematch.x);

        assert!(room.request_rematch(Player::O));
        assert!(!room.rematch.x && !room.rematch.o);
    }

    #[test]
    fn test_expiry() {
        let room = room("");
        let day = Duration::from_secs(24 * 60 * 60);
        assert!(!room.is_expired(Utc::now(), day));
        assert!(room.is_expired(room.last_updated + chrono::Duration::hours(25), day));
        // Clock skew never expires a room
        assert!(!room.is_expired(room.last_updated - chrono::Duration::hours(1), day));
    }
}
