//! Wire types shared by the room store, the HTTP server and sync clients
//!
//! All bodies are JSON with camelCase field names. Game state uses the
//! `uttt_core` wire layout (`boards`, `boardWinners`, `activeBoard`, ...).

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uttt_core::{GameState, Move, MoveError, Player};

/// Short room identifier (6 uppercase characters)
pub type RoomId = String;

/// Connection status of a seat
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Presence {
    #[default]
    Waiting,
    Connected,
    Disconnected,
}

/// One value per player, serialized as `{"X": .., "O": ..}`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerPlayer<T> {
    #[serde(rename = "X")]
    pub x: T,
    #[serde(rename = "O")]
    pub o: T,
}

impl<T> PerPlayer<T> {
    pub fn new(x: T, o: T) -> Self {
        Self { x, o }
    }

    pub fn get(&self, player: Player) -> &T {
        match player {
            Player::X => &self.x,
            Player::O => &self.o,
        }
    }

    pub fn get_mut(&mut self, player: Player) -> &mut T {
        match player {
            Player::X => &mut self.x,
            Player::O => &mut self.o,
        }
    }
}

// ============================================================================
// REQUESTS
// ============================================================================

/// Move submission: the move plus the version the client last observed
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitMoveRequest {
    #[serde(flatten)]
    pub mv: Move,
    pub expected_version: u64,
}

impl SubmitMoveRequest {
    pub fn new(mv: Move, expected_version: u64) -> Self {
        Self { mv, expected_version }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoomRequest {
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoomResponse {
    pub room_id: RoomId,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRoomRequest {
    pub room_id: RoomId,
    #[serde(default)]
    pub password: Option<String>,
}

/// Leave, rejoin and rematch all name the acting seat
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatRequest {
    #[serde(default)]
    pub room_id: Option<RoomId>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub player: Option<Player>,
}

// ============================================================================
// RESPONSES
// ============================================================================

/// Result of an accepted move
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveAccepted {
    pub game_state: GameState,
    pub version: u64,
}

/// Everything a client needs to render a room
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSnapshot {
    pub room_id: RoomId,
    pub game_state: GameState,
    pub version: u64,
    pub players: PerPlayer<Presence>,
    pub rematch_requests: PerPlayer<bool>,
    pub player_left: Option<Player>,
}

// ============================================================================
// REJECTIONS
// ============================================================================

/// Why the store refused a move submission. Checks run in declaration order.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("Room not found")]
    NotFound(RoomId),
    #[error("Game state has changed (now at version {version}), please refresh")]
    StaleState { state: Box<GameState>, version: u64 },
    #[error("Not your turn")]
    NotYourTurn,
    #[error("Game is already over")]
    GameOver,
    #[error("Invalid board index {0}")]
    InvalidBoard(u8),
    #[error("Invalid cell index {0}")]
    InvalidCell(u8),
    #[error("Board {0} is already won")]
    BoardAlreadyWon(u8),
    #[error("You must play in board {required}")]
    WrongBoard { required: u8 },
    #[error("Cell is already taken")]
    CellTaken,
    #[error("Server error: {0}")]
    ServerFault(String),
}

impl From<MoveError> for Rejection {
    fn from(err: MoveError) -> Self {
        match err {
            MoveError::NotYourTurn { .. } => Rejection::NotYourTurn,
            MoveError::GameOver => Rejection::GameOver,
            MoveError::InvalidBoard(b) => Rejection::InvalidBoard(b),
            MoveError::InvalidCell(c) => Rejection::InvalidCell(c),
            MoveError::BoardAlreadyDecided(b) => Rejection::BoardAlreadyWon(b),
            MoveError::WrongBoard { required } => Rejection::WrongBoard { required },
            MoveError::CellTaken => Rejection::CellTaken,
        }
    }
}

impl Rejection {
    /// Stable machine-readable tag used in the `error` field
    pub fn kind(&self) -> &'static str {
        match self {
            Rejection::NotFound(_) => "not_found",
            Rejection::StaleState { .. } => "stale_state",
            Rejection::NotYourTurn => "not_your_turn",
            Rejection::GameOver => "game_over",
            Rejection::InvalidBoard(_) => "invalid_board",
            Rejection::InvalidCell(_) => "invalid_cell",
            Rejection::BoardAlreadyWon(_) => "board_already_won",
            Rejection::WrongBoard { .. } => "wrong_board",
            Rejection::CellTaken => "cell_taken",
            Rejection::ServerFault(_) => "server_fault",
        }
    }

    /// HTTP status the server answers with
    pub fn status_code(&self) -> u16 {
        match self {
            Rejection::NotFound(_) => 404,
            Rejection::StaleState { .. } => 409,
            Rejection::ServerFault(_) => 500,
            _ => 422,
        }
    }

    pub fn to_body(&self) -> ErrorBody {
        let (current_state, current_version) = match self {
            Rejection::StaleState { state, version } => (Some((**state).clone()), Some(*version)),
            _ => (None, None),
        };
        let index = match self {
            Rejection::InvalidBoard(i)
            | Rejection::InvalidCell(i)
            | Rejection::BoardAlreadyWon(i)
            | Rejection::WrongBoard { required: i } => Some(*i),
            _ => None,
        };
        ErrorBody {
            error: self.kind().to_string(),
            message: self.to_string(),
            index,
            current_state,
            current_version,
        }
    }
}

/// JSON body of every non-2xx response
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_state: Option<GameState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_version: Option<u64>,
}

impl ErrorBody {
    /// Rebuild the typed rejection on the client side.
    /// Unknown or incomplete bodies become `ServerFault`.
    pub fn into_rejection(self, room_id: &str) -> Rejection {
        let index = self.index.unwrap_or_default();
        match self.error.as_str() {
            "not_found" => Rejection::NotFound(room_id.to_string()),
            "stale_state" => match (self.current_state, self.current_version) {
                (Some(state), Some(version)) => Rejection::StaleState {
                    state: Box::new(state),
                    version,
                },
                _ => Rejection::ServerFault(self.message),
            },
            "not_your_turn" => Rejection::NotYourTurn,
            "game_over" => Rejection::GameOver,
            "invalid_board" => Rejection::InvalidBoard(index),
            "invalid_cell" => Rejection::InvalidCell(index),
            "board_already_won" => Rejection::BoardAlreadyWon(index),
            "wrong_board" => Rejection::WrongBoard { required: index },
            "cell_taken" => Rejection::CellTaken,
            _ => Rejection::ServerFault(self.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_submit_request_wire_format() {
        let req = SubmitMoveRequest::new(Move::new(4, 2, Player::O), 7);
        let value = serde_json::to_value(req).unwrap();
        assert_eq!(
            value,
            json!({"boardIndex": 4, "cellIndex": 2, "player": "O", "expectedVersion": 7})
        );

        let parsed: SubmitMoveRequest = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, req);
    }

    #[test]
    fn test_move_error_maps_one_to_one() {
        assert_eq!(
            Rejection::from(MoveError::NotYourTurn { expected: Player::X }),
            Rejection::NotYourTurn
        );
        assert_eq!(
            Rejection::from(MoveError::BoardAlreadyDecided(3)),
            Rejection::BoardAlreadyWon(3)
        );
        assert_eq!(
            Rejection::from(MoveError::WrongBoard { required: 5 }),
            Rejection::WrongBoard { required: 5 }
        );
        assert_eq!(Rejection::from(MoveError::CellTaken), Rejection::CellTaken);
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(Rejection::NotFound("ABC123".into()).status_code(), 404);
        assert_eq!(
            Rejection::StaleState {
                state: Box::new(GameState::new()),
                version: 2
            }
            .status_code(),
            409
        );
        assert_eq!(Rejection::CellTaken.status_code(), 422);
        assert_eq!(Rejection::ServerFault("boom".into()).status_code(), 500);
    }

    #[test]
    fn test_error_body_restores_rejection() {
        let rejections = [
            Rejection::StaleState {
                state: Box::new(GameState::new().apply_move(Move::new(0, 4, Player::X))),
                version: 1,
            },
            Rejection::WrongBoard { required: 6 },
            Rejection::InvalidCell(12),
            Rejection::GameOver,
        ];
        for rejection in rejections {
            let json = serde_json::to_string(&rejection.to_body()).unwrap();
            let body: ErrorBody = serde_json::from_str(&json).unwrap();
            assert_eq!(body.into_rejection("ROOM01"), rejection);
        }
    }

    #[test]
    fn test_unknown_error_kind_is_server_fault() {
        let body = ErrorBody {
            error: "teapot".into(),
            message: "short and stout".into(),
            index: None,
            current_state: None,
            current_version: None,
        };
        assert_eq!(
            body.into_rejection("ROOM01"),
            Rejection::ServerFault("short and stout".into())
        );
    }

    #[test]
    fn test_presence_wire_names() {
        let seats = PerPlayer::new(Presence::Connected, Presence::Waiting);
        assert_eq!(
            serde_json::to_value(seats).unwrap(),
            json!({"X": "connected", "O": "waiting"})
        );
    }
}
