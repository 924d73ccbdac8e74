//! Game state and move application

use crate::board::{evaluate_lines, evaluate_meta, GRID_SIZE};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// ============================================================================
// CORE TYPES
// ============================================================================

/// Player mark. X always moves first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Player {
    X = 0,
    O = 1,
}

impl Player {
    pub fn opponent(self) -> Self {
        match self {
            Player::X => Player::O,
            Player::O => Player::X,
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Player::X => f.pad("X"),
            Player::O => f.pad("O"),
        }
    }
}

/// Cell content (`None` = empty)
pub type Cell = Option<Player>;

/// One small 3x3 board
pub type SmallBoard = [Cell; GRID_SIZE];

/// Outcome of a small board, or of the whole game
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Option<OutcomeTag>", into = "Option<OutcomeTag>")]
pub enum BoardOutcome {
    #[default]
    Undecided,
    Won(Player),
    Draw,
}

impl BoardOutcome {
    pub fn is_decided(self) -> bool {
        self != BoardOutcome::Undecided
    }

    pub fn winner(self) -> Option<Player> {
        match self {
            BoardOutcome::Won(p) => Some(p),
            _ => None,
        }
    }
}

/// Wire tag for outcomes: `null`, `"X"`, `"O"` or `"DRAW"`
#[derive(Clone, Copy, Serialize, Deserialize)]
enum OutcomeTag {
    X,
    O,
    #[serde(rename = "DRAW")]
    Draw,
}

impl From<Option<OutcomeTag>> for BoardOutcome {
    fn from(tag: Option<OutcomeTag>) -> Self {
        match tag {
            None => BoardOutcome::Undecided,
            Some(OutcomeTag::X) => BoardOutcome::Won(Player::X),
            Some(OutcomeTag::O) => BoardOutcome::Won(Player::O),
            Some(OutcomeTag::Draw) => BoardOutcome::Draw,
        }
    }
}

impl From<BoardOutcome> for Option<OutcomeTag> {
    fn from(outcome: BoardOutcome) -> Self {
        match outcome {
            BoardOutcome::Undecided => None,
            BoardOutcome::Won(Player::X) => Some(OutcomeTag::X),
            BoardOutcome::Won(Player::O) => Some(OutcomeTag::O),
            BoardOutcome::Draw => Some(OutcomeTag::Draw),
        }
    }
}

/// A move: place `player`'s mark at `cell` of small board `board`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Move {
    #[serde(rename = "boardIndex")]
    pub board: u8,
    #[serde(rename = "cellIndex")]
    pub cell: u8,
    pub player: Player,
}

impl Move {
    pub fn new(board: u8, cell: u8, player: Player) -> Self {
        Self { board, cell, player }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> board {}, cell {}", self.player, self.board, self.cell)
    }
}

/// Why a move was refused. Checks run in declaration order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum MoveError {
    #[error("not your turn: {expected} to move")]
    NotYourTurn { expected: Player },
    #[error("game is already over")]
    GameOver,
    #[error("board index {0} out of range")]
    InvalidBoard(u8),
    #[error("cell index {0} out of range")]
    InvalidCell(u8),
    #[error("board {0} is already decided")]
    BoardAlreadyDecided(u8),
    #[error("must play in board {required}")]
    WrongBoard { required: u8 },
    #[error("cell is already taken")]
    CellTaken,
}

/// Where the game stands
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameStatus {
    InProgress {
        player: Player,
        active_board: Option<usize>,
    },
    Finished(BoardOutcome),
}

// ============================================================================
// GAME STATE
// ============================================================================

/// Game state (immutable: every move returns a new state)
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    /// 9 small boards, each 9 cells
    boards: [SmallBoard; GRID_SIZE],

    /// Outcome per small board
    #[serde(rename = "boardWinners")]
    board_outcomes: [BoardOutcome; GRID_SIZE],

    /// Player to move
    current_player: Player,

    /// Board the current player must play in (`None` = anywhere)
    active_board: Option<u8>,

    /// Overall result
    game_winner: BoardOutcome,
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

impl GameState {
    // ========================================================================
    // CONSTRUCTORS
    // ========================================================================

    /// Fresh game, X to move anywhere
    pub fn new() -> Self {
        Self {
            boards: [[None; GRID_SIZE]; GRID_SIZE],
            board_outcomes: [BoardOutcome::Undecided; GRID_SIZE],
            current_player: Player::X,
            active_board: None,
            game_winner: BoardOutcome::Undecided,
        }
    }

    /// Build a position from raw cells. Outcomes and the overall result are
    /// derived from the cells; the active board is normalized.
    pub fn from_boards(
        boards: [SmallBoard; GRID_SIZE],
        current_player: Player,
        active_board: Option<u8>,
    ) -> Self {
        let mut board_outcomes = [BoardOutcome::Undecided; GRID_SIZE];
        for (outcome, board) in board_outcomes.iter_mut().zip(boards.iter()) {
            *outcome = evaluate_lines(board);
        }
        let state = Self {
            boards,
            board_outcomes,
            current_player,
            active_board,
            game_winner: evaluate_meta(&board_outcomes),
        };
        state.normalized()
    }

    /// Drop an active board that is out of range or already decided
    pub fn normalized(mut self) -> Self {
        if let Some(b) = self.active_board {
            let stale = (b as usize) >= GRID_SIZE || self.board_outcomes[b as usize].is_decided();
            if stale {
                self.active_board = None;
            }
        }
        self
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn current_player(&self) -> Player {
        self.current_player
    }

    pub fn active_board(&self) -> Option<usize> {
        self.active_board.map(usize::from)
    }

    pub fn game_winner(&self) -> BoardOutcome {
        self.game_winner
    }

    pub fn is_over(&self) -> bool {
        self.game_winner.is_decided()
    }

    pub fn board(&self, board: usize) -> &SmallBoard {
        &self.boards[board]
    }

    pub fn cell(&self, board: usize, cell: usize) -> Cell {
        self.boards[board][cell]
    }

    pub fn board_outcome(&self, board: usize) -> BoardOutcome {
        self.board_outcomes[board]
    }

    pub fn board_outcomes(&self) -> &[BoardOutcome; GRID_SIZE] {
        &self.board_outcomes
    }

    pub fn status(&self) -> GameStatus {
        if self.is_over() {
            GameStatus::Finished(self.game_winner)
        } else {
            GameStatus::InProgress {
                player: self.current_player,
                active_board: self.active_board(),
            }
        }
    }

    /// Number of marks placed so far
    pub fn move_count(&self) -> usize {
        self.boards.iter().flatten().filter(|c| c.is_some()).count()
    }

    // ========================================================================
    // MOVE GENERATION
    // ========================================================================

    /// Whether the current player may play `cell` of `board` (UI hint)
    pub fn is_playable(&self, board: usize, cell: usize) -> bool {
        board < GRID_SIZE
            && cell < GRID_SIZE
            && !self.is_over()
            && self.board_outcomes[board] == BoardOutcome::Undecided
            && self.active_board().map_or(true, |b| b == board)
            && self.boards[board][cell].is_none()
    }

    /// Every legal move for the current player
    pub fn legal_moves(&self) -> Vec<Move> {
        if self.is_over() {
            return vec![];
        }

        let mut moves = Vec::new();
        for board in 0..GRID_SIZE {
            if self.active_board().is_some_and(|b| b != board)
                || self.board_outcomes[board].is_decided()
            {
                continue;
            }
            for cell in 0..GRID_SIZE {
                if self.boards[board][cell].is_none() {
                    moves.push(Move::new(board as u8, cell as u8, self.current_player));
                }
            }
        }
        moves
    }

    // ========================================================================
    // APPLY MOVE
    // ========================================================================

    /// Check a move against the current state without applying it
    pub fn validate(&self, mv: Move) -> Result<(), MoveError> {
        if mv.player != self.current_player {
            return Err(MoveError::NotYourTurn {
                expected: self.current_player,
            });
        }
        if self.is_over() {
            return Err(MoveError::GameOver);
        }
        if mv.board as usize >= GRID_SIZE {
            return Err(MoveError::InvalidBoard(mv.board));
        }
        if mv.cell as usize >= GRID_SIZE {
            return Err(MoveError::InvalidCell(mv.cell));
        }
        if self.board_outcomes[mv.board as usize].is_decided() {
            return Err(MoveError::BoardAlreadyDecided(mv.board));
        }
        if let Some(required) = self.active_board {
            if required != mv.board {
                return Err(MoveError::WrongBoard { required });
            }
        }
        if self.boards[mv.board as usize][mv.cell as usize].is_some() {
            return Err(MoveError::CellTaken);
        }
        Ok(())
    }

    /// Validate and apply a move, returning the new state
    pub fn try_apply_move(&self, mv: Move) -> Result<Self, MoveError> {
        self.validate(mv)?;
        Ok(self.apply_move(mv))
    }

    /// Apply a move known to be legal (e.g. from `legal_moves`), return new state
    pub fn apply_move(&self, mv: Move) -> Self {
        let mut new_state = self.clone();
        new_state.apply_move_internal(mv);
        new_state
    }

    fn apply_move_internal(&mut self, mv: Move) {
        let board = mv.board as usize;
        let cell = mv.cell as usize;

        self.boards[board][cell] = Some(mv.player);

        let was_decided = self.board_outcomes[board].is_decided();
        self.board_outcomes[board] = evaluate_lines(&self.boards[board]);
        self.game_winner = evaluate_meta(&self.board_outcomes);

        // Winning or drawing a board frees the opponent; otherwise the cell
        // index routes them, unless that board is closed
        let just_decided = !was_decided && self.board_outcomes[board].is_decided();
        self.active_board = if just_decided || self.board_outcomes[cell].is_decided() {
            None
        } else {
            Some(mv.cell)
        };

        self.current_player = self.current_player.opponent();
    }
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for outer_row in 0..3 {
            if outer_row > 0 {
                writeln!(f, "------+-------+------")?;
            }
            for inner_row in 0..3 {
                for outer_col in 0..3 {
                    if outer_col > 0 {
                        write!(f, "| ")?;
                    }
                    let board = outer_row * 3 + outer_col;
                    for inner_col in 0..3 {
                        let cell = inner_row * 3 + inner_col;
                        let c = match (self.board_outcomes[board], self.boards[board][cell]) {
                            (_, Some(Player::X)) => 'X',
                            (_, Some(Player::O)) => 'O',
                            (BoardOutcome::Undecided, None) if self.is_playable(board, cell) => '.',
                            _ => ' ',
                        };
                        write!(f, "{} ", c)?;
                    }
                }
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn play(state: &GameState, board: u8, cell: u8) -> GameState {
        let mv = Move::new(board, cell, state.current_player());
        state.try_apply_move(mv).unwrap()
    }

    #[test]
    fn test_game_creation() {
        let game = GameState::new();
        assert_eq!(game.current_player(), Player::X);
        assert_eq!(game.active_board(), None);
        assert_eq!(game.game_winner(), BoardOutcome::Undecided);
        assert_eq!(game.legal_moves().len(), 81);
    }

    #[test]
    fn test_cell_routes_next_board() {
        let game = play(&GameState::new(), 0, 4);
        assert_eq!(game.active_board(), Some(4));
        assert_eq!(game.current_player(), Player::O);
        assert_eq!(game.legal_moves().len(), 9);

        let game = play(&game, 4, 0);
        assert_eq!(game.active_board(), Some(0));
        assert_eq!(game.current_player(), Player::X);
    }

    #[test]
    fn test_winning_board_frees_opponent() {
        // X completes the top row of board 0
        let mut game = GameState::new();
        game = play(&game, 0, 2); // O sent to 2
        game = play(&game, 2, 0); // X sent to 0
        game = play(&game, 0, 0); // O sent to 0
        game = play(&game, 0, 5); // X sent to 5
        game = play(&game, 5, 3); // O sent to 3
        game = play(&game, 3, 0); // X sent to 0
        assert_eq!(game.active_board(), Some(0));

        // Cell 1 would route to an open board, but the win overrides it
        game = play(&game, 0, 1);

        assert_eq!(game.board_outcome(0), BoardOutcome::Won(Player::X));
        assert_eq!(game.board_outcome(1), BoardOutcome::Undecided);
        assert_eq!(game.active_board(), None);
        assert_eq!(game.current_player(), Player::O);
    }

    #[test]
    fn test_sent_to_decided_board_plays_anywhere() {
        let mut boards = [[None; GRID_SIZE]; GRID_SIZE];
        boards[2] = [Some(Player::O); GRID_SIZE];
        let game = GameState::from_boards(boards, Player::X, None);
        assert_eq!(game.board_outcome(2), BoardOutcome::Won(Player::O));

        let game = play(&game, 0, 2);
        assert_eq!(game.active_board(), None);
    }

    #[test]
    fn test_rejection_is_idempotent() {
        let game = play(&GameState::new(), 0, 4);
        let bad = Move::new(1, 0, Player::O);

        let first = game.try_apply_move(bad);
        let second = game.try_apply_move(bad);
        assert_eq!(first, Err(MoveError::WrongBoard { required: 4 }));
        assert_eq!(first, second);
        assert_eq!(game.active_board(), Some(4));
        assert_eq!(game.cell(1, 0), None);
    }

    #[test]
    fn test_rejection_reasons() {
        let game = play(&GameState::new(), 0, 0);
        assert_eq!(
            game.try_apply_move(Move::new(0, 1, Player::X)),
            Err(MoveError::NotYourTurn { expected: Player::O })
        );
        assert_eq!(
            game.try_apply_move(Move::new(9, 0, Player::O)),
            Err(MoveError::InvalidBoard(9))
        );
        assert_eq!(
            game.try_apply_move(Move::new(0, 12, Player::O)),
            Err(MoveError::InvalidCell(12))
        );
        assert_eq!(
            game.try_apply_move(Move::new(0, 0, Player::O)),
            Err(MoveError::CellTaken)
        );
    }

    #[test]
    fn test_no_moves_after_game_over() {
        let mut boards = [[None; GRID_SIZE]; GRID_SIZE];
        for b in [0, 1, 2] {
            boards[b][0] = Some(Player::X);
            boards[b][1] = Some(Player::X);
            boards[b][2] = Some(Player::X);
        }
        let game = GameState::from_boards(boards, Player::O, None);
        assert_eq!(game.game_winner(), BoardOutcome::Won(Player::X));
        assert!(game.legal_moves().is_empty());
        assert_eq!(
            game.try_apply_move(Move::new(4, 4, Player::O)),
            Err(MoveError::GameOver)
        );
    }

    #[test]
    fn test_drawn_small_board() {
        use Player::{O, X};
        let mut boards = [[None; GRID_SIZE]; GRID_SIZE];
        boards[7] = [
            Some(X), Some(O), Some(X),
            Some(X), Some(O), Some(O),
            Some(O), Some(X), Some(X),
        ];
        let game = GameState::from_boards(boards, Player::X, Some(7));
        assert_eq!(game.board_outcome(7), BoardOutcome::Draw);
        // Active board pointed at a closed board and was normalized away
        assert_eq!(game.active_board(), None);
    }

    #[test]
    fn test_wire_round_trip() {
        let mut game = GameState::new();
        for (b, c) in [(0, 4), (4, 0), (0, 8), (8, 0), (0, 0)] {
            game = play(&game, b, c);
        }
        let json = serde_json::to_string(&game).unwrap();
        let parsed: GameState = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, game);
    }

    #[test]
    fn test_wire_format_field_names() {
        let game = play(&GameState::new(), 0, 4);
        let json = serde_json::to_value(&game).unwrap();
        assert_eq!(json["currentPlayer"], "O");
        assert_eq!(json["activeBoard"], 4);
        assert_eq!(json["boards"][0][4], "X");
        assert!(json["boardWinners"][0].is_null());
        assert!(json["gameWinner"].is_null());
    }

    #[test]
    fn test_draw_outcome_serializes_as_tag() {
        let json = serde_json::to_string(&BoardOutcome::Draw).unwrap();
        assert_eq!(json, "\"DRAW\"");
        let parsed: BoardOutcome = serde_json::from_str("null").unwrap();
        assert_eq!(parsed, BoardOutcome::Undecided);
    }
}
