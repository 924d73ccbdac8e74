//! Position evaluation

use crate::board::{is_corner, winning_slots, CENTER, CORNERS, GRID_SIZE, LINES};
use crate::game::{BoardOutcome, GameState, Move, Player, SmallBoard};
use serde::{Deserialize, Serialize};

/// Score of a won game at the root of the search
pub const WIN_VALUE: f32 = 10000.0;

/// Heuristic weights for move scoring
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Heuristics {
    /// Move completes a small-board line
    pub small_win: f32,
    /// Move also completes a meta line
    pub meta_win: f32,
    /// Move blocks an immediate small-board win
    pub small_block: f32,
    /// Board is the one the opponent needs to win the game
    pub meta_capture: f32,
    /// Board blocks an opponent meta threat (same board, both apply)
    pub meta_block: f32,
    /// Playing the center cell of a board
    pub center_cell: f32,
    /// Playing a corner cell of a board
    pub corner_cell: f32,
    /// Opponent sent to a closed board (free choice)
    pub send_free_choice: f32,
    /// Opponent sent where they can win a board at once
    pub send_opponent_win: f32,
    /// Opponent sent where the mover threatens a board
    pub send_own_threat: f32,
    /// Upper bound of the uniform noise added per candidate
    pub noise: f32,
}

impl Default for Heuristics {
    fn default() -> Self {
        Self {
            small_win: 1000.0,
            meta_win: 5000.0,
            small_block: 500.0,
            meta_capture: 300.0,
            meta_block: 200.0,
            center_cell: 15.0,
            corner_cell: 8.0,
            send_free_choice: -50.0,
            send_opponent_win: -30.0,
            send_own_threat: 20.0,
            noise: 5.0,
        }
    }
}

// ============================================================================
// SMALL BOARD
// ============================================================================

/// Positional score of one small board from `player`'s perspective
pub fn small_board_score(cells: &SmallBoard, player: Player) -> i32 {
    let opponent = player.opponent();
    let mut score = 0;

    let ownership = |cell: Option<Player>| match cell {
        Some(p) if p == player => 1,
        Some(_) => -1,
        None => 0,
    };

    score += 4 * ownership(cells[CENTER]);
    for corner in CORNERS {
        score += 2 * ownership(cells[corner]);
    }

    for line in LINES {
        let mine = line.iter().filter(|&&i| cells[i] == Some(player)).count();
        let theirs = line.iter().filter(|&&i| cells[i] == Some(opponent)).count();
        match (mine, theirs) {
            (2, 0) => score += 10,
            (1, 0) => score += 2,
            (0, 2) => score -= 10,
            (0, 1) => score -= 2,
            _ => {}
        }
    }

    score
}

/// Cells that would win `board` for `player` right now (empty if the board is closed)
pub fn immediate_wins(state: &GameState, board: usize, player: Player) -> Vec<usize> {
    if state.board_outcome(board).is_decided() {
        return vec![];
    }
    winning_slots(state.board(board), player)
}

// ============================================================================
// META BOARD
// ============================================================================

/// Line-threat score of the meta board from `player`'s perspective
pub fn meta_score(outcomes: &[BoardOutcome; GRID_SIZE], player: Player) -> f32 {
    let opponent = player.opponent();
    let mut score = 0.0;

    for line in LINES {
        if line.iter().any(|&i| outcomes[i] == BoardOutcome::Draw) {
            continue;
        }
        let mine = line
            .iter()
            .filter(|&&i| outcomes[i] == BoardOutcome::Won(player))
            .count();
        let theirs = line
            .iter()
            .filter(|&&i| outcomes[i] == BoardOutcome::Won(opponent))
            .count();
        match (mine, theirs) {
            (2, 0) => score += 500.0,
            (1, 0) => score += 50.0,
            (0, 2) => score -= 500.0,
            (0, 1) => score -= 50.0,
            _ => {}
        }
    }

    for (idx, &outcome) in outcomes.iter().enumerate() {
        let weight = if idx == CENTER {
            100.0
        } else if is_corner(idx) {
            30.0
        } else {
            continue;
        };
        match outcome {
            BoardOutcome::Won(p) if p == player => score += weight,
            BoardOutcome::Won(_) => score -= weight,
            _ => {}
        }
    }

    score
}

/// Undecided boards that would complete a meta line for `player`
pub fn meta_threats(state: &GameState, player: Player) -> Vec<usize> {
    winning_slots(state.board_outcomes(), player)
}

/// Evaluate a position from `player`'s perspective, with a bonus for
/// reaching a decided game in fewer plies
pub fn evaluate_with_ply(state: &GameState, player: Player, ply: u32) -> f32 {
    match state.game_winner() {
        BoardOutcome::Won(p) if p == player => WIN_VALUE - ply as f32,
        BoardOutcome::Won(_) => -(WIN_VALUE - ply as f32),
        BoardOutcome::Draw => 0.0,
        BoardOutcome::Undecided => meta_score(state.board_outcomes(), player),
    }
}

// ============================================================================
// MOVE SCORING
// ============================================================================

/// Where `cell` routes the opponent after the mover played it.
/// `after` is the state once the move has been applied.
pub fn send_location_score(after: &GameState, cell: usize, mover: Player, heuristics: &Heuristics) -> f32 {
    let opponent = mover.opponent();

    if after.board_outcome(cell).is_decided() {
        return heuristics.send_free_choice;
    }
    if !immediate_wins(after, cell, opponent).is_empty() {
        return heuristics.send_opponent_win;
    }
    if !immediate_wins(after, cell, mover).is_empty() {
        return heuristics.send_own_threat;
    }
    small_board_score(after.board(cell), mover) as f32 / 10.0
}

/// Deterministic heuristic score of a legal move (noise excluded)
pub fn score_move(state: &GameState, mv: Move, heuristics: &Heuristics) -> f32 {
    let me = mv.player;
    let opponent = me.opponent();
    let board = mv.board as usize;
    let cell = mv.cell as usize;
    let after = state.apply_move(mv);

    let mut score = 0.0;

    if after.board_outcome(board) == BoardOutcome::Won(me) {
        score += heuristics.small_win;
        if after.game_winner() == BoardOutcome::Won(me) {
            score += heuristics.meta_win;
        }
    }

    if immediate_wins(state, board, opponent).contains(&cell) {
        score += heuristics.small_block;
    }

    if meta_threats(state, opponent).contains(&board) {
        score += heuristics.meta_capture + heuristics.meta_block;
    }

    score += small_board_score(after.board(board), me) as f32 / 10.0;

    if cell == CENTER {
        score += heuristics.center_cell;
    } else if is_corner(cell) {
        score += heuristics.corner_cell;
    }

    score + send_location_score(&after, cell, me, heuristics)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_board_score_symmetric() {
        let mut cells = [None; GRID_SIZE];
        cells[CENTER] = Some(Player::X);
        let x = small_board_score(&cells, Player::X);
        let o = small_board_score(&cells, Player::O);
        assert!(x > 0);
        assert_eq!(x, -o);
    }

    #[test]
    fn test_small_board_two_in_a_row() {
        let mut cells = [None; GRID_SIZE];
        cells[1] = Some(Player::O);
        cells[7] = Some(Player::O);
        // Column 1-4-7 open with two O marks
        assert!(small_board_score(&cells, Player::O) >= 10);
    }

    #[test]
    fn test_meta_score_empty_board() {
        let outcomes = [BoardOutcome::Undecided; GRID_SIZE];
        assert_eq!(meta_score(&outcomes, Player::X), 0.0);
    }

    #[test]
    fn test_meta_score_center_board() {
        let mut outcomes = [BoardOutcome::Undecided; GRID_SIZE];
        outcomes[CENTER] = BoardOutcome::Won(Player::O);
        // 4 lines through the center with one O each, plus the center weight
        assert_eq!(meta_score(&outcomes, Player::O), 4.0 * 50.0 + 100.0);
        assert_eq!(meta_score(&outcomes, Player::X), -(4.0 * 50.0 + 100.0));
    }

    #[test]
    fn test_faster_wins_score_higher() {
        let mut boards = [[None; GRID_SIZE]; GRID_SIZE];
        for b in [0, 4, 8] {
            boards[b][0] = Some(Player::X);
            boards[b][1] = Some(Player::X);
            boards[b][2] = Some(Player::X);
        }
        let state = GameState::from_boards(boards, Player::O, None);
        assert!(evaluate_with_ply(&state, Player::X, 1) > evaluate_with_ply(&state, Player::X, 3));
        assert!(evaluate_with_ply(&state, Player::O, 1) < evaluate_with_ply(&state, Player::O, 3));
    }

    #[test]
    fn test_send_to_closed_board_penalized() {
        let mut boards = [[None; GRID_SIZE]; GRID_SIZE];
        boards[5] = [Some(Player::O); GRID_SIZE];
        let state = GameState::from_boards(boards, Player::X, None);
        let h = Heuristics::default();

        let mv = Move::new(0, 5, Player::X);
        let after = state.apply_move(mv);
        assert_eq!(send_location_score(&after, 5, Player::X, &h), h.send_free_choice);
    }

    #[test]
    fn test_score_move_prefers_board_win() {
        let mut boards = [[None; GRID_SIZE]; GRID_SIZE];
        boards[3][0] = Some(Player::O);
        boards[3][1] = Some(Player::O);
        let state = GameState::from_boards(boards, Player::O, Some(3));
        let h = Heuristics::default();

        let win = score_move(&state, Move::new(3, 2, Player::O), &h);
        let other = score_move(&state, Move::new(3, 8, Player::O), &h);
        assert!(win > other + 500.0);
    }

    #[test]
    fn test_meta_threat_board_gets_both_bonuses() {
        // X owns boards 0 and 1; board 2 only has X in the center
        let mut boards = [[None; GRID_SIZE]; GRID_SIZE];
        boards[0] = [Some(Player::X), Some(Player::X), Some(Player::X), None, None, None, None, None, None];
        boards[1] = boards[0];
        boards[2][CENTER] = Some(Player::X);
        let state = GameState::from_boards(boards, Player::O, Some(2));
        let mv = Move::new(2, 0, Player::O);

        let full = score_move(&state, mv, &Heuristics::default());
        let no_capture = score_move(&state, mv, &Heuristics { meta_capture: 0.0, ..Heuristics::default() });
        let no_block = score_move(&state, mv, &Heuristics { meta_block: 0.0, ..Heuristics::default() });

        assert!((full - no_capture - 300.0).abs() < 1e-3, "capture added {}", full - no_capture);
        assert!((full - no_block - 200.0).abs() < 1e-3, "block added {}", full - no_block);
    }

    #[test]
    fn test_no_meta_bonus_off_the_threat_board() {
        let mut boards = [[None; GRID_SIZE]; GRID_SIZE];
        boards[0] = [Some(Player::X), Some(Player::X), Some(Player::X), None, None, None, None, None, None];
        let state = GameState::from_boards(boards, Player::O, Some(5));
        let mv = Move::new(5, 0, Player::O);

        let full = score_move(&state, mv, &Heuristics::default());
        let no_meta = score_move(
            &state,
            mv,
            &Heuristics {
                meta_capture: 0.0,
                meta_block: 0.0,
                ..Heuristics::default()
            },
        );
        assert_eq!(full, no_meta);
    }
}
