//! Board geometry and line evaluation
//!
//! Both levels of the game are 3x3 grids indexed 0-8 in row-major order.
//! The same line table and evaluator serve small boards (cells) and the
//! meta board (per-board outcomes).

use crate::game::{BoardOutcome, Player};

/// Slots in a 3x3 grid
pub const GRID_SIZE: usize = 9;

/// Center slot index
pub const CENTER: usize = 4;

/// Corner slot indices
pub const CORNERS: [usize; 4] = [0, 2, 6, 8];

/// The 8 winning triples
pub const LINES: [[usize; 3]; 8] = [
    [0, 1, 2], // rows
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6], // columns
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8], // diagonals
    [2, 4, 6],
];

/// A slot that can take part in a line
pub trait LineCell: Copy {
    /// Player owning this slot, if any
    fn owner(self) -> Option<Player>;

    /// Whether the slot can still be claimed
    fn is_open(self) -> bool;
}

impl LineCell for Option<Player> {
    fn owner(self) -> Option<Player> {
        self
    }

    fn is_open(self) -> bool {
        self.is_none()
    }
}

impl LineCell for BoardOutcome {
    fn owner(self) -> Option<Player> {
        match self {
            BoardOutcome::Won(p) => Some(p),
            _ => None,
        }
    }

    fn is_open(self) -> bool {
        self == BoardOutcome::Undecided
    }
}

/// Check whether a slot index is a corner
pub fn is_corner(idx: usize) -> bool {
    CORNERS.contains(&idx)
}

/// Player owning a complete line, if any
pub fn line_winner<T: LineCell>(slots: &[T; GRID_SIZE]) -> Option<Player> {
    LINES.iter().find_map(|&[a, b, c]| {
        let owner = slots[a].owner()?;
        (slots[b].owner() == Some(owner) && slots[c].owner() == Some(owner)).then_some(owner)
    })
}

/// Evaluate a 3x3 grid: line winner, else Draw when nothing is open, else Undecided
pub fn evaluate_lines<T: LineCell>(slots: &[T; GRID_SIZE]) -> BoardOutcome {
    if let Some(winner) = line_winner(slots) {
        return BoardOutcome::Won(winner);
    }
    if slots.iter().all(|s| !s.is_open()) {
        BoardOutcome::Draw
    } else {
        BoardOutcome::Undecided
    }
}

/// A line is open for `player` if no slot is held by the opponent or blocked
/// by a drawn board
pub fn line_open_for<T: LineCell>(slots: &[T; GRID_SIZE], line: [usize; 3], player: Player) -> bool {
    line.iter()
        .all(|&i| slots[i].is_open() || slots[i].owner() == Some(player))
}

/// No line remains open for either player
pub fn is_unwinnable<T: LineCell>(slots: &[T; GRID_SIZE]) -> bool {
    [Player::X, Player::O].iter().all(|&p| {
        !LINES.iter().any(|&line| line_open_for(slots, line, p))
    })
}

/// Evaluate the meta board, including early draws when every line is dead
pub fn evaluate_meta(outcomes: &[BoardOutcome; GRID_SIZE]) -> BoardOutcome {
    match evaluate_lines(outcomes) {
        BoardOutcome::Undecided if is_unwinnable(outcomes) => BoardOutcome::Draw,
        outcome => outcome,
    }
}

/// Open slots that would complete a line for `player`
pub fn winning_slots<T: LineCell>(slots: &[T; GRID_SIZE], player: Player) -> Vec<usize> {
    let mut found = Vec::new();
    for line in LINES {
        let owned = line
            .iter()
            .filter(|&&i| slots[i].owner() == Some(player))
            .count();
        if owned != 2 {
            continue;
        }
        if let Some(&open) = line.iter().find(|&&i| slots[i].is_open()) {
            if !found.contains(&open) {
                found.push(open);
            }
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    const X: Option<Player> = Some(Player::X);
    const O: Option<Player> = Some(Player::O);
    const E: Option<Player> = None;

    #[test]
    fn test_row_win() {
        let cells = [X, X, X, E, E, E, E, E, E];
        assert_eq!(evaluate_lines(&cells), BoardOutcome::Won(Player::X));
    }

    #[test]
    fn test_every_line_detected() {
        for line in LINES {
            let mut cells = [E; GRID_SIZE];
            for i in line {
                cells[i] = O;
            }
            assert_eq!(line_winner(&cells), Some(Player::O), "line {:?}", line);
        }
    }

    #[test]
    fn test_full_board_draw() {
        let cells = [X, O, X, X, O, O, O, X, X];
        assert_eq!(evaluate_lines(&cells), BoardOutcome::Draw);
    }

    #[test]
    fn test_partial_board_undecided() {
        let cells = [X, O, X, E, O, E, E, X, E];
        assert_eq!(evaluate_lines(&cells), BoardOutcome::Undecided);
    }

    #[test]
    fn test_drawn_boards_never_complete_a_meta_line() {
        use BoardOutcome::*;
        let outcomes = [
            Draw, Draw, Draw,
            Undecided, Undecided, Undecided,
            Undecided, Undecided, Undecided,
        ];
        assert_eq!(line_winner(&outcomes), None);
        assert_eq!(evaluate_meta(&outcomes), Undecided);
    }

    #[test]
    fn test_meta_unwinnable_draw_before_board_fills() {
        use BoardOutcome::*;
        let x = Won(Player::X);
        let o = Won(Player::O);
        // Every line holds both players or a drawn board; slot 8 still undecided
        let outcomes = [x, o, x, x, o, o, o, x, Undecided];
        assert!(is_unwinnable(&outcomes));
        assert_eq!(evaluate_meta(&outcomes), Draw);
    }

    #[test]
    fn test_meta_open_line_keeps_game_alive() {
        use BoardOutcome::*;
        let x = Won(Player::X);
        let outcomes = [
            x, Draw, Undecided,
            Undecided, Undecided, Undecided,
            Undecided, Undecided, Undecided,
        ];
        assert!(!is_unwinnable(&outcomes));
        assert_eq!(evaluate_meta(&outcomes), Undecided);
    }

    #[test]
    fn test_winning_slots() {
        let cells = [X, X, E, E, O, E, E, E, O];
        assert_eq!(winning_slots(&cells, Player::X), vec![2]);
        // O's only pair sits on the diagonal X already holds
        assert!(winning_slots(&cells, Player::O).is_empty());
    }
}
