//! AI opponent: randomized, heuristic and alpha-beta minimax players

use crate::board::CENTER;
use crate::config::{AiConfig, Difficulty};
use crate::eval::{evaluate_with_ply, immediate_wins, score_move, send_location_score, Heuristics};
use crate::game::{BoardOutcome, GameState, Move, Player};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

// ============================================================================
// CONSTANTS
// ============================================================================

/// Chance that Easy ignores tactics and plays a random move
const EASY_RANDOM_RATE: f64 = 0.7;

/// Weight of the send-location score in Hard's root selection
const SEND_LOCATION_WEIGHT: f32 = 0.1;

/// Search depth for a given number of root candidates
pub fn search_depth(legal_moves: usize) -> u32 {
    match legal_moves {
        n if n >= 31 => 3,
        n if n >= 16 => 4,
        _ => 5,
    }
}

// ============================================================================
// AI PLAYER
// ============================================================================

/// AI player for any difficulty. Always plays for the side to move.
pub struct AiPlayer {
    pub difficulty: Difficulty,
    pub heuristics: Heuristics,
    rng: ChaCha8Rng,
}

impl AiPlayer {
    pub fn new(difficulty: Difficulty) -> Self {
        Self::with_seed(difficulty, 42)
    }

    pub fn with_seed(difficulty: Difficulty, seed: u64) -> Self {
        Self {
            difficulty,
            heuristics: Heuristics::default(),
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn from_config(config: &AiConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        Self {
            difficulty: config.difficulty,
            heuristics: config.heuristics.clone(),
            rng,
        }
    }

    /// Pick a move for the current player. `None` when no legal move exists.
    pub fn select_move(&mut self, state: &GameState) -> Option<Move> {
        match self.difficulty {
            Difficulty::Easy => self.select_easy(state),
            Difficulty::Medium => self.select_medium(state),
            Difficulty::Hard => select_hard(state, &self.heuristics),
        }
    }

    /// Play a complete game against itself
    pub fn play_game(&mut self, initial: GameState) -> (GameState, Vec<Move>) {
        let mut state = initial;
        let mut history = Vec::new();

        while !state.is_over() {
            match self.select_move(&state) {
                Some(mv) => {
                    history.push(mv);
                    state = state.apply_move(mv);
                }
                None => break,
            }
        }

        (state, history)
    }

    // ========================================================================
    // EASY
    // ========================================================================

    fn select_easy(&mut self, state: &GameState) -> Option<Move> {
        let moves = state.legal_moves();
        if moves.is_empty() {
            return None;
        }

        if self.rng.gen_bool(EASY_RANDOM_RATE) {
            return moves.choose(&mut self.rng).copied();
        }

        easy_tactics(state, &moves).or_else(|| moves.choose(&mut self.rng).copied())
    }

    // ========================================================================
    // MEDIUM
    // ========================================================================

    fn select_medium(&mut self, state: &GameState) -> Option<Move> {
        let moves = state.legal_moves();
        let mut best: Option<(Move, f32)> = None;

        for mv in moves {
            let jitter = self.rng.gen::<f32>() * self.heuristics.noise;
            let score = score_move(state, mv, &self.heuristics) + jitter;
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((mv, score));
            }
        }

        best.map(|(mv, _)| mv)
    }
}

/// Own small-board win first, then a block of the opponent's
fn easy_tactics(state: &GameState, moves: &[Move]) -> Option<Move> {
    let me = state.current_player();
    tactical_move(state, moves, me).or_else(|| tactical_move(state, moves, me.opponent()))
}

/// First legal move that takes a cell completing a line for `player` in its board
fn tactical_move(state: &GameState, moves: &[Move], player: Player) -> Option<Move> {
    moves
        .iter()
        .find(|mv| immediate_wins(state, mv.board as usize, player).contains(&(mv.cell as usize)))
        .copied()
}

// ============================================================================
// MOVE ORDERING
// ============================================================================

/// Ordering class for a move (lower = search first)
fn move_class(state: &GameState, mv: &Move) -> u8 {
    let board = mv.board as usize;
    let cell = mv.cell as usize;
    if immediate_wins(state, board, mv.player).contains(&cell) {
        0
    } else if immediate_wins(state, board, mv.player.opponent()).contains(&cell) {
        1
    } else if cell == CENTER {
        2
    } else {
        3
    }
}

fn order_moves(state: &GameState, moves: &mut [Move]) {
    moves.sort_by_cached_key(|mv| move_class(state, mv));
}

// ============================================================================
// MINIMAX WITH ALPHA-BETA
// ============================================================================

fn minimax(
    state: &GameState,
    depth: u32,
    mut alpha: f32,
    mut beta: f32,
    maximizing: bool,
    me: Player,
    ply: u32,
) -> f32 {
    if state.is_over() || depth == 0 {
        return evaluate_with_ply(state, me, ply);
    }

    let mut moves = state.legal_moves();
    if moves.is_empty() {
        return evaluate_with_ply(state, me, ply);
    }
    order_moves(state, &mut moves);

    if maximizing {
        let mut best = f32::NEG_INFINITY;
        for mv in moves {
            let child = state.apply_move(mv);
            let score = minimax(&child, depth - 1, alpha, beta, false, me, ply + 1);
            best = best.max(score);
            alpha = alpha.max(score);
            if beta <= alpha {
                break;
            }
        }
        best
    } else {
        let mut best = f32::INFINITY;
        for mv in moves {
            let child = state.apply_move(mv);
            let score = minimax(&child, depth - 1, alpha, beta, true, me, ply + 1);
            best = best.min(score);
            beta = beta.min(score);
            if beta <= alpha {
                break;
            }
        }
        best
    }
}

fn select_hard(state: &GameState, heuristics: &Heuristics) -> Option<Move> {
    let mut moves = state.legal_moves();
    if moves.is_empty() {
        return None;
    }
    let me = state.current_player();

    // Immediate overall win: no search needed
    if let Some(&winning) = moves
        .iter()
        .find(|&&mv| state.apply_move(mv).game_winner() == BoardOutcome::Won(me))
    {
        return Some(winning);
    }

    order_moves(state, &mut moves);
    let depth = search_depth(moves.len());

    let mut best: Option<(Move, f32)> = None;
    for mv in moves {
        let child = state.apply_move(mv);
        let score = minimax(
            &child,
            depth - 1,
            f32::NEG_INFINITY,
            f32::INFINITY,
            false,
            me,
            1,
        ) + SEND_LOCATION_WEIGHT * send_location_score(&child, mv.cell as usize, me, heuristics);

        // Full window per root candidate, so scores are exact; ties go to the
        // lowest (board, cell) to keep the result independent of ordering
        let better = match best {
            None => true,
            Some((held, s)) => score > s || (score == s && (mv.board, mv.cell) < (held.board, held.cell)),
        };
        if better {
            best = Some((mv, score));
        }
    }

    best.map(|(mv, _)| mv)
}

// ============================================================================
// TESTS
// ============================================================================
