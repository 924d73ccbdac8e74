//! UTTT Core - Game engine and AI
//!
//! This crate provides the core game logic for Ultimate Tic-Tac-Toe:
//! - Board geometry and the shared line evaluator (small and meta boards)
//! - Game state, move validation and move application
//! - Positional evaluation and move heuristics
//! - AI players (random, heuristic, alpha-beta minimax)

pub mod board;
pub mod game;
pub mod eval;
pub mod ai;
pub mod config;

// Re-exports for convenient access
pub use board::{evaluate_lines, evaluate_meta, is_unwinnable, LineCell, LINES, GRID_SIZE};
pub use game::{BoardOutcome, Cell, GameState, GameStatus, Move, MoveError, Player, SmallBoard};
pub use eval::{Heuristics, WIN_VALUE};
pub use ai::AiPlayer;
pub use config::{AiConfig, Difficulty};
