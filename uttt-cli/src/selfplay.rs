//! Selfplay command - AI against AI, many games in parallel
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run() - orchestration
//! - Level 2: play_match(), report_results()
//! - Level 3: play_single_game(), compute_statistics()
//! - Level 4: formatting utilities

use anyhow::{Context, Result};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;

use uttt_core::{AiPlayer, BoardOutcome, Difficulty, GameState, Move, Player};

// ============================================================================
// COMMAND ARGUMENTS (Level 4 - Configuration)
// ============================================================================

#[derive(Args)]
pub struct SelfplayArgs {
    /// Difficulty of the X player
    #[arg(long, default_value = "medium")]
    pub x: Difficulty,

    /// Difficulty of the O player
    #[arg(long, default_value = "medium")]
    pub o: Difficulty,

    /// Number of games to play
    #[arg(long, default_value = "10")]
    pub games: usize,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,
}

/// Result of a single game
#[derive(Clone, Debug)]
struct GameRecord {
    game_number: usize,
    result: BoardOutcome,
    #[allow(dead_code)] // Kept for replay
    moves: Vec<Move>,
}

/// Aggregated match results
#[derive(Clone, Debug)]
struct MatchResults {
    x: Difficulty,
    o: Difficulty,
    games: Vec<GameRecord>,
    x_wins: usize,
    o_wins: usize,
    draws: usize,
    avg_moves: f32,
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

/// Run selfplay command
///
/// 1. Play the match (games in parallel)
/// 2. Report results
pub fn run(args: SelfplayArgs, seed: Option<u64>) -> Result<()> {
    tracing::info!("Starting selfplay: X={} vs O={} ({} games)", args.x, args.o, args.games);

    let results = play_match(&args, seed.unwrap_or(42), !args.json);

    report_results(&results, &args)
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

/// Play all games; game `i` is seeded with `base_seed + i`
fn play_match(args: &SelfplayArgs, base_seed: u64, show_progress: bool) -> MatchResults {
    let progress = if show_progress {
        let pb = ProgressBar::new(args.games as u64);
        if let Ok(style) = ProgressStyle::with_template("{bar:40} {pos}/{len} games ({elapsed_precise})") {
            pb.set_style(style);
        }
        pb
    } else {
        ProgressBar::hidden()
    };

    let games: Vec<GameRecord> = (0..args.games)
        .into_par_iter()
        .map(|i| {
            let record = play_single_game(args.x, args.o, i + 1, base_seed.wrapping_add(i as u64));
            progress.inc(1);
            record
        })
        .collect();
    progress.finish_and_clear();

    for record in &games {
        tracing::debug!(
            "Game {}: {:?} ({} moves)",
            record.game_number,
            record.result,
            record.moves.len()
        );
    }

    compute_statistics(args.x, args.o, games)
}

/// Report match results
fn report_results(results: &MatchResults, args: &SelfplayArgs) -> Result<()> {
    if args.json {
        print_json_results(results)
    } else {
        print_text_results(results);
        Ok(())
    }
}

// ============================================================================
// LEVEL 3 - STEPS
// ============================================================================

/// Play one game; each side gets its own RNG stream from the game seed
fn play_single_game(x: Difficulty, o: Difficulty, game_number: usize, seed: u64) -> GameRecord {
    let mut x_ai = AiPlayer::with_seed(x, seed);
    let mut o_ai = AiPlayer::with_seed(o, seed.wrapping_mul(31).wrapping_add(7));

    let mut state = GameState::new();
    let mut moves = Vec::new();

    while !state.is_over() {
        let ai = match state.current_player() {
            Player::X => &mut x_ai,
            Player::O => &mut o_ai,
        };
        let Some(mv) = ai.select_move(&state) else {
            break;
        };
        state = state.apply_move(mv);
        moves.push(mv);
    }

    GameRecord {
        game_number,
        result: state.game_winner(),
        moves,
    }
}

/// Compute aggregate statistics from game records
fn compute_statistics(x: Difficulty, o: Difficulty, games: Vec<GameRecord>) -> MatchResults {
    let count = |outcome: BoardOutcome| games.iter().filter(|g| g.result == outcome).count();
    let x_wins = count(BoardOutcome::Won(Player::X));
    let o_wins = count(BoardOutcome::Won(Player::O));
    let draws = count(BoardOutcome::Draw);

    let total_moves: usize = games.iter().map(|g| g.moves.len()).sum();
    let avg_moves = if games.is_empty() {
        0.0
    } else {
        total_moves as f32 / games.len() as f32
    };

    MatchResults {
        x,
        o,
        games,
        x_wins,
        o_wins,
        draws,
        avg_moves,
    }
}

// ============================================================================
// LEVEL 4 - UTILITIES
// ============================================================================

fn percent(n: usize, total: usize) -> f32 {
    if total > 0 {
        n as f32 / total as f32 * 100.0
    } else {
        0.0
    }
}

fn outcome_label(outcome: BoardOutcome) -> &'static str {
    match outcome {
        BoardOutcome::Won(Player::X) => "X",
        BoardOutcome::Won(Player::O) => "O",
        BoardOutcome::Draw => "draw",
        BoardOutcome::Undecided => "unfinished",
    }
}

/// Print results as JSON
fn print_json_results(results: &MatchResults) -> Result<()> {
    #[derive(serde::Serialize)]
    struct JsonGame {
        game_number: usize,
        result: &'static str,
        moves: usize,
    }

    #[derive(serde::Serialize)]
    struct JsonOutput {
        x: Difficulty,
        o: Difficulty,
        total_games: usize,
        x_wins: usize,
        o_wins: usize,
        draws: usize,
        avg_moves: f32,
        games: Vec<JsonGame>,
    }

    let output = JsonOutput {
        x: results.x,
        o: results.o,
        total_games: results.games.len(),
        x_wins: results.x_wins,
        o_wins: results.o_wins,
        draws: results.draws,
        avg_moves: results.avg_moves,
        games: results
            .games
            .iter()
            .map(|g| JsonGame {
                game_number: g.game_number,
                result: outcome_label(g.result),
                moves: g.moves.len(),
            })
            .collect(),
    };

    let json = serde_json::to_string_pretty(&output).context("Failed to serialize results")?;
    println!("{}", json);
    Ok(())
}

/// Print results as text
fn print_text_results(results: &MatchResults) {
    let total = results.games.len();

    println!("\n=== Selfplay Results: X={} vs O={} ===", results.x, results.o);
    println!("Total games: {}", total);
    println!("X wins:  {} ({:.1}%)", results.x_wins, percent(results.x_wins, total));
    println!("O wins:  {} ({:.1}%)", results.o_wins, percent(results.o_wins, total));
    println!("Draws:   {} ({:.1}%)", results.draws, percent(results.draws, total));
    println!("Average game length: {:.1} moves", results.avg_moves);
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_game_is_reproducible() {
        let a = play_single_game(Difficulty::Easy, Difficulty::Medium, 1, 11);
        let b = play_single_game(Difficulty::Easy, Difficulty::Medium, 1, 11);
        assert_eq!(a.moves, b.moves);
        assert_eq!(a.result, b.result);
        assert!(a.result.is_decided());
    }

    #[test]
    fn test_statistics_add_up() {
        let args = SelfplayArgs {
            x: Difficulty::Easy,
            o: Difficulty::Easy,
            games: 6,
            json: true,
        };
        let results = play_match(&args, 3, false);
        assert_eq!(results.games.len(), 6);
        assert_eq!(results.x_wins + results.o_wins + results.draws, 6);
        assert!(results.avg_moves > 0.0);
    }

    #[test]
    fn test_percent_of_zero_games() {
        assert_eq!(percent(0, 0), 0.0);
        assert_eq!(percent(1, 4), 25.0);
    }
}
