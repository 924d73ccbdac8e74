//! Solo command - human (X) against the AI (O)
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run() - orchestration
//! - Level 2: build_ai(), Session::run()
//! - Level 3: (delegated to session / uttt-core)

use std::io;
use std::time::Duration;

use anyhow::Result;
use clap::Args;

use uttt_core::{AiConfig, AiPlayer, Difficulty};

use crate::session::{Seat, Session};
use crate::terminal;

// ============================================================================
// COMMAND ARGUMENTS
// ============================================================================

#[derive(Args)]
pub struct SoloArgs {
    /// AI strength: easy, medium or hard
    #[arg(long, default_value = "medium")]
    pub difficulty: Difficulty,

    /// Delay before the AI's move is shown, in milliseconds
    #[arg(long, default_value = "300")]
    pub think_ms: u64,
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

pub fn run(args: SoloArgs, seed: Option<u64>) -> Result<()> {
    let config = build_config(&args, seed);
    tracing::info!("Solo game against {} AI", config.difficulty);

    let ai = Seat::Ai {
        player: AiPlayer::from_config(&config),
        think_delay: Duration::from_millis(config.think_delay_ms),
    };

    println!("You are X. Enter moves as '<board> <cell>' (0-8, row-major), 'q' to quit.");
    let stdin = io::stdin();
    let result = Session::new(Seat::Human, ai).run(&mut stdin.lock(), &mut io::stdout())?;

    if !result.quit {
        println!("\nGame over after {} moves: {}", result.moves.len(), terminal::status_line(&result.final_state));
    }
    Ok(())
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

fn build_config(args: &SoloArgs, seed: Option<u64>) -> AiConfig {
    let config = AiConfig::new(args.difficulty).with_think_delay(args.think_ms);
    match seed {
        Some(s) => config.with_seed(s),
        None => config,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_config() {
        let args = SoloArgs {
            difficulty: Difficulty::Hard,
            think_ms: 0,
        };
        let config = build_config(&args, Some(9));
        assert_eq!(config.difficulty, Difficulty::Hard);
        assert_eq!(config.seed, Some(9));
        assert_eq!(config.think_delay_ms, 0);
    }
}
