//! Local command - two humans sharing one terminal

use std::io;

use anyhow::Result;
use clap::Args;

use crate::session::{Seat, Session};
use crate::terminal;

#[derive(Args)]
pub struct LocalArgs {}

pub fn run(_args: LocalArgs) -> Result<()> {
    tracing::info!("Local two-player game");
    println!("X moves first. Enter moves as '<board> <cell>' (0-8, row-major), 'q' to quit.");

    let stdin = io::stdin();
    let result = Session::new(Seat::Human, Seat::Human).run(&mut stdin.lock(), &mut io::stdout())?;

    if !result.quit {
        println!("\nGame over after {} moves: {}", result.moves.len(), terminal::status_line(&result.final_state));
    }
    Ok(())
}
