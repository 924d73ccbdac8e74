//! Local game loop for terminal play
//!
//! Each seat is either a human reading from the terminal or an AI. After any
//! transition that leaves an AI to move, the loop waits the think delay, asks
//! the AI once, and feeds its move back through the rules engine.

use std::io::{BufRead, Write};
use std::time::Duration;

use anyhow::{Context, Result};

use uttt_core::{AiPlayer, GameState, Move, Player};

use crate::terminal::{self, Command};

pub enum Seat {
    Human,
    Ai { player: AiPlayer, think_delay: Duration },
}

/// How the session ended
#[derive(Debug)]
pub struct SessionResult {
    pub final_state: GameState,
    pub moves: Vec<Move>,
    pub quit: bool,
}

pub struct Session {
    x: Seat,
    o: Seat,
    state: GameState,
    moves: Vec<Move>,
}

impl Session {
    pub fn new(x: Seat, o: Seat) -> Self {
        Self {
            x,
            o,
            state: GameState::new(),
            moves: Vec::new(),
        }
    }

    fn seat_mut(&mut self, player: Player) -> &mut Seat {
        match player {
            Player::X => &mut self.x,
            Player::O => &mut self.o,
        }
    }

    /// Run until the game ends, the human quits, or input runs out
    pub fn run<R: BufRead, W: Write>(mut self, input: &mut R, out: &mut W) -> Result<SessionResult> {
        loop {
            terminal::render(out, &self.state)?;
            if self.state.is_over() {
                return Ok(self.finish(false));
            }

            let to_move = self.state.current_player();
            let state = self.state.clone();
            let mv = match self.seat_mut(to_move) {
                Seat::Ai { player, think_delay } => {
                    std::thread::sleep(*think_delay);
                    let started = std::time::Instant::now();
                    let mv = player
                        .select_move(&state)
                        .context("AI found no legal move in an unfinished game")?;
                    tracing::debug!(%mv, elapsed_ms = started.elapsed().as_millis() as u64, "AI move");
                    writeln!(out, "AI plays board {} cell {}", mv.board, mv.cell)?;
                    Some(mv)
                }
                Seat::Human => read_human_move(input, out, &state)?,
            };
            let Some(mv) = mv else {
                return Ok(self.finish(true));
            };

            match self.state.try_apply_move(mv) {
                Ok(next) => {
                    self.state = next;
                    self.moves.push(mv);
                }
                Err(err) => writeln!(out, "Illegal move: {}", err)?,
            }
        }
    }

    fn finish(self, quit: bool) -> SessionResult {
        SessionResult {
            final_state: self.state,
            moves: self.moves,
            quit,
        }
    }
}

/// Prompt until the human enters a playable cell. `None` means quit.
fn read_human_move<R: BufRead, W: Write>(input: &mut R, out: &mut W, state: &GameState) -> Result<Option<Move>> {
    let player = state.current_player();
    loop {
        let Some(line) = terminal::prompt(input, out, &player.to_string())? else {
            return Ok(None);
        };
        match terminal::parse_command(&line) {
            Ok(Command::Quit) => return Ok(None),
            Ok(Command::Play { board, cell }) if state.is_playable(board as usize, cell as usize) => {
                return Ok(Some(Move::new(board, cell, player)));
            }
            Ok(Command::Play { .. }) => writeln!(out, "That cell is not playable right now")?,
            Err(msg) => writeln!(out, "{}", msg)?,
        }
    }
}
