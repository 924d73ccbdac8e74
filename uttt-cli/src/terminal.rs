//! Terminal rendering and move input shared by the interactive commands

use std::io::{self, BufRead, Write};

use uttt_core::{BoardOutcome, GameState, GameStatus};

/// What the player typed
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Play { board: u8, cell: u8 },
    Quit,
}

/// Parse `<board> <cell>` (0-based) or `q`
pub fn parse_command(line: &str) -> Result<Command, String> {
    let line = line.trim();
    if line.eq_ignore_ascii_case("q") || line.eq_ignore_ascii_case("quit") {
        return Ok(Command::Quit);
    }

    let parts: Vec<&str> = line
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
        .collect();
    let [board, cell] = parts.as_slice() else {
        return Err("enter a move as '<board> <cell>' (0-8 each), or 'q' to quit".to_string());
    };

    let board: u8 = board.parse().map_err(|_| format!("bad board index '{}'", board))?;
    let cell: u8 = cell.parse().map_err(|_| format!("bad cell index '{}'", cell))?;
    if board > 8 || cell > 8 {
        return Err("board and cell must be between 0 and 8".to_string());
    }
    Ok(Command::Play { board, cell })
}

/// One-line description of where the game stands
pub fn status_line(state: &GameState) -> String {
    match state.status() {
        GameStatus::InProgress {
            player,
            active_board: Some(board),
        } => format!("{} to move in board {}", player, board),
        GameStatus::InProgress {
            player,
            active_board: None,
        } => format!("{} to move (any board)", player),
        GameStatus::Finished(BoardOutcome::Won(player)) => format!("{} wins!", player),
        GameStatus::Finished(_) => "Draw".to_string(),
    }
}

pub fn render<W: Write>(out: &mut W, state: &GameState) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", state)?;
    writeln!(out, "{}", status_line(state))
}

/// Prompt and read one line. `None` on end of input.
pub fn prompt<R: BufRead, W: Write>(input: &mut R, out: &mut W, label: &str) -> io::Result<Option<String>> {
    write!(out, "{}> ", label)?;
    out.flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line))
}
