//! Online command - play in a server room through the sync client
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run() - orchestration
//! - Level 2: enter_room(), play_online()
//! - Level 3: handle_input(), show()
//! - Level 4: input parsing

use std::io::Write;

use anyhow::{Context, Result};
use clap::Args;
use tokio::io::{AsyncBufReadExt, BufReader};

use uttt_core::Player;
use uttt_sync::{Presence, SyncClient, SyncConfig, SyncStatus};

use crate::http_transport::HttpTransport;
use crate::terminal::{self, Command};

// ============================================================================
// COMMAND ARGUMENTS (Level 4 - Configuration)
// ============================================================================

#[derive(Args)]
pub struct OnlineArgs {
    /// Server base URL
    #[arg(long, default_value = "http://localhost:8003")]
    pub server: String,

    /// Create a new room (you play X)
    #[arg(long, conflicts_with = "join")]
    pub create: bool,

    /// Join an existing room by ID (you play O)
    #[arg(long, value_name = "ROOM")]
    pub join: Option<String>,

    /// Room password
    #[arg(long)]
    pub password: Option<String>,
}

/// Non-move input understood while online
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum OnlineInput {
    Game(Command),
    Retry,
    Dismiss,
    Rematch,
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

/// Run online command
///
/// 1. Create or join the room
/// 2. Play until quit, polling for the opponent's moves
/// 3. Leave the room
pub fn run(args: OnlineArgs) -> Result<()> {
    let runtime = tokio::runtime::Runtime::new()?;

    runtime.block_on(async {
        let config = SyncConfig::default();
        let transport = HttpTransport::new(&args.server, config.request_timeout)?;
        let (room_id, me) = enter_room(&transport, &args).await?;

        let mut client = SyncClient::new(transport.clone(), room_id.clone(), me, config);
        let result = play_online(&mut client, &transport).await;

        if let Err(err) = transport.leave_room(&room_id, me).await {
            tracing::warn!(%err, "failed to leave room");
        }
        result
    })
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

async fn enter_room(transport: &HttpTransport, args: &OnlineArgs) -> Result<(String, Player)> {
    let password = args.password.as_deref();
    match (&args.join, args.create) {
        (Some(room_id), _) => {
            let room_id = room_id.to_uppercase();
            transport
                .join_room(&room_id, password)
                .await
                .with_context(|| format!("Failed to join room {}", room_id))?;
            tracing::info!(room = %room_id, "joined room as O");
            println!("Joined room {} as O", room_id);
            Ok((room_id, Player::O))
        }
        (None, true) => {
            let room_id = transport
                .create_room(password)
                .await
                .context("Failed to create room")?;
            tracing::info!(room = %room_id, "created room");
            println!("Created room {}. Share the ID with your opponent. You are X.", room_id);
            Ok((room_id, Player::X))
        }
        (None, false) => anyhow::bail!("pass either --create or --join <ROOM>"),
    }
}

async fn play_online(client: &mut SyncClient<HttpTransport>, transport: &HttpTransport) -> Result<()> {
    println!("Moves: '<board> <cell>'. Also: r = retry, d = dismiss error, m = rematch, q = quit.");

    if let Err(err) = client.refresh().await {
        tracing::warn!(%err, "initial fetch failed");
    }
    show(client)?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            _ = tokio::time::sleep(client.poll_interval()) => {
                match client.refresh().await {
                    Ok(true) => show(client)?,
                    Ok(false) => {}
                    Err(err) => tracing::warn!(%err, "poll failed"),
                }
            }
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read input")? else {
                    return Ok(());
                };
                if !handle_input(client, transport, &line).await? {
                    return Ok(());
                }
            }
        }
    }
}

// ============================================================================
// LEVEL 3 - STEPS
// ============================================================================

/// Act on one input line. Returns false when the player quits.
async fn handle_input(client: &mut SyncClient<HttpTransport>, transport: &HttpTransport, line: &str) -> Result<bool> {
    let input = match parse_input(line) {
        Ok(input) => input,
        Err(msg) => {
            println!("{}", msg);
            return Ok(true);
        }
    };

    match input {
        OnlineInput::Game(Command::Quit) => return Ok(false),
        OnlineInput::Game(Command::Play { board, cell }) => {
            if matches!(client.status(), SyncStatus::Error { .. }) {
                println!("Press 'r' to retry or 'd' to dismiss first");
            } else if !client.is_my_turn() {
                println!("Waiting for the opponent");
            } else if !client.state().is_playable(board as usize, cell as usize) {
                println!("That cell is not playable right now");
            } else {
                client.submit(board, cell).await;
                show(client)?;
            }
        }
        OnlineInput::Retry => {
            client.retry().await;
            show(client)?;
        }
        OnlineInput::Dismiss => {
            client.dismiss();
            show(client)?;
        }
        OnlineInput::Rematch => {
            if !client.state().is_over() {
                println!("Rematch is available once the game is over");
            } else if let Err(err) = transport.request_rematch(client.room_id(), client.me()).await {
                println!("{:#}", err);
            } else {
                println!("Rematch requested");
            }
        }
    }
    Ok(true)
}

fn show(client: &SyncClient<HttpTransport>) -> Result<()> {
    let mut out = std::io::stdout();
    terminal::render(&mut out, client.state())?;

    let opponent = client.me().opponent();
    match client.players().get(opponent) {
        Presence::Waiting => writeln!(out, "Waiting for {} to join room {}", opponent, client.room_id())?,
        Presence::Disconnected => writeln!(out, "{} left the room", opponent)?,
        Presence::Connected => {}
    }
    if client.rematch_requests().get(opponent) == &true {
        writeln!(out, "{} wants a rematch ('m' to accept)", opponent)?;
    }
    if let SyncStatus::Error { reason, .. } = client.status() {
        writeln!(out, "! {} (r = retry, d = dismiss)", reason)?;
    }
    writeln!(out, "You are {} | version {}", client.me(), client.version())?;
    Ok(())
}

// ============================================================================
// LEVEL 4 - UTILITIES
// ============================================================================

fn parse_input(line: &str) -> Result<OnlineInput, String> {
    match line.trim().to_ascii_lowercase().as_str() {
        "r" | "retry" => Ok(OnlineInput::Retry),
        "d" | "dismiss" => Ok(OnlineInput::Dismiss),
        "m" | "rematch" => Ok(OnlineInput::Rematch),
        _ => terminal::parse_command(line).map(OnlineInput::Game),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_online_input() {
        assert_eq!(parse_input("r"), Ok(OnlineInput::Retry));
        assert_eq!(parse_input("D\n"), Ok(OnlineInput::Dismiss));
        assert_eq!(parse_input("rematch"), Ok(OnlineInput::Rematch));
        assert_eq!(
            parse_input("3 5"),
            Ok(OnlineInput::Game(Command::Play { board: 3, cell: 5 }))
        );
        assert_eq!(parse_input("q"), Ok(OnlineInput::Game(Command::Quit)));
        assert!(parse_input("hello").is_err());
    }
}
