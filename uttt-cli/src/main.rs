//! UTTT CLI - Command-line interface
//!
//! Commands:
//! - solo: Play against the AI
//! - local: Two players on one terminal
//! - selfplay: AI vs AI statistics
//! - serve: Start the online rooms server
//! - online: Play in a server room

mod http_transport;
mod local;
mod online;
mod selfplay;
mod server;
mod session;
mod solo;
mod terminal;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "uttt")]
#[command(about = "Ultimate Tic-Tac-Toe in the terminal")]
#[command(version)]
struct Cli {
    /// Random seed for reproducible AI play
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play as X against the AI
    Solo(solo::SoloArgs),
    /// Two humans on one terminal
    Local(local::LocalArgs),
    /// Run AI vs AI games and report statistics
    Selfplay(selfplay::SelfplayArgs),
    /// Start the online rooms server
    Serve(server::ServerArgs),
    /// Create or join an online room
    Online(online::OnlineArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging. RUST_LOG overrides; interactive commands default to
    // warn so log lines stay out of the board.
    let default_level = match cli.command {
        Commands::Serve(_) | Commands::Selfplay(_) => "info",
        _ => "warn",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Solo(args) => solo::run(args, cli.seed),
        Commands::Local(args) => local::run(args),
        Commands::Selfplay(args) => selfplay::run(args, cli.seed),
        Commands::Serve(args) => server::run(args),
        Commands::Online(args) => online::run(args),
    }
}
