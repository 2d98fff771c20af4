//! remux: ephemeral git worktree spaces with tmux sessions and reserved ports.
//!
//! # Usage
//!
//! ```text
//! remux new <branch> [--dest DIR] [--reuse]
//! remux drop [--force]
//! remux open <name> [--dest DIR]
//! remux list [--dest DIR] [--json]
//! ```

mod commands;
mod config;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{drop::DropArgs, list::ListArgs, new::NewArgs, open::OpenArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "remux",
    version,
    about = "Juggle concurrent branches as git worktrees with their own tmux session and port",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create a space for a branch of the current repository.
    New(NewArgs),

    /// Remove the space rooted at the current directory.
    Drop(DropArgs),

    /// Attach to (or start) the tmux session for a space.
    Open(OpenArgs),

    /// List registered spaces.
    List(ListArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Commands::New(args) => args.run(),
        Commands::Drop(args) => args.run(),
        Commands::Open(args) => args.run(),
        Commands::List(args) => args.run(),
    }
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
