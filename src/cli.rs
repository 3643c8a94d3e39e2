//! Command-line interface.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// playlist-bridge: move music playlists to a video platform
#[derive(Parser, Debug)]
#[command(name = "playlist-bridge")]
#[command(about = "Re-create music streaming playlists as video playlists")]
#[command(version)]
pub struct Cli {
    /// Path to a TOML config file (defaults to the platform config directory)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Search and match only; create and modify nothing
    #[arg(long, global = true)]
    pub dry_run: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the configured source playlists with their track counts
    List,

    /// Transfer one playlist, or every configured playlist with --all
    Transfer(TransferArgs),

    /// Show what would be extracted from a playlist page
    Debug(DebugArgs),
}

#[derive(Args, Debug)]
pub struct TransferArgs {
    /// Playlist link, spotify:playlist: URI, or bare id
    #[arg(required_unless_present = "all", conflicts_with = "all")]
    pub playlist: Option<String>,

    /// Name for the destination playlist instead of the page title
    #[arg(short, long, conflicts_with = "all")]
    pub name: Option<String>,

    /// Transfer every configured playlist
    #[arg(short, long)]
    pub all: bool,
}

#[derive(Args, Debug)]
pub struct DebugArgs {
    /// Playlist link, spotify:playlist: URI, or bare id
    pub playlist: String,

    /// Name to use instead of the page title
    #[arg(short, long)]
    pub name: Option<String>,

    /// Save the full playlist page markup to this file
    #[arg(long, value_name = "PATH")]
    pub save_html: Option<PathBuf>,
}

impl Cli {
    /// Parses command-line arguments.
    pub fn parse_args() -> Self {
        Cli::parse()
    }

    /// Returns true if the command talks to the video platform.
    pub fn needs_destination(&self) -> bool {
        matches!(self.command, Command::Transfer(_))
    }
}
