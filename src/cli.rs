use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "tubeshuffle",
    version,
    about = "Shuffle-play a YouTube playlist through mpv"
)]
pub struct Cli {
    /// YouTube Data API key; remembered after the first use
    #[arg(long, global = true)]
    pub api_key: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Resolve a playlist (URL or id) and play it shuffled
    Play {
        playlist: String,
        /// Re-resolve even when a fresh cached copy exists
        #[arg(long)]
        refresh: bool,
    },
    /// List playlists loaded before
    List,
    Tui,
}
