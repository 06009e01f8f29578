//! Command-line interface for the mafia44 server.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Mafia44 - server-authoritative hidden-role card game
#[derive(Parser, Debug)]
#[command(name = "mafia44")]
#[command(about = "Game server for four-player Mafia44 tables", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP game server
    Serve {
        /// TOML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to
        #[arg(short, long)]
        port: Option<u16>,

        /// Path to the database file (created if it doesn't exist)
        #[arg(long)]
        db_path: Option<String>,
    },

    /// Apply database migrations and exit
    Migrate {
        /// TOML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Path to the database file (created if it doesn't exist)
        #[arg(long)]
        db_path: Option<String>,
    },
}
