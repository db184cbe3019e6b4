//! Command-line arguments.

use clap::{Parser, Subcommand};

/// Bitgarten gallery client.
#[derive(Debug, Parser)]
#[command(name = "bitgarten", version, about = "Bitgarten media gallery client")]
pub struct Cli {
    /// Gallery server URL; overrides the settings file.
    #[arg(long, env = "BITGARTEN_URL")]
    pub url: Option<String>,

    /// Command to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Log in and store the session in the system keyring.
    Login {
        /// User name.
        username: String,
        /// Password.
        password: String,
    },
    /// Remove the stored session.
    Logout,
    /// Show the stored session's user.
    Whoami,
    /// List all albums, oldest first.
    Albums,
    /// Show one album's pictures.
    Album {
        /// Album ISN.
        id: u64,
        /// Also fetch every image and report its decoded size.
        #[arg(long)]
        eager: bool,
    },
    /// Fetch the thumbnails of one album.
    Thumbnails {
        /// Album ISN.
        id: u64,
    },
    /// List picture import directories.
    Directories,
    /// List the pictures in one directory.
    Directory {
        /// Directory name.
        name: String,
    },
}
