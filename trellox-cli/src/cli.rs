//! CLI definition for the TrelloX command-line interface.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// TrelloX - collaborative kanban boards
#[derive(Parser, Debug)]
#[command(name = "trellox")]
#[command(version)]
#[command(about = "Manage TrelloX boards from the command line")]
pub struct Cli {
    /// Enable debug output to stderr
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Storage root, overriding `storage.root` from configuration
    #[arg(long, global = true, env = "TRELLOX_ROOT")]
    pub root: Option<PathBuf>,

    /// User id to act as
    #[arg(long, global = true, env = "TRELLOX_USER", default_value = "local")]
    pub user: String,

    /// Email of the acting user
    #[arg(long, global = true, env = "TRELLOX_EMAIL", default_value = "local@localhost")]
    pub email: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the boards you belong to
    Boards {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Create a board with the default lists
    New {
        title: String,
        /// Start without any lists
        #[arg(long)]
        empty: bool,
    },
    /// Show a board's lists and cards
    Show {
        board: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Import boards from Trello
    Import {
        #[arg(long, env = "TRELLO_API_KEY", hide_env_values = true)]
        key: String,
        #[arg(long, env = "TRELLO_TOKEN", hide_env_values = true)]
        token: String,
        /// Trello board ids to import (all boards when omitted)
        #[arg(long = "board")]
        boards: Vec<String>,
        /// Only list the boards available for import
        #[arg(long)]
        list: bool,
    },
    /// Move a card within or between lists
    MoveCard {
        board: String,
        card: String,
        to_list: String,
        to_index: usize,
    },
    /// Move a list to a new position
    MoveList {
        board: String,
        list: String,
        to: usize,
    },
    /// Sanitize a board document and print the normalized board
    Sanitize {
        /// JSON file to read
        file: PathBuf,
        /// Write the result here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}
