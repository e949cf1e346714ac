//! TrelloX command-line interface.
//!
//! Commands:
//! - `trellox boards`: list the boards the acting user belongs to
//! - `trellox new <title>`: create a board with the default lists
//! - `trellox show <board>`: print a board outline
//! - `trellox import`: import boards from Trello
//! - `trellox move-card` / `trellox move-list`: reorder a board
//! - `trellox sanitize <file>`: normalize a board document
//!
//! Storage and the acting user come from configuration, overridable with
//! `--root`, `--user` and `--email`.

pub mod cli;
pub mod commands;

pub use cli::{Cli, Commands};
