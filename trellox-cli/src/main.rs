//! TrelloX CLI entry point.
//!
//! Exit codes:
//! - 0: Success
//! - 1: Error

use clap::Parser;
use tracing_subscriber::EnvFilter;

use trellox::{commands, Cli};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = if cli.debug {
        EnvFilter::new("trellox=debug,trellox_board=debug,trellox_import=debug,trellox_config=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(std::io::stderr)
        .init();

    let exit_code = match run(cli).await {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            1
        }
    };
    std::process::exit(exit_code);
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = trellox_config::load_configuration()?;
    commands::run(cli, config).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellox::Commands;

    #[test]
    fn test_cli_parsing_debug() {
        let cli = Cli::parse_from(["trellox", "--debug", "boards"]);
        assert!(cli.debug);
        assert!(matches!(cli.command, Commands::Boards { json: false }));
    }

    #[test]
    fn test_cli_parsing_move_card() {
        let cli = Cli::parse_from(["trellox", "move-card", "b1", "c1", "l2", "3"]);
        match cli.command {
            Commands::MoveCard {
                board,
                card,
                to_list,
                to_index,
            } => {
                assert_eq!(board, "b1");
                assert_eq!(card, "c1");
                assert_eq!(to_list, "l2");
                assert_eq!(to_index, 3);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_cli_parsing_import_boards() {
        let cli = Cli::parse_from([
            "trellox", "import", "--key", "k", "--token", "t", "--board", "a", "--board", "b",
        ]);
        match cli.command {
            Commands::Import { boards, list, .. } => {
                assert_eq!(boards, vec!["a".to_string(), "b".to_string()]);
                assert!(!list);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_cli_requires_subcommand() {
        assert!(Cli::try_parse_from(["trellox"]).is_err());
    }
}
