//! Command handlers

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use comfy_table::{presets::UTF8_FULL, Table};
use serde_json::Value;
use tracing::{debug, warn};
use trellox_board::commands::{CreateBoard, GetBoard, ListBoards, MoveCard, MoveList};
use trellox_board::notify::InviteMailer;
use trellox_board::store::{FileStore, UserDirectory};
use trellox_board::types::Board;
use trellox_board::{sanitize_board, BoardContext, Execute, RawValue, UserProfile};
use trellox_config::TrelloxConfig;
use trellox_import::{ImportPipeline, ImportReport, TrelloClient, TrelloCredentials};

use crate::cli::{Cli, Commands};

/// Configuration, storage and identity for one invocation
pub struct App {
    config: TrelloxConfig,
    store: Arc<FileStore>,
    actor: UserProfile,
}

impl App {
    pub async fn open(cli: &Cli, mut config: TrelloxConfig) -> Result<Self> {
        if let Some(root) = &cli.root {
            config.storage.root = root.clone();
        }
        debug!("storage root: {}", config.storage.root.display());

        let store = Arc::new(FileStore::new(config.storage.root.clone()));
        let actor = UserProfile::new(cli.user.as_str(), cli.email.as_str());
        store
            .upsert_profile(&actor)
            .await
            .context("failed to record user profile")?;

        Ok(Self {
            config,
            store,
            actor,
        })
    }

    pub fn context(&self) -> Result<BoardContext> {
        let mailer = InviteMailer::new(self.config.notifications.clone(), None)?;
        Ok(BoardContext::new(
            self.store.clone(),
            self.store.clone(),
            Arc::new(mailer),
            self.actor.clone(),
        )
        .with_settings(self.config.sync.clone()))
    }
}

pub async fn run(cli: Cli, config: TrelloxConfig) -> Result<()> {
    if let Commands::Sanitize { file, output } = &cli.command {
        return sanitize(file, output.as_deref());
    }

    let app = App::open(&cli, config).await?;
    match cli.command {
        Commands::Boards { json } => boards(&app, json).await,
        Commands::New { title, empty } => new_board(&app, title, empty).await,
        Commands::Show { board, json } => show(&app, &board, json).await,
        Commands::Import {
            key,
            token,
            boards,
            list,
        } => import(&app, TrelloCredentials::new(key, token), &boards, list).await,
        Commands::MoveCard {
            board,
            card,
            to_list,
            to_index,
        } => {
            let command = MoveCard::new(board, card, to_list, to_index);
            print_json(&command.execute(&app.context()?).await?)
        }
        Commands::MoveList { board, list, to } => {
            let command = MoveList::new(board, list, to);
            print_json(&command.execute(&app.context()?).await?)
        }
        Commands::Sanitize { .. } => Ok(()),
    }
}

fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn boards(app: &App, json: bool) -> Result<()> {
    let result = ListBoards.execute(&app.context()?).await?;
    if json {
        return print_json(&result);
    }

    let summaries = result["boards"].as_array().cloned().unwrap_or_default();
    if summaries.is_empty() {
        println!("No boards yet. Create one with `trellox new <title>`.");
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Id", "Title", "Role", "Lists", "Cards"]);
    for summary in &summaries {
        table.add_row(vec![
            summary["id"].as_str().unwrap_or_default().to_string(),
            summary["title"].as_str().unwrap_or_default().to_string(),
            summary["role"].as_str().unwrap_or_default().to_string(),
            summary["lists"].to_string(),
            summary["cards"].to_string(),
        ]);
    }
    println!("{table}");
    Ok(())
}

async fn new_board(app: &App, title: String, empty: bool) -> Result<()> {
    let mut command = CreateBoard::new(title);
    if empty {
        command = command.empty();
    }
    let board = command.execute(&app.context()?).await?;
    println!(
        "Created board '{}' ({})",
        board["title"].as_str().unwrap_or_default(),
        board["id"].as_str().unwrap_or_default()
    );
    Ok(())
}

async fn show(app: &App, id: &str, json: bool) -> Result<()> {
    let value = GetBoard::new(id).execute(&app.context()?).await?;
    if json {
        return print_json(&value);
    }
    let board: Board = serde_json::from_value(value)?;
    print!("{}", render_board(&board));
    Ok(())
}

/// Plain-text outline of a board
pub fn render_board(board: &Board) -> String {
    let mut out = format!("{} [{}]\n", board.title, board.id);
    for list in &board.lists {
        out.push_str(&format!("\n{} ({})\n", list.title, list.cards.len()));
        for (index, card) in list.cards.iter().enumerate() {
            out.push_str(&format!("  {index}. {}", card.content));
            if !card.labels.is_empty() {
                let labels: Vec<&str> = card.labels.iter().map(|l| l.text.as_str()).collect();
                out.push_str(&format!(" [{}]", labels.join(", ")));
            }
            out.push('\n');
        }
    }
    if !board.sticky_notes.is_empty() {
        out.push_str(&format!("\n{} sticky notes\n", board.sticky_notes.len()));
    }
    out
}

async fn import(
    app: &App,
    credentials: TrelloCredentials,
    wanted: &[String],
    list_only: bool,
) -> Result<()> {
    let client = TrelloClient::new(&app.config.import, credentials)?;
    let pipeline = ImportPipeline::new(
        Arc::new(client),
        app.config.import.clone(),
        app.actor.clone(),
    )
    .with_store(app.store.clone());

    let available = pipeline.list_boards().await?;
    if list_only {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_header(vec!["Id", "Name", "Description"]);
        for board in &available {
            table.add_row(vec![board.id.clone(), board.name.clone(), board.desc.clone()]);
        }
        println!("{table}");
        return Ok(());
    }

    let selected: Vec<_> = if wanted.is_empty() {
        available
    } else {
        for id in wanted {
            if !available.iter().any(|b| &b.id == id) {
                warn!("board {} is not available for import", id);
            }
        }
        available
            .into_iter()
            .filter(|b| wanted.contains(&b.id))
            .collect()
    };
    if selected.is_empty() && !wanted.is_empty() {
        bail!("none of the requested boards are available for import");
    }

    let report = pipeline.import(&selected).await?;
    print!("{}", render_report(&report));
    Ok(())
}

pub fn render_report(report: &ImportReport) -> String {
    let mut out = String::new();
    for board in &report.imported {
        out.push_str(&format!(
            "Imported '{}' ({} lists, {} cards)\n",
            board.title,
            board.lists.len(),
            board.card_count()
        ));
    }
    if report.is_partial() {
        out.push_str(&format!("Failed: {}\n", report.failed.join(", ")));
    }
    out
}

fn sanitize(file: &Path, output: Option<&Path>) -> Result<()> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let value: Value = serde_json::from_str(&text)
        .with_context(|| format!("{} is not valid JSON", file.display()))?;
    let board = sanitize_board(&RawValue::from(value));
    let rendered = serde_json::to_string_pretty(&board)?;

    match output {
        Some(path) => std::fs::write(path, rendered + "\n")
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => println!("{rendered}"),
    }
    Ok(())
}
