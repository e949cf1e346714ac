//! Import orchestration
//!
//! Boards are imported one after another. A board that fails is recorded by
//! name and the rest carry on; the import as a whole fails only when nothing
//! was imported.

use crate::convert::BoardConverter;
use crate::error::{ImportError, Result};
use crate::source::ImportSource;
use crate::types::TrelloBoard;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use trellox_board::store::BoardStore;
use trellox_board::types::{Board, Role, UserProfile};
use trellox_board::BoardError;
use trellox_config::ImportSettings;

/// Attempts at saving one board when the store reports contention
const SAVE_ATTEMPTS: u32 = 3;

const LOCK_BACKOFF: Duration = Duration::from_millis(20);

/// Outcome of a multi-board import
#[derive(Debug, Clone, Serialize)]
pub struct ImportReport {
    pub imported: Vec<Board>,
    /// Names of the boards that could not be imported
    pub failed: Vec<String>,
}

impl ImportReport {
    pub fn is_partial(&self) -> bool {
        !self.failed.is_empty()
    }
}

pub struct ImportPipeline {
    source: Arc<dyn ImportSource>,
    store: Option<Arc<dyn BoardStore>>,
    settings: ImportSettings,
    owner: UserProfile,
}

impl ImportPipeline {
    /// Imported boards are owned by `owner`
    pub fn new(source: Arc<dyn ImportSource>, settings: ImportSettings, owner: UserProfile) -> Self {
        Self {
            source,
            store: None,
            settings,
            owner,
        }
    }

    /// Persist imported boards to `store`
    pub fn with_store(mut self, store: Arc<dyn BoardStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Boards available for import, each with its full preferences when the
    /// detail fetch succeeds
    #[instrument(skip(self))]
    pub async fn list_boards(&self) -> Result<Vec<TrelloBoard>> {
        let summaries = self.source.boards().await?;
        debug!("found {} boards", summaries.len());

        let boards = stream::iter(summaries)
            .map(|summary| async move {
                if summary.id.trim().is_empty() {
                    return summary;
                }
                match self.source.board_detail(&summary.id).await {
                    Ok(detail) => detail,
                    Err(e) => {
                        warn!("using summary for board {}: {}", summary.id, e);
                        summary
                    }
                }
            })
            .buffered(self.settings.max_concurrent_requests.max(1))
            .collect()
            .await;
        Ok(boards)
    }

    /// Import one board, saving it when a store is configured
    #[instrument(skip(self, board), fields(board = %board.id))]
    pub async fn import_board(&self, board: &TrelloBoard) -> Result<Board> {
        if board.id.trim().is_empty() {
            return Err(ImportError::invalid_record("board", "missing id"));
        }

        let (lists, cards) = futures::join!(
            self.source.lists(&board.id),
            self.source.cards(&board.id)
        );
        let lists = lists.unwrap_or_else(|e| {
            warn!("could not fetch lists: {}", e);
            Vec::new()
        });
        let cards = cards.unwrap_or_else(|e| {
            warn!("could not fetch cards: {}", e);
            Vec::new()
        });

        let converted = BoardConverter::new(self.source.as_ref(), &self.owner, &self.settings)
            .convert(board, lists, cards)
            .await?;

        match &self.store {
            Some(store) => self.persist(store.as_ref(), converted).await,
            None => Ok(converted),
        }
    }

    /// Import every selected board, collecting failures by board name
    pub async fn import(&self, selected: &[TrelloBoard]) -> Result<ImportReport> {
        if selected.is_empty() {
            return Err(ImportError::NothingSelected);
        }

        let mut imported = Vec::new();
        let mut failed = Vec::new();
        for board in selected {
            match self.import_board(board).await {
                Ok(board) => {
                    info!("imported board '{}' ({} lists)", board.title, board.lists.len());
                    imported.push(board);
                }
                Err(e) => {
                    let name = if board.name.trim().is_empty() {
                        board.id.clone()
                    } else {
                        board.name.clone()
                    };
                    warn!("failed to import board '{}': {}", name, e);
                    failed.push(name);
                }
            }
        }

        if imported.is_empty() {
            return Err(ImportError::NothingImported { failed });
        }
        Ok(ImportReport { imported, failed })
    }

    /// Save an imported board, replacing the content of an earlier import of
    /// the same board while keeping its members
    async fn persist(&self, store: &dyn BoardStore, board: Board) -> Result<Board> {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            let mut candidate = board.clone();
            match store.get_board(&candidate.id).await {
                Ok(existing) => {
                    if existing.role_of(&self.owner.user_id) != Some(Role::Owner) {
                        return Err(BoardError::permission_denied(
                            self.owner.user_id.as_str(),
                            "replace board by import",
                        )
                        .into());
                    }
                    candidate.revision = existing.revision;
                    candidate.created_at = existing.created_at;
                    for record in existing.board_members {
                        if candidate.membership(&record.user_id).is_none() {
                            candidate.board_members.push(record);
                        }
                    }
                    candidate.members.extend(existing.members);
                    candidate.sticky_notes = existing.sticky_notes;
                    candidate.ensure_membership_invariants();
                }
                Err(BoardError::BoardNotFound { .. }) => {}
                Err(e) => return Err(e.into()),
            }

            match store.save_board(&candidate).await {
                Ok(saved) => return Ok(saved),
                Err(e) if e.is_retryable() && attempt < SAVE_ATTEMPTS => {
                    debug!(attempt, "retrying save after {}", e);
                    if matches!(e, BoardError::LockBusy) {
                        tokio::time::sleep(LOCK_BACKOFF * attempt).await;
                    }
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}
