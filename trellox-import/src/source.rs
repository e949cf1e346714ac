//! The import source seam
//!
//! The pipeline only sees this trait. [`TrelloClient`](crate::client::TrelloClient)
//! talks to the Trello REST API; tests plug in canned data.

use crate::error::Result;
use crate::types::{
    TrelloAttachment, TrelloBoard, TrelloCard, TrelloChecklist, TrelloComment, TrelloList,
};
use async_trait::async_trait;

#[async_trait]
pub trait ImportSource: Send + Sync {
    /// Boards visible to the authenticated account
    async fn boards(&self) -> Result<Vec<TrelloBoard>>;

    /// One board with its full preferences
    async fn board_detail(&self, board: &str) -> Result<TrelloBoard>;

    async fn lists(&self, board: &str) -> Result<Vec<TrelloList>>;

    async fn cards(&self, board: &str) -> Result<Vec<TrelloCard>>;

    async fn comments(&self, card: &str) -> Result<Vec<TrelloComment>>;

    async fn attachments(&self, card: &str) -> Result<Vec<TrelloAttachment>>;

    async fn checklists(&self, card: &str) -> Result<Vec<TrelloChecklist>>;
}
