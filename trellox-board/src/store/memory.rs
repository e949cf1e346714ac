//! In-memory store for tests and ephemeral sessions

use super::{email_matches, BoardStore, PresenceStore, UserDirectory};
use crate::error::{BoardError, Result};
use crate::types::{Board, BoardId, UserId, UserPresence, UserProfile};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

#[derive(Debug, Default)]
pub struct MemoryStore {
    boards: RwLock<HashMap<BoardId, Board>>,
    users: RwLock<HashMap<UserId, UserProfile>>,
    presence: RwLock<HashMap<BoardId, BTreeMap<UserId, UserPresence>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BoardStore for MemoryStore {
    async fn boards_for_member(&self, user: &UserId) -> Result<Vec<Board>> {
        let boards = self.boards.read().await;
        let mut found: Vec<Board> = boards
            .values()
            .filter(|b| b.members.contains(user))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(found)
    }

    async fn get_board(&self, id: &BoardId) -> Result<Board> {
        self.boards
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| BoardError::BoardNotFound { id: id.to_string() })
    }

    async fn save_board(&self, board: &Board) -> Result<Board> {
        let mut boards = self.boards.write().await;
        if let Some(stored) = boards.get(&board.id) {
            if stored.revision != board.revision {
                return Err(BoardError::StaleRevision {
                    id: board.id.to_string(),
                    expected: board.revision,
                    actual: stored.revision,
                });
            }
        }
        let mut saved = board.clone();
        saved.revision += 1;
        boards.insert(saved.id.clone(), saved.clone());
        Ok(saved)
    }

    async fn delete_board(&self, id: &BoardId) -> Result<()> {
        self.presence.write().await.remove(id);
        self.boards
            .write()
            .await
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| BoardError::BoardNotFound { id: id.to_string() })
    }
}

#[async_trait]
impl UserDirectory for MemoryStore {
    async fn upsert_profile(&self, profile: &UserProfile) -> Result<()> {
        self.users
            .write()
            .await
            .insert(profile.user_id.clone(), profile.clone());
        Ok(())
    }

    async fn get_profile(&self, user: &UserId) -> Result<Option<UserProfile>> {
        Ok(self.users.read().await.get(user).cloned())
    }

    async fn search_by_email_prefix(
        &self,
        prefix: &str,
        limit: usize,
    ) -> Result<Vec<UserProfile>> {
        let users = self.users.read().await;
        let mut matches: Vec<UserProfile> = users
            .values()
            .filter(|p| email_matches(p, prefix))
            .cloned()
            .collect();
        matches.sort_by(|a, b| a.email.cmp(&b.email));
        matches.truncate(limit);
        Ok(matches)
    }
}

#[async_trait]
impl PresenceStore for MemoryStore {
    async fn put_presence(&self, presence: &UserPresence) -> Result<()> {
        self.presence
            .write()
            .await
            .entry(presence.board_id.clone())
            .or_default()
            .insert(presence.user_id.clone(), presence.clone());
        Ok(())
    }

    async fn remove_presence(&self, board: &BoardId, user: &UserId) -> Result<()> {
        if let Some(records) = self.presence.write().await.get_mut(board) {
            records.remove(user);
        }
        Ok(())
    }

    async fn list_presence(&self, board: &BoardId) -> Result<Vec<UserPresence>> {
        Ok(self
            .presence
            .read()
            .await
            .get(board)
            .map(|records| records.values().cloned().collect())
            .unwrap_or_default())
    }
}
