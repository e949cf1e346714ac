//! Persistence collaborators
//!
//! The engine talks to storage only through these traits. Boards are saved as
//! whole documents guarded by their `revision`; profiles and presence records
//! live beside them.

mod file;
mod memory;

pub use file::{FileStore, StoreLock};
pub use memory::MemoryStore;

use crate::error::Result;
use crate::types::{Board, BoardId, UserId, UserPresence, UserProfile};
use async_trait::async_trait;

/// Whole-document board persistence
#[async_trait]
pub trait BoardStore: Send + Sync {
    /// Every board whose member set contains `user`
    async fn boards_for_member(&self, user: &UserId) -> Result<Vec<Board>>;

    /// Load one board, failing with `BoardNotFound` when absent
    async fn get_board(&self, id: &BoardId) -> Result<Board>;

    /// Save a board whose `revision` matches the stored one (or that is not
    /// stored yet). Returns the saved board with its revision bumped; a
    /// mismatch fails with `StaleRevision` and leaves storage untouched.
    async fn save_board(&self, board: &Board) -> Result<Board>;

    async fn delete_board(&self, id: &BoardId) -> Result<()>;
}

/// Directory of user profiles, searchable by email prefix
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn upsert_profile(&self, profile: &UserProfile) -> Result<()>;

    async fn get_profile(&self, user: &UserId) -> Result<Option<UserProfile>>;

    /// Profiles whose email starts with `prefix` (case-insensitive), sorted by
    /// email and capped at `limit`
    async fn search_by_email_prefix(&self, prefix: &str, limit: usize)
        -> Result<Vec<UserProfile>>;
}

/// Per-board presence records keyed by user
#[async_trait]
pub trait PresenceStore: Send + Sync {
    async fn put_presence(&self, presence: &UserPresence) -> Result<()>;

    async fn remove_presence(&self, board: &BoardId, user: &UserId) -> Result<()>;

    async fn list_presence(&self, board: &BoardId) -> Result<Vec<UserPresence>>;
}

/// Durable object storage for uploaded files
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Store `bytes` under `path` and return a durable download URL
    async fn upload(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> Result<String>;

    /// Whether `url` answers with an image. Any failure counts as invalid.
    async fn is_valid_image_url(&self, url: &str) -> bool;
}

/// Case-insensitive email prefix match shared by the adapters
pub(crate) fn email_matches(profile: &UserProfile, prefix: &str) -> bool {
    profile
        .email
        .to_lowercase()
        .starts_with(&prefix.trim().to_lowercase())
}
