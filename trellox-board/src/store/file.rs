//! FileStore - JSON documents on the local filesystem
//!
//! ```text
//! root/
//! ├── .lock                     # advisory writer lock
//! ├── boards/{board_id}.json
//! ├── users/{user_id}.json
//! └── presence/{board_id}/{user_id}.json
//! ```
//!
//! Board documents are run through the sanitizer on every read, so documents
//! written by older clients or edited by hand load with defaults filled in.

use super::{email_matches, BoardStore, PresenceStore, UserDirectory};
use crate::error::{BoardError, Result};
use crate::sanitize::{sanitize_board, RawValue};
use crate::types::{Board, BoardId, UserId, UserPresence, UserProfile};
use async_trait::async_trait;
use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

/// File-backed implementation of every persistence trait
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn boards_dir(&self) -> PathBuf {
        self.root.join("boards")
    }

    /// Document path for a board. Fails when the id is not a plain file name.
    pub fn board_path(&self, id: &BoardId) -> Result<PathBuf> {
        let name = file_name("board", id.as_str())?;
        Ok(self.boards_dir().join(format!("{name}.json")))
    }

    pub fn users_dir(&self) -> PathBuf {
        self.root.join("users")
    }

    pub fn user_path(&self, id: &UserId) -> Result<PathBuf> {
        let name = file_name("user", id.as_str())?;
        Ok(self.users_dir().join(format!("{name}.json")))
    }

    pub fn presence_dir(&self, board: &BoardId) -> Result<PathBuf> {
        let name = file_name("board", board.as_str())?;
        Ok(self.root.join("presence").join(name))
    }

    pub fn presence_path(&self, board: &BoardId, user: &UserId) -> Result<PathBuf> {
        let name = file_name("user", user.as_str())?;
        Ok(self.presence_dir(board)?.join(format!("{name}.json")))
    }

    pub fn lock_path(&self) -> PathBuf {
        self.root.join(".lock")
    }

    /// Try to acquire the exclusive writer lock (non-blocking)
    pub async fn lock(&self) -> Result<StoreLock> {
        let lock_path = self.lock_path();
        fs::create_dir_all(&self.root).await?;

        let file = std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&lock_path)?;

        match file.try_lock_exclusive() {
            Ok(()) => Ok(StoreLock { file }),
            Err(_) => Err(BoardError::LockBusy),
        }
    }

    async fn read_board_file(&self, path: &Path) -> Result<Board> {
        let content = fs::read_to_string(path).await?;
        let value: serde_json::Value = serde_json::from_str(&content)?;
        Ok(sanitize_board(&RawValue::from(&value)))
    }

    async fn list_json_files(dir: &Path) -> Result<Vec<PathBuf>> {
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut files = Vec::new();
        let mut entries = fs::read_dir(dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|s| s.to_str()) == Some("json") {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}

#[async_trait]
impl BoardStore for FileStore {
    async fn boards_for_member(&self, user: &UserId) -> Result<Vec<Board>> {
        let mut boards = Vec::new();
        for path in Self::list_json_files(&self.boards_dir()).await? {
            match self.read_board_file(&path).await {
                Ok(board) if board.members.contains(user) => boards.push(board),
                Ok(_) => {}
                Err(e) => warn!("skipping unreadable board {}: {}", path.display(), e),
            }
        }
        Ok(boards)
    }

    async fn get_board(&self, id: &BoardId) -> Result<Board> {
        let path = self.board_path(id)?;
        if !path.exists() {
            return Err(BoardError::BoardNotFound { id: id.to_string() });
        }
        self.read_board_file(&path).await
    }

    async fn save_board(&self, board: &Board) -> Result<Board> {
        let _lock = self.lock().await?;
        let path = self.board_path(&board.id)?;

        if path.exists() {
            let stored = self.read_board_file(&path).await?;
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
        write_json(&path, &saved).await?;
        debug!(board = %saved.id, revision = saved.revision, "saved board");
        Ok(saved)
    }

    async fn delete_board(&self, id: &BoardId) -> Result<()> {
        let _lock = self.lock().await?;
        let path = self.board_path(id)?;
        if !path.exists() {
            return Err(BoardError::BoardNotFound { id: id.to_string() });
        }
        fs::remove_file(&path).await?;

        let presence = self.presence_dir(id)?;
        if presence.exists() {
            fs::remove_dir_all(&presence).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl UserDirectory for FileStore {
    async fn upsert_profile(&self, profile: &UserProfile) -> Result<()> {
        write_json(&self.user_path(&profile.user_id)?, profile).await
    }

    async fn get_profile(&self, user: &UserId) -> Result<Option<UserProfile>> {
        let path = self.user_path(user)?;
        if !path.exists() {
            return Ok(None);
        }
        read_json(&path).await.map(Some)
    }

    async fn search_by_email_prefix(
        &self,
        prefix: &str,
        limit: usize,
    ) -> Result<Vec<UserProfile>> {
        let mut matches = Vec::new();
        for path in Self::list_json_files(&self.users_dir()).await? {
            let profile: UserProfile = read_json(&path).await?;
            if email_matches(&profile, prefix) {
                matches.push(profile);
            }
        }
        matches.sort_by(|a, b| a.email.cmp(&b.email));
        matches.truncate(limit);
        Ok(matches)
    }
}

#[async_trait]
impl PresenceStore for FileStore {
    async fn put_presence(&self, presence: &UserPresence) -> Result<()> {
        let path = self.presence_path(&presence.board_id, &presence.user_id)?;
        write_json(&path, presence).await
    }

    async fn remove_presence(&self, board: &BoardId, user: &UserId) -> Result<()> {
        let path = self.presence_path(board, user)?;
        if path.exists() {
            fs::remove_file(&path).await?;
        }
        Ok(())
    }

    async fn list_presence(&self, board: &BoardId) -> Result<Vec<UserPresence>> {
        let mut records = Vec::new();
        for path in Self::list_json_files(&self.presence_dir(board)?).await? {
            match read_json::<UserPresence>(&path).await {
                Ok(presence) => records.push(presence),
                Err(e) => warn!("skipping unreadable presence {}: {}", path.display(), e),
            }
        }
        Ok(records)
    }
}

/// Ids are used as file names and must stay a single path component
fn file_name<'a>(kind: &str, id: &'a str) -> Result<&'a str> {
    let plain = !id.is_empty() && id != "." && id != ".." && !id.contains(['/', '\\', '\0']);
    if plain {
        Ok(id)
    } else {
        Err(BoardError::invalid_operation(format!("{kind} id {id:?} cannot be stored")))
    }
}

/// RAII lock guard - releases on drop
pub struct StoreLock {
    file: std::fs::File,
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path).await?;
    Ok(serde_json::from_str(&content)?)
}

async fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let content = serde_json::to_string_pretty(value)?;
    atomic_write(path, content.as_bytes()).await
}

/// Atomic write via temp file and rename
async fn atomic_write(path: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }

    let temp_path = path.with_extension("tmp");
    fs::write(&temp_path, content).await?;
    fs::rename(&temp_path, path).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Card, List, Membership, Role};
    use tempfile::TempDir;

    fn setup() -> (TempDir, FileStore) {
        let temp = TempDir::new().unwrap();
        let store = FileStore::new(temp.path().join("data"));
        (temp, store)
    }

    fn sample_board() -> Board {
        Board::new(
            "Roadmap",
            Membership::new("owner", "owner@example.com", Role::Owner),
        )
        .with_lists(vec![List::new("Todo").with_cards(vec![Card::new("Write docs")])])
    }

    #[tokio::test]
    async fn test_paths() {
        let (temp, store) = setup();
        let root = temp.path().join("data");
        assert_eq!(store.root(), root);
        assert_eq!(
            store.board_path(&BoardId::from("b1")).unwrap(),
            root.join("boards").join("b1.json")
        );
        assert_eq!(
            store
                .presence_path(&BoardId::from("b1"), &UserId::from("u1"))
                .unwrap(),
            root.join("presence").join("b1").join("u1.json")
        );
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let (_temp, store) = setup();
        let board = sample_board();

        let saved = store.save_board(&board).await.unwrap();
        assert_eq!(saved.revision, 1);

        let loaded = store.get_board(&board.id).await.unwrap();
        assert_eq!(loaded, saved);
    }

    #[tokio::test]
    async fn test_stale_revision_rejected() {
        let (_temp, store) = setup();
        let board = sample_board();
        let saved = store.save_board(&board).await.unwrap();

        // Saving from the pre-save copy is stale
        let mut stale = board.clone();
        stale.title = "Clobber".into();
        let err = store.save_board(&stale).await.unwrap_err();
        assert!(matches!(
            err,
            BoardError::StaleRevision {
                expected: 0,
                actual: 1,
                ..
            }
        ));

        let loaded = store.get_board(&board.id).await.unwrap();
        assert_eq!(loaded.title, "Roadmap");

        let again = store.save_board(&saved).await.unwrap();
        assert_eq!(again.revision, 2);
    }

    #[tokio::test]
    async fn test_get_missing_board() {
        let (_temp, store) = setup();
        let err = store.get_board(&BoardId::from("nope")).await.unwrap_err();
        assert!(matches!(err, BoardError::BoardNotFound { .. }));
    }

    #[tokio::test]
    async fn test_ids_cannot_leave_the_root() {
        let (temp, store) = setup();
        let board = sample_board().with_id("../../escaped");

        let err = store.save_board(&board).await.unwrap_err();
        assert!(matches!(err, BoardError::InvalidOperation { .. }));
        assert!(!temp.path().join("escaped.json").exists());

        for id in ["", "..", "a/b", "a\\b"] {
            assert!(store.get_board(&BoardId::from(id)).await.is_err());
        }
        let profile = UserProfile::new("../intruder", "intruder@example.com");
        assert!(store.upsert_profile(&profile).await.is_err());
        assert!(store
            .remove_presence(&BoardId::from("b1"), &UserId::from(".."))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_boards_for_member() {
        let (_temp, store) = setup();
        let board = sample_board();
        store.save_board(&board).await.unwrap();

        let mine = store.boards_for_member(&UserId::from("owner")).await.unwrap();
        assert_eq!(mine.len(), 1);
        let theirs = store.boards_for_member(&UserId::from("other")).await.unwrap();
        assert!(theirs.is_empty());
    }

    #[tokio::test]
    async fn test_hand_edited_document_is_sanitized() {
        let (_temp, store) = setup();
        let id = BoardId::from("legacy");
        std::fs::create_dir_all(store.boards_dir()).unwrap();
        std::fs::write(
            store.board_path(&id).unwrap(),
            r#"{"id": "legacy", "createdBy": "u1", "lists": [{"cards": [{}]}]}"#,
        )
        .unwrap();

        let board = store.get_board(&id).await.unwrap();
        assert_eq!(board.title, "Untitled Board");
        assert_eq!(board.lists[0].cards[0].content, "Untitled Card");
        assert!(board.members.contains(&UserId::from("u1")));
    }

    #[tokio::test]
    async fn test_delete_board() {
        let (_temp, store) = setup();
        let board = sample_board();
        store.save_board(&board).await.unwrap();
        store.delete_board(&board.id).await.unwrap();
        assert!(store.get_board(&board.id).await.is_err());
    }

    #[tokio::test]
    async fn test_locking() {
        let (_temp, store) = setup();

        let lock1 = store.lock().await.unwrap();
        let result = store.lock().await;
        assert!(matches!(result, Err(BoardError::LockBusy)));

        drop(lock1);
        let _lock2 = store.lock().await.unwrap();
    }

    #[tokio::test]
    async fn test_email_prefix_search() {
        let (_temp, store) = setup();
        for (id, email) in [
            ("u1", "ann@example.com"),
            ("u2", "Andy@example.com"),
            ("u3", "bob@example.com"),
        ] {
            store
                .upsert_profile(&UserProfile::new(id, email))
                .await
                .unwrap();
        }

        let found = store.search_by_email_prefix("an", 10).await.unwrap();
        let ids: Vec<&str> = found.iter().map(|p| p.user_id.as_str()).collect();
        assert_eq!(ids, vec!["u2", "u1"]);

        let capped = store.search_by_email_prefix("", 1).await.unwrap();
        assert_eq!(capped.len(), 1);
    }

    #[tokio::test]
    async fn test_presence_round_trip() {
        let (_temp, store) = setup();
        let profile = UserProfile::new("u1", "a@example.com");
        let board = BoardId::from("b1");
        let presence = UserPresence::for_profile(&profile, board.clone(), true);

        store.put_presence(&presence).await.unwrap();
        assert_eq!(store.list_presence(&board).await.unwrap(), vec![presence]);

        store.remove_presence(&board, &profile.user_id).await.unwrap();
        assert!(store.list_presence(&board).await.unwrap().is_empty());
    }
}
