//! Board-level commands: create, get, list, rename, background, delete

use super::{impl_execute, required_text, BoardCommand, BoardContext, Execute};
use crate::error::{BoardError, Result};
use crate::store::ObjectStorage;
use crate::types::{Action, Background, Board, BoardId, List, Membership, Role, UserId, UserProfile};
use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

/// Lists a new board starts with unless it is created empty
pub const DEFAULT_LIST_TITLES: [&str; 3] = ["To Do", "In Progress", "Done"];

/// Create a board owned by the acting user
#[derive(Debug, Deserialize)]
pub struct CreateBoard {
    pub title: String,
    #[serde(default)]
    pub background: Option<Background>,
    /// Skip the default lists
    #[serde(default)]
    pub empty: bool,
}

impl CreateBoard {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            background: None,
            empty: false,
        }
    }

    pub fn with_background(mut self, background: Background) -> Self {
        self.background = Some(background);
        self
    }

    pub fn empty(mut self) -> Self {
        self.empty = true;
        self
    }
}

fn owner_membership(actor: &UserProfile) -> Membership {
    Membership {
        display_name: actor.display_name.clone(),
        photo_url: actor.photo_url.clone(),
        ..Membership::new(actor.user_id.clone(), actor.email.clone(), Role::Owner)
    }
}

#[async_trait]
impl Execute for CreateBoard {
    async fn execute(&self, ctx: &BoardContext) -> Result<Value> {
        let title = required_text("board title", &self.title)?;
        let actor = ctx.actor();

        let mut board = Board::new(title, owner_membership(actor));
        board.background = self.background.clone();
        if !self.empty {
            board.lists = DEFAULT_LIST_TITLES
                .iter()
                .map(|title| List::new(*title).with_created_by(actor.user_id.clone()))
                .collect();
        }

        let saved = ctx.store().save_board(&board).await?;
        info!(board = %saved.id, owner = %actor.user_id, "created board");
        let value = serde_json::to_value(&saved)?;
        ctx.publish(saved);
        Ok(value)
    }
}

/// Fetch one board the actor can view
#[derive(Debug, Deserialize)]
pub struct GetBoard {
    pub id: BoardId,
}

impl GetBoard {
    pub fn new(id: impl Into<BoardId>) -> Self {
        Self { id: id.into() }
    }
}

#[async_trait]
impl Execute for GetBoard {
    async fn execute(&self, ctx: &BoardContext) -> Result<Value> {
        let board = ctx.store().get_board(&self.id).await?;
        ctx.authorize(&board, Action::ViewBoard)?;
        Ok(serde_json::to_value(&board)?)
    }
}

/// Summaries of every board the actor belongs to, oldest first
#[derive(Debug, Default, Deserialize)]
pub struct ListBoards;

#[async_trait]
impl Execute for ListBoards {
    async fn execute(&self, ctx: &BoardContext) -> Result<Value> {
        let actor = &ctx.actor().user_id;
        let mut boards = ctx.store().boards_for_member(actor).await?;
        boards.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

        let summaries: Vec<Value> = boards
            .iter()
            .map(|board| {
                json!({
                    "id": board.id,
                    "title": board.title,
                    "background": board.effective_background(),
                    "role": board.role_of(actor),
                    "lists": board.lists.len(),
                    "cards": board.card_count(),
                })
            })
            .collect();

        Ok(json!({
            "boards": summaries,
            "count": summaries.len(),
        }))
    }
}

/// Change a board's title
#[derive(Debug, Deserialize)]
pub struct RenameBoard {
    pub id: BoardId,
    pub title: String,
}

impl RenameBoard {
    pub fn new(id: impl Into<BoardId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
        }
    }
}

impl BoardCommand for RenameBoard {
    fn op(&self) -> &'static str {
        "rename board"
    }

    fn board_id(&self) -> &BoardId {
        &self.id
    }

    fn action(&self) -> Action {
        Action::EditContent
    }

    fn apply(&self, board: &mut Board, _actor: &UserProfile) -> Result<Value> {
        board.title = required_text("board title", &self.title)?;
        Ok(json!({ "id": board.id, "title": board.title }))
    }
}

/// Replace a board's background
#[derive(Debug, Deserialize)]
pub struct SetBackground {
    pub id: BoardId,
    pub background: Background,
}

impl SetBackground {
    pub fn new(id: impl Into<BoardId>, background: Background) -> Self {
        Self {
            id: id.into(),
            background,
        }
    }
}

impl BoardCommand for SetBackground {
    fn op(&self) -> &'static str {
        "set background"
    }

    fn board_id(&self) -> &BoardId {
        &self.id
    }

    fn action(&self) -> Action {
        Action::EditContent
    }

    fn apply(&self, board: &mut Board, _actor: &UserProfile) -> Result<Value> {
        let valid = match &self.background {
            Background::Color { color } => !color.trim().is_empty(),
            Background::Gradient { top, bottom } => {
                !top.trim().is_empty() && !bottom.trim().is_empty()
            }
            Background::Image { url } => !url.trim().is_empty(),
        };
        if !valid {
            return Err(BoardError::invalid_operation("background must not be empty"));
        }
        board.background = Some(self.background.clone());
        Ok(json!({ "id": board.id, "background": board.background }))
    }
}

impl_execute!(RenameBoard, SetBackground);

/// Delete a board. Only its owner may.
#[derive(Debug, Deserialize)]
pub struct DeleteBoard {
    pub id: BoardId,
}

impl DeleteBoard {
    pub fn new(id: impl Into<BoardId>) -> Self {
        Self { id: id.into() }
    }
}

#[async_trait]
impl Execute for DeleteBoard {
    async fn execute(&self, ctx: &BoardContext) -> Result<Value> {
        let board = ctx.store().get_board(&self.id).await?;
        ctx.authorize(&board, Action::DeleteBoard)?;
        ctx.store().delete_board(&self.id).await?;
        info!(board = %self.id, "deleted board");
        Ok(json!({ "deleted": true, "id": self.id }))
    }
}

/// Storage path for an uploaded background image
pub fn background_upload_path(user: &UserId, file_name: &str, timestamp_millis: i64) -> String {
    let file_name: String = file_name
        .trim()
        .chars()
        .map(|c| if c == '/' || c == '\\' { '_' } else { c })
        .collect();
    format!("board-backgrounds/{user}/{timestamp_millis}-{file_name}")
}

/// Upload an image and return it as a board background
pub async fn upload_background(
    storage: &dyn ObjectStorage,
    user: &UserId,
    file_name: &str,
    bytes: Vec<u8>,
    content_type: &str,
) -> Result<Background> {
    if !content_type.starts_with("image/") {
        return Err(BoardError::invalid_operation(format!(
            "background must be an image, got {content_type}"
        )));
    }
    if bytes.is_empty() {
        return Err(BoardError::invalid_operation("background image is empty"));
    }
    let path = background_upload_path(user, file_name, Utc::now().timestamp_millis());
    let url = storage.upload(&path, bytes, content_type).await?;
    info!(path = %path, "uploaded board background");
    Ok(Background::image(url))
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::store::BoardStore;
    use std::sync::Mutex;

    #[tokio::test]
    async fn test_create_board_with_default_lists() {
        let (_temp, store, ctx) = setup().await;

        let result = CreateBoard::new("Launch").execute(&ctx).await.unwrap();
        assert_eq!(result["title"], "Launch");
        assert_eq!(result["revision"], 1);

        let id = BoardId::from(result["id"].as_str().unwrap());
        let board = store.get_board(&id).await.unwrap();
        let titles: Vec<_> = board.lists.iter().map(|l| l.title.as_str()).collect();
        assert_eq!(titles, DEFAULT_LIST_TITLES);
        assert_eq!(board.role_of(&UserId::from(OWNER)), Some(Role::Owner));
        assert!(board.members.contains(&UserId::from(OWNER)));
    }

    #[tokio::test]
    async fn test_create_empty_board() {
        let (_temp, _store, ctx) = setup().await;
        let result = CreateBoard::new("Blank").empty().execute(&ctx).await.unwrap();
        assert_eq!(result["lists"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_create_board_rejects_blank_title() {
        let (_temp, _store, ctx) = setup().await;
        let err = CreateBoard::new("  ").execute(&ctx).await.unwrap_err();
        assert!(matches!(err, BoardError::InvalidOperation { .. }));
    }

    #[tokio::test]
    async fn test_list_boards_only_shows_membership() {
        let (_temp, store, ctx) = setup().await;
        CreateBoard::new("Second").execute(&ctx).await.unwrap();

        let result = ListBoards.execute(&ctx).await.unwrap();
        assert_eq!(result["count"], 2);
        assert_eq!(result["boards"][0]["title"], "Test");
        assert_eq!(result["boards"][0]["role"], "owner");
        assert_eq!(result["boards"][0]["cards"], 2);

        let stranger = context_for(&store, profile("stranger"));
        let result = ListBoards.execute(&stranger).await.unwrap();
        assert_eq!(result["count"], 0);
    }

    #[tokio::test]
    async fn test_get_board_requires_membership() {
        let (_temp, store, ctx) = setup().await;
        let result = GetBoard::new("b1").execute(&ctx).await.unwrap();
        assert_eq!(result["title"], "Test");

        let stranger = context_for(&store, profile("stranger"));
        let err = GetBoard::new("b1").execute(&stranger).await.unwrap_err();
        assert!(matches!(err, BoardError::PermissionDenied { .. }));
    }

    #[tokio::test]
    async fn test_rename_board() {
        let (_temp, store, ctx) = setup().await;
        RenameBoard::new("b1", " Renamed ").execute(&ctx).await.unwrap();
        let board = store.get_board(&BoardId::from("b1")).await.unwrap();
        assert_eq!(board.title, "Renamed");
    }

    #[tokio::test]
    async fn test_viewer_cannot_rename() {
        let (_temp, store, _ctx) = setup().await;
        add_member(&store, "viewer", Role::Viewer).await;
        let before = store.get_board(&BoardId::from("b1")).await.unwrap();

        let viewer = context_for(&store, profile("viewer"));
        let err = RenameBoard::new("b1", "Nope").execute(&viewer).await.unwrap_err();
        assert!(matches!(err, BoardError::PermissionDenied { .. }));
        assert_eq!(store.get_board(&BoardId::from("b1")).await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_set_background() {
        let (_temp, store, ctx) = setup().await;
        SetBackground::new(
            "b1",
            Background::Gradient {
                top: "#111".into(),
                bottom: "#222".into(),
            },
        )
        .execute(&ctx)
        .await
        .unwrap();

        let board = store.get_board(&BoardId::from("b1")).await.unwrap();
        assert_eq!(
            board.effective_background().css(),
            "linear-gradient(to bottom, #111, #222)"
        );

        let err = SetBackground::new("b1", Background::color(" "))
            .execute(&ctx)
            .await
            .unwrap_err();
        assert!(matches!(err, BoardError::InvalidOperation { .. }));
    }

    #[tokio::test]
    async fn test_delete_board_is_owner_only() {
        let (_temp, store, ctx) = setup().await;
        add_member(&store, "admin", Role::Admin).await;

        let admin = context_for(&store, profile("admin"));
        let err = DeleteBoard::new("b1").execute(&admin).await.unwrap_err();
        assert!(matches!(err, BoardError::PermissionDenied { .. }));

        DeleteBoard::new("b1").execute(&ctx).await.unwrap();
        assert!(matches!(
            store.get_board(&BoardId::from("b1")).await,
            Err(BoardError::BoardNotFound { .. })
        ));
    }

    #[derive(Default)]
    struct FakeStorage {
        uploads: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl ObjectStorage for FakeStorage {
        async fn upload(&self, path: &str, _bytes: Vec<u8>, content_type: &str) -> Result<String> {
            self.uploads
                .lock()
                .unwrap()
                .push((path.to_string(), content_type.to_string()));
            Ok(format!("https://files.example.com/{path}"))
        }

        async fn is_valid_image_url(&self, _url: &str) -> bool {
            true
        }
    }

    #[test]
    fn test_background_upload_path() {
        assert_eq!(
            background_upload_path(&UserId::from("u1"), "../sky.png", 1700000000000),
            "board-backgrounds/u1/1700000000000-.._sky.png"
        );
    }

    #[tokio::test]
    async fn test_upload_background() {
        let storage = FakeStorage::default();
        let background = upload_background(
            &storage,
            &UserId::from("u1"),
            "sky.png",
            vec![1, 2, 3],
            "image/png",
        )
        .await
        .unwrap();

        let uploads = storage.uploads.lock().unwrap();
        assert_eq!(uploads.len(), 1);
        assert!(uploads[0].0.starts_with("board-backgrounds/u1/"));
        assert!(uploads[0].0.ends_with("-sky.png"));
        assert!(matches!(background, Background::Image { url } if url.starts_with("https://files.example.com/")));
    }

    #[tokio::test]
    async fn test_upload_rejects_non_images() {
        let storage = FakeStorage::default();
        let err = upload_background(
            &storage,
            &UserId::from("u1"),
            "notes.txt",
            vec![1],
            "text/plain",
        )
        .await
        .unwrap_err();
        assert!(matches!(err, BoardError::InvalidOperation { .. }));
        assert!(storage.uploads.lock().unwrap().is_empty());
    }
}
