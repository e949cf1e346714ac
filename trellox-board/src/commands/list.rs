//! List commands

use super::{impl_execute, required_text, BoardCommand};
use crate::error::Result;
use crate::types::{Action, Board, BoardId, List, ListId, UserProfile};
use serde::Deserialize;
use serde_json::{json, Value};

/// Append a list to a board, or insert it at `position`
#[derive(Debug, Deserialize)]
pub struct AddList {
    pub board: BoardId,
    pub title: String,
    /// Index to insert at, clamped to the number of lists
    #[serde(default)]
    pub position: Option<usize>,
}

impl AddList {
    pub fn new(board: impl Into<BoardId>, title: impl Into<String>) -> Self {
        Self {
            board: board.into(),
            title: title.into(),
            position: None,
        }
    }

    pub fn at(mut self, position: usize) -> Self {
        self.position = Some(position);
        self
    }
}

impl BoardCommand for AddList {
    fn op(&self) -> &'static str {
        "add list"
    }

    fn board_id(&self) -> &BoardId {
        &self.board
    }

    fn action(&self) -> Action {
        Action::EditContent
    }

    fn apply(&self, board: &mut Board, actor: &UserProfile) -> Result<Value> {
        let title = required_text("list title", &self.title)?;
        let list = List::new(title).with_created_by(actor.user_id.clone());
        let value = serde_json::to_value(&list)?;
        let index = self
            .position
            .unwrap_or(board.lists.len())
            .min(board.lists.len());
        board.lists.insert(index, list);
        Ok(value)
    }
}

#[derive(Debug, Deserialize)]
pub struct RenameList {
    pub board: BoardId,
    pub list: ListId,
    pub title: String,
}

impl RenameList {
    pub fn new(
        board: impl Into<BoardId>,
        list: impl Into<ListId>,
        title: impl Into<String>,
    ) -> Self {
        Self {
            board: board.into(),
            list: list.into(),
            title: title.into(),
        }
    }
}

impl BoardCommand for RenameList {
    fn op(&self) -> &'static str {
        "rename list"
    }

    fn board_id(&self) -> &BoardId {
        &self.board
    }

    fn action(&self) -> Action {
        Action::EditContent
    }

    fn apply(&self, board: &mut Board, _actor: &UserProfile) -> Result<Value> {
        let title = required_text("list title", &self.title)?;
        let list = board.list_mut(&self.list)?;
        list.title = title;
        Ok(json!({ "id": list.id, "title": list.title }))
    }
}

/// Delete a list together with its cards
#[derive(Debug, Deserialize)]
pub struct DeleteList {
    pub board: BoardId,
    pub list: ListId,
}

impl DeleteList {
    pub fn new(board: impl Into<BoardId>, list: impl Into<ListId>) -> Self {
        Self {
            board: board.into(),
            list: list.into(),
        }
    }
}

impl BoardCommand for DeleteList {
    fn op(&self) -> &'static str {
        "delete list"
    }

    fn board_id(&self) -> &BoardId {
        &self.board
    }

    fn action(&self) -> Action {
        Action::EditContent
    }

    fn apply(&self, board: &mut Board, _actor: &UserProfile) -> Result<Value> {
        let index = board.list_index(&self.list)?;
        let removed = board.lists.remove(index);
        Ok(json!({
            "deleted": true,
            "id": removed.id,
            "cards": removed.cards.len(),
        }))
    }
}

/// Move a list to a new position. The list is located by id on the board
/// being edited.
#[derive(Debug, Deserialize)]
pub struct MoveList {
    pub board: BoardId,
    pub list: ListId,
    pub to: usize,
}

impl MoveList {
    pub fn new(board: impl Into<BoardId>, list: impl Into<ListId>, to: usize) -> Self {
        Self {
            board: board.into(),
            list: list.into(),
            to,
        }
    }
}

impl BoardCommand for MoveList {
    fn op(&self) -> &'static str {
        "move list"
    }

    fn board_id(&self) -> &BoardId {
        &self.board
    }

    fn action(&self) -> Action {
        Action::EditContent
    }

    fn apply(&self, board: &mut Board, _actor: &UserProfile) -> Result<Value> {
        let from = board.list_index(&self.list)?;
        board.move_list(from, self.to)?;
        let order: Vec<&ListId> = board.lists.iter().map(|l| &l.id).collect();
        Ok(json!({ "lists": order }))
    }
}

impl_execute!(AddList, RenameList, DeleteList, MoveList);

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::super::Execute;
    use super::*;
    use crate::error::BoardError;
    use crate::store::{BoardStore, FileStore};
    use crate::types::Role;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    async fn list_ids(store: &FileStore) -> Vec<String> {
        store
            .get_board(&BoardId::from("b1"))
            .await
            .unwrap()
            .lists
            .iter()
            .map(|l| l.id.to_string())
            .collect()
    }

    #[tokio::test]
    async fn test_add_list_appends() {
        let (_temp, store, ctx) = setup().await;
        let result = AddList::new("b1", "Review").execute(&ctx).await.unwrap();
        assert_eq!(result["title"], "Review");
        assert_eq!(result["createdBy"], OWNER);

        let ids = list_ids(&store).await;
        assert_eq!(ids.len(), 3);
        assert_eq!(ids[2], result["id"].as_str().unwrap());
    }

    #[tokio::test]
    async fn test_add_list_at_position_is_clamped() {
        let (_temp, store, ctx) = setup().await;
        let first = AddList::new("b1", "First").at(0).execute(&ctx).await.unwrap();
        let last = AddList::new("b1", "Last").at(99).execute(&ctx).await.unwrap();

        let ids = list_ids(&store).await;
        assert_eq!(ids[0], first["id"].as_str().unwrap());
        assert_eq!(ids[3], last["id"].as_str().unwrap());
    }

    #[tokio::test]
    async fn test_rename_and_delete_list() {
        let (_temp, store, ctx) = setup().await;
        RenameList::new("b1", "l2", "Shipped").execute(&ctx).await.unwrap();
        let board = store.get_board(&BoardId::from("b1")).await.unwrap();
        assert_eq!(board.list(&ListId::from("l2")).unwrap().title, "Shipped");

        let result = DeleteList::new("b1", "l1").execute(&ctx).await.unwrap();
        assert_eq!(result["cards"], 2);
        assert_eq!(list_ids(&store).await, vec!["l2"]);
    }

    #[tokio::test]
    async fn test_rename_missing_list() {
        let (_temp, _store, ctx) = setup().await;
        let err = RenameList::new("b1", "nope", "X").execute(&ctx).await.unwrap_err();
        assert!(matches!(err, BoardError::ListNotFound { .. }));
    }

    #[tokio::test]
    async fn test_move_list() {
        let (_temp, store, ctx) = setup().await;
        let result = MoveList::new("b1", "l1", 1).execute(&ctx).await.unwrap();
        assert_eq!(result["lists"], json!(["l2", "l1"]));
        assert_eq!(list_ids(&store).await, vec!["l2", "l1"]);
    }

    #[tokio::test]
    async fn test_move_list_out_of_range_leaves_board() {
        let (_temp, store, ctx) = setup().await;
        let err = MoveList::new("b1", "l1", 5).execute(&ctx).await.unwrap_err();
        assert!(matches!(err, BoardError::IndexOutOfRange { index: 5, len: 2 }));
        assert_eq!(list_ids(&store).await, vec!["l1", "l2"]);
    }

    /// Inserts a list at the front behind the move's back on the first attempt
    struct RacingMove {
        store: Arc<FileStore>,
        inner: MoveList,
        calls: AtomicU32,
    }

    impl BoardCommand for RacingMove {
        fn op(&self) -> &'static str {
            "racing move"
        }

        fn board_id(&self) -> &BoardId {
            &self.inner.board
        }

        fn action(&self) -> Action {
            Action::EditContent
        }

        fn apply(&self, board: &mut Board, actor: &UserProfile) -> Result<Value> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                let store = self.store.clone();
                let mut other = board.clone();
                other.lists.insert(0, List::new("Backlog").with_id("l0"));
                std::thread::spawn(move || {
                    let rt = tokio::runtime::Builder::new_current_thread()
                        .enable_all()
                        .build()
                        .unwrap();
                    rt.block_on(store.save_board(&other)).unwrap();
                })
                .join()
                .unwrap();
            }
            self.inner.apply(board, actor)
        }
    }

    #[tokio::test]
    async fn test_move_list_retry_moves_the_dragged_list() {
        let (_temp, store, ctx) = setup().await;
        let cmd = RacingMove {
            store: store.clone(),
            inner: MoveList::new("b1", "l2", 0),
            calls: AtomicU32::new(0),
        };

        ctx.run(&cmd).await.unwrap();
        assert_eq!(cmd.calls.load(Ordering::SeqCst), 2);
        assert_eq!(list_ids(&store).await, vec!["l2", "l0", "l1"]);
    }

    #[tokio::test]
    async fn test_move_missing_list() {
        let (_temp, _store, ctx) = setup().await;
        let err = MoveList::new("b1", "nope", 0).execute(&ctx).await.unwrap_err();
        assert!(matches!(err, BoardError::ListNotFound { .. }));
    }

    #[tokio::test]
    async fn test_member_can_edit_lists() {
        let (_temp, store, _ctx) = setup().await;
        add_member(&store, "member", Role::Member).await;
        let member = context_for(&store, profile("member"));
        AddList::new("b1", "Mine").execute(&member).await.unwrap();
        assert_eq!(list_ids(&store).await.len(), 3);
    }
}
