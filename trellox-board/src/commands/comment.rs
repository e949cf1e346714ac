//! AddComment command

use super::{impl_execute, required_text, BoardCommand};
use crate::error::Result;
use crate::types::{Action, Board, BoardId, CardId, Comment, UserProfile};
use serde::Deserialize;
use serde_json::Value;

/// Comment on a card as the acting user
#[derive(Debug, Deserialize)]
pub struct AddComment {
    pub board: BoardId,
    pub card: CardId,
    pub text: String,
}

impl AddComment {
    pub fn new(board: impl Into<BoardId>, card: impl Into<CardId>, text: impl Into<String>) -> Self {
        Self {
            board: board.into(),
            card: card.into(),
            text: text.into(),
        }
    }
}

impl BoardCommand for AddComment {
    fn op(&self) -> &'static str {
        "add comment"
    }

    fn board_id(&self) -> &BoardId {
        &self.board
    }

    fn action(&self) -> Action {
        Action::EditContent
    }

    fn apply(&self, board: &mut Board, actor: &UserProfile) -> Result<Value> {
        let text = required_text("comment", &self.text)?;
        let comment = Comment::new(text, actor.label(), actor.user_id.clone());
        let card = board.card_mut(&self.card)?;
        let value = serde_json::to_value(&comment)?;
        card.comments.push(comment);
        Ok(value)
    }
}

impl_execute!(AddComment);

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::super::Execute;
    use super::*;
    use crate::error::BoardError;
    use crate::store::BoardStore;

    #[tokio::test]
    async fn test_add_comment_records_author() {
        let (_temp, store, _ctx) = setup().await;
        let actor = profile(OWNER).with_display_name("Olive");
        let ctx = context_for(&store, actor);

        let result = AddComment::new("b1", "c2", "Looks good")
            .execute(&ctx)
            .await
            .unwrap();
        assert_eq!(result["author"], "Olive");
        assert_eq!(result["authorId"], OWNER);

        let board = store.get_board(&BoardId::from("b1")).await.unwrap();
        assert_eq!(board.card(&CardId::from("c2")).unwrap().comments[0].text, "Looks good");
    }

    #[tokio::test]
    async fn test_blank_comment_rejected() {
        let (_temp, _store, ctx) = setup().await;
        let err = AddComment::new("b1", "c2", "\n").execute(&ctx).await.unwrap_err();
        assert!(matches!(err, BoardError::InvalidOperation { .. }));
    }
}
