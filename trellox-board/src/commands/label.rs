//! Label commands

use super::{impl_execute, BoardCommand};
use crate::error::{BoardError, Result};
use crate::types::{Action, Board, BoardId, CardId, Label, LabelColor, LabelId, UserProfile};
use serde::Deserialize;
use serde_json::{json, Value};

/// Attach a colored label to a card. The text may be empty.
#[derive(Debug, Deserialize)]
pub struct AddLabel {
    pub board: BoardId,
    pub card: CardId,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub color: LabelColor,
}

impl AddLabel {
    pub fn new(
        board: impl Into<BoardId>,
        card: impl Into<CardId>,
        text: impl Into<String>,
        color: LabelColor,
    ) -> Self {
        Self {
            board: board.into(),
            card: card.into(),
            text: text.into(),
            color,
        }
    }
}

impl BoardCommand for AddLabel {
    fn op(&self) -> &'static str {
        "add label"
    }

    fn board_id(&self) -> &BoardId {
        &self.board
    }

    fn action(&self) -> Action {
        Action::EditContent
    }

    fn apply(&self, board: &mut Board, _actor: &UserProfile) -> Result<Value> {
        let card = board.card_mut(&self.card)?;
        let label = Label::new(self.text.trim(), self.color);
        let value = serde_json::to_value(&label)?;
        card.labels.push(label);
        Ok(value)
    }
}

#[derive(Debug, Deserialize)]
pub struct RemoveLabel {
    pub board: BoardId,
    pub card: CardId,
    pub label: LabelId,
}

impl RemoveLabel {
    pub fn new(
        board: impl Into<BoardId>,
        card: impl Into<CardId>,
        label: impl Into<LabelId>,
    ) -> Self {
        Self {
            board: board.into(),
            card: card.into(),
            label: label.into(),
        }
    }
}

impl BoardCommand for RemoveLabel {
    fn op(&self) -> &'static str {
        "remove label"
    }

    fn board_id(&self) -> &BoardId {
        &self.board
    }

    fn action(&self) -> Action {
        Action::EditContent
    }

    fn apply(&self, board: &mut Board, _actor: &UserProfile) -> Result<Value> {
        let card = board.card_mut(&self.card)?;
        let index = card
            .labels
            .iter()
            .position(|l| l.id == self.label)
            .ok_or_else(|| BoardError::not_found("label", self.label.as_str()))?;
        card.labels.remove(index);
        Ok(json!({ "deleted": true, "id": self.label }))
    }
}

impl_execute!(AddLabel, RemoveLabel);

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::super::Execute;
    use super::*;
    use crate::store::BoardStore;

    #[tokio::test]
    async fn test_add_and_remove_label() {
        let (_temp, store, ctx) = setup().await;
        let result = AddLabel::new("b1", "c1", "urgent", LabelColor::Red)
            .execute(&ctx)
            .await
            .unwrap();
        assert_eq!(result["color"], "red");

        let label = result["id"].as_str().unwrap().to_string();
        let board = store.get_board(&BoardId::from("b1")).await.unwrap();
        assert_eq!(board.card(&CardId::from("c1")).unwrap().labels.len(), 1);

        RemoveLabel::new("b1", "c1", label.as_str())
            .execute(&ctx)
            .await
            .unwrap();
        let board = store.get_board(&BoardId::from("b1")).await.unwrap();
        assert!(board.card(&CardId::from("c1")).unwrap().labels.is_empty());
    }

    #[tokio::test]
    async fn test_remove_missing_label() {
        let (_temp, _store, ctx) = setup().await;
        let err = RemoveLabel::new("b1", "c1", "nope")
            .execute(&ctx)
            .await
            .unwrap_err();
        assert!(matches!(err, BoardError::NotFound { ref resource, .. } if resource == "label"));
    }
}
