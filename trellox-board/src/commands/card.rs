//! Card commands

use super::{impl_execute, required_text, BoardCommand};
use crate::error::{BoardError, Result};
use crate::types::{Action, Board, BoardId, Card, CardId, ListId, UserId, UserProfile};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashSet;

/// Append a card to a list
#[derive(Debug, Deserialize)]
pub struct AddCard {
    pub board: BoardId,
    pub list: ListId,
    pub content: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl AddCard {
    pub fn new(
        board: impl Into<BoardId>,
        list: impl Into<ListId>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            board: board.into(),
            list: list.into(),
            content: content.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

impl BoardCommand for AddCard {
    fn op(&self) -> &'static str {
        "add card"
    }

    fn board_id(&self) -> &BoardId {
        &self.board
    }

    fn action(&self) -> Action {
        Action::EditContent
    }

    fn apply(&self, board: &mut Board, actor: &UserProfile) -> Result<Value> {
        let content = required_text("card content", &self.content)?;
        let mut card = Card::new(content).with_created_by(actor.user_id.clone());
        card.description = self.description.clone().filter(|d| !d.trim().is_empty());

        let list = board.list_mut(&self.list)?;
        let value = serde_json::to_value(&card)?;
        list.cards.push(card);
        Ok(value)
    }
}

/// Edit a card's fields. Unset fields are left alone.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateCard {
    pub board: BoardId,
    pub card: CardId,
    #[serde(default)]
    pub content: Option<String>,
    /// An empty description clears it
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub clear_due_date: bool,
    #[serde(default)]
    pub assigned_to: Option<Vec<UserId>>,
}

impl UpdateCard {
    pub fn new(board: impl Into<BoardId>, card: impl Into<CardId>) -> Self {
        Self {
            board: board.into(),
            card: card.into(),
            ..Default::default()
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_due_date(mut self, due: DateTime<Utc>) -> Self {
        self.due_date = Some(due);
        self
    }

    pub fn clear_due_date(mut self) -> Self {
        self.clear_due_date = true;
        self
    }

    pub fn with_assigned_to(mut self, users: Vec<UserId>) -> Self {
        self.assigned_to = Some(users);
        self
    }
}

impl BoardCommand for UpdateCard {
    fn op(&self) -> &'static str {
        "update card"
    }

    fn board_id(&self) -> &BoardId {
        &self.board
    }

    fn action(&self) -> Action {
        Action::EditContent
    }

    fn apply(&self, board: &mut Board, _actor: &UserProfile) -> Result<Value> {
        let content = self
            .content
            .as_deref()
            .map(|c| required_text("card content", c))
            .transpose()?;

        let card = board.card_mut(&self.card)?;
        if let Some(content) = content {
            card.content = content;
        }
        if let Some(description) = &self.description {
            card.description = Some(description.clone()).filter(|d| !d.trim().is_empty());
        }
        if self.clear_due_date {
            card.due_date = None;
        } else if let Some(due) = self.due_date {
            card.due_date = Some(due);
        }
        if let Some(users) = &self.assigned_to {
            let mut seen = HashSet::new();
            card.assigned_to = users
                .iter()
                .filter(|u| seen.insert(*u))
                .cloned()
                .collect();
        }
        Ok(serde_json::to_value(&*card)?)
    }
}

#[derive(Debug, Deserialize)]
pub struct DeleteCard {
    pub board: BoardId,
    pub card: CardId,
}

impl DeleteCard {
    pub fn new(board: impl Into<BoardId>, card: impl Into<CardId>) -> Self {
        Self {
            board: board.into(),
            card: card.into(),
        }
    }
}

impl BoardCommand for DeleteCard {
    fn op(&self) -> &'static str {
        "delete card"
    }

    fn board_id(&self) -> &BoardId {
        &self.board
    }

    fn action(&self) -> Action {
        Action::EditContent
    }

    fn apply(&self, board: &mut Board, _actor: &UserProfile) -> Result<Value> {
        board.card(&self.card)?;
        for list in &mut board.lists {
            list.cards.retain(|c| c.id != self.card);
        }
        Ok(json!({ "deleted": true, "id": self.card }))
    }
}

/// Move a card within its list or to another list.
///
/// The card is located by id on the board being edited, so a retry after a
/// concurrent change still moves the dragged card. Within one list
/// `to_index` must be valid. Across lists it is clamped to the destination
/// length.
#[derive(Debug, Deserialize)]
pub struct MoveCard {
    pub board: BoardId,
    pub card: CardId,
    pub to_list: ListId,
    pub to_index: usize,
}

impl MoveCard {
    pub fn new(
        board: impl Into<BoardId>,
        card: impl Into<CardId>,
        to_list: impl Into<ListId>,
        to_index: usize,
    ) -> Self {
        Self {
            board: board.into(),
            card: card.into(),
            to_list: to_list.into(),
            to_index,
        }
    }
}

impl BoardCommand for MoveCard {
    fn op(&self) -> &'static str {
        "move card"
    }

    fn board_id(&self) -> &BoardId {
        &self.board
    }

    fn action(&self) -> Action {
        Action::EditContent
    }

    fn apply(&self, board: &mut Board, _actor: &UserProfile) -> Result<Value> {
        let (source, from_index) = board
            .find_card(&self.card)
            .ok_or_else(|| BoardError::CardNotFound {
                id: self.card.to_string(),
            })?;
        let from_list = board.lists[source].id.clone();
        board.move_card(&from_list, from_index, &self.to_list, self.to_index)?;

        let describe = |list: &ListId| -> Result<Value> {
            let list = board.list(list)?;
            let cards: Vec<&CardId> = list.cards.iter().map(|c| &c.id).collect();
            Ok(json!({ "id": list.id, "cards": cards }))
        };
        let mut lists = vec![describe(&from_list)?];
        if from_list != self.to_list {
            lists.push(describe(&self.to_list)?);
        }
        Ok(json!({ "lists": lists }))
    }
}

impl_execute!(AddCard, UpdateCard, DeleteCard, MoveCard);
