//! Checklist commands
//!
//! Array order is the checklist order; every change renumbers `pos` to match.

use super::{impl_execute, required_text, BoardCommand};
use crate::error::{BoardError, Result};
use crate::reorder::{renumber, reorder_in_place};
use crate::types::{
    Action, Board, BoardId, CardId, Checklist, ChecklistId, ChecklistItem, ChecklistItemId,
    UserProfile,
};
use serde::Deserialize;
use serde_json::{json, Value};

fn checklist_mut<'a>(
    board: &'a mut Board,
    card: &CardId,
    checklist: &ChecklistId,
) -> Result<&'a mut Checklist> {
    board
        .card_mut(card)?
        .checklist_mut(checklist)
        .ok_or_else(|| BoardError::not_found("checklist", checklist.as_str()))
}

fn item_index(checklist: &Checklist, item: &ChecklistItemId) -> Result<usize> {
    checklist
        .item_index(item)
        .ok_or_else(|| BoardError::not_found("checklist item", item.as_str()))
}

fn summary(checklist: &Checklist) -> Value {
    json!({
        "id": checklist.id,
        "completed": checklist.completed(),
        "total": checklist.items.len(),
        "items": checklist.items,
    })
}

/// Add an empty checklist to the end of a card's checklists
#[derive(Debug, Deserialize)]
pub struct AddChecklist {
    pub board: BoardId,
    pub card: CardId,
    pub title: String,
}

impl AddChecklist {
    pub fn new(board: impl Into<BoardId>, card: impl Into<CardId>, title: impl Into<String>) -> Self {
        Self {
            board: board.into(),
            card: card.into(),
            title: title.into(),
        }
    }
}

impl BoardCommand for AddChecklist {
    fn op(&self) -> &'static str {
        "add checklist"
    }

    fn board_id(&self) -> &BoardId {
        &self.board
    }

    fn action(&self) -> Action {
        Action::EditContent
    }

    fn apply(&self, board: &mut Board, _actor: &UserProfile) -> Result<Value> {
        let title = required_text("checklist title", &self.title)?;
        let card = board.card_mut(&self.card)?;
        card.checklists.push(Checklist::new(title));
        renumber(&mut card.checklists);
        let added = card
            .checklists
            .last()
            .ok_or_else(|| BoardError::invalid_operation("checklist was not added"))?;
        Ok(serde_json::to_value(added)?)
    }
}

#[derive(Debug, Deserialize)]
pub struct AddChecklistItem {
    pub board: BoardId,
    pub card: CardId,
    pub checklist: ChecklistId,
    pub name: String,
}

impl AddChecklistItem {
    pub fn new(
        board: impl Into<BoardId>,
        card: impl Into<CardId>,
        checklist: impl Into<ChecklistId>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            board: board.into(),
            card: card.into(),
            checklist: checklist.into(),
            name: name.into(),
        }
    }
}

impl BoardCommand for AddChecklistItem {
    fn op(&self) -> &'static str {
        "add checklist item"
    }

    fn board_id(&self) -> &BoardId {
        &self.board
    }

    fn action(&self) -> Action {
        Action::EditContent
    }

    fn apply(&self, board: &mut Board, _actor: &UserProfile) -> Result<Value> {
        let name = required_text("item name", &self.name)?;
        let checklist = checklist_mut(board, &self.card, &self.checklist)?;
        checklist.items.push(ChecklistItem::new(name));
        renumber(&mut checklist.items);
        Ok(summary(checklist))
    }
}

/// Flip an item between complete and incomplete
#[derive(Debug, Deserialize)]
pub struct ToggleChecklistItem {
    pub board: BoardId,
    pub card: CardId,
    pub checklist: ChecklistId,
    pub item: ChecklistItemId,
}

impl ToggleChecklistItem {
    pub fn new(
        board: impl Into<BoardId>,
        card: impl Into<CardId>,
        checklist: impl Into<ChecklistId>,
        item: impl Into<ChecklistItemId>,
    ) -> Self {
        Self {
            board: board.into(),
            card: card.into(),
            checklist: checklist.into(),
            item: item.into(),
        }
    }
}

impl BoardCommand for ToggleChecklistItem {
    fn op(&self) -> &'static str {
        "toggle checklist item"
    }

    fn board_id(&self) -> &BoardId {
        &self.board
    }

    fn action(&self) -> Action {
        Action::EditContent
    }

    fn apply(&self, board: &mut Board, _actor: &UserProfile) -> Result<Value> {
        let checklist = checklist_mut(board, &self.card, &self.checklist)?;
        let index = item_index(checklist, &self.item)?;
        let item = &mut checklist.items[index];
        item.state = item.state.toggled();
        Ok(summary(checklist))
    }
}

/// Move an item to a new position within its checklist
#[derive(Debug, Deserialize)]
pub struct MoveChecklistItem {
    pub board: BoardId,
    pub card: CardId,
    pub checklist: ChecklistId,
    pub item: ChecklistItemId,
    pub to: usize,
}

impl MoveChecklistItem {
    pub fn new(
        board: impl Into<BoardId>,
        card: impl Into<CardId>,
        checklist: impl Into<ChecklistId>,
        item: impl Into<ChecklistItemId>,
        to: usize,
    ) -> Self {
        Self {
            board: board.into(),
            card: card.into(),
            checklist: checklist.into(),
            item: item.into(),
            to,
        }
    }
}

impl BoardCommand for MoveChecklistItem {
    fn op(&self) -> &'static str {
        "move checklist item"
    }

    fn board_id(&self) -> &BoardId {
        &self.board
    }

    fn action(&self) -> Action {
        Action::EditContent
    }

    fn apply(&self, board: &mut Board, _actor: &UserProfile) -> Result<Value> {
        let checklist = checklist_mut(board, &self.card, &self.checklist)?;
        let from = item_index(checklist, &self.item)?;
        reorder_in_place(&mut checklist.items, from, self.to)?;
        renumber(&mut checklist.items);
        Ok(summary(checklist))
    }
}

#[derive(Debug, Deserialize)]
pub struct DeleteChecklistItem {
    pub board: BoardId,
    pub card: CardId,
    pub checklist: ChecklistId,
    pub item: ChecklistItemId,
}

impl DeleteChecklistItem {
    pub fn new(
        board: impl Into<BoardId>,
        card: impl Into<CardId>,
        checklist: impl Into<ChecklistId>,
        item: impl Into<ChecklistItemId>,
    ) -> Self {
        Self {
            board: board.into(),
            card: card.into(),
            checklist: checklist.into(),
            item: item.into(),
        }
    }
}

impl BoardCommand for DeleteChecklistItem {
    fn op(&self) -> &'static str {
        "delete checklist item"
    }

    fn board_id(&self) -> &BoardId {
        &self.board
    }

    fn action(&self) -> Action {
        Action::EditContent
    }

    fn apply(&self, board: &mut Board, _actor: &UserProfile) -> Result<Value> {
        let checklist = checklist_mut(board, &self.card, &self.checklist)?;
        let index = item_index(checklist, &self.item)?;
        checklist.items.remove(index);
        renumber(&mut checklist.items);
        Ok(summary(checklist))
    }
}

impl_execute!(
    AddChecklist,
    AddChecklistItem,
    ToggleChecklistItem,
    MoveChecklistItem,
    DeleteChecklistItem,
);
