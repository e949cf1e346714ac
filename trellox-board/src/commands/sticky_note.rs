//! Sticky note commands

use super::{impl_execute, BoardCommand};
use crate::error::{BoardError, Result};
use crate::types::{Action, Board, BoardId, NoteColor, NotePosition, StickyNote, StickyNoteId, UserProfile};
use serde::Deserialize;
use serde_json::{json, Value};

const DEFAULT_NOTE_CONTENT: &str = "New sticky note";

fn note_mut<'a>(board: &'a mut Board, id: &StickyNoteId) -> Result<&'a mut StickyNote> {
    board
        .sticky_notes
        .iter_mut()
        .find(|n| &n.id == id)
        .ok_or_else(|| BoardError::not_found("sticky note", id.as_str()))
}

/// Pin a note to the board canvas
#[derive(Debug, Deserialize)]
pub struct AddStickyNote {
    pub board: BoardId,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub position: NotePosition,
    #[serde(default)]
    pub color: Option<NoteColor>,
}

impl AddStickyNote {
    pub fn new(board: impl Into<BoardId>, x: f64, y: f64) -> Self {
        Self {
            board: board.into(),
            content: None,
            position: NotePosition { x, y },
            color: None,
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn with_color(mut self, color: NoteColor) -> Self {
        self.color = Some(color);
        self
    }
}

impl BoardCommand for AddStickyNote {
    fn op(&self) -> &'static str {
        "add sticky note"
    }

    fn board_id(&self) -> &BoardId {
        &self.board
    }

    fn action(&self) -> Action {
        Action::EditContent
    }

    fn apply(&self, board: &mut Board, actor: &UserProfile) -> Result<Value> {
        let content = self
            .content
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .unwrap_or(DEFAULT_NOTE_CONTENT);
        let mut note = StickyNote::new(content, self.position.x, self.position.y);
        if let Some(color) = self.color {
            note.color = color;
        }
        note.created_by = Some(actor.user_id.clone());
        let value = serde_json::to_value(&note)?;
        board.sticky_notes.push(note);
        Ok(value)
    }
}

/// Edit, move or recolor a note. Unset fields are left alone.
#[derive(Debug, Deserialize)]
pub struct UpdateStickyNote {
    pub board: BoardId,
    pub note: StickyNoteId,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub position: Option<NotePosition>,
    #[serde(default)]
    pub color: Option<NoteColor>,
    /// Advance to the next color in the palette
    #[serde(default)]
    pub cycle_color: bool,
}

impl UpdateStickyNote {
    pub fn new(board: impl Into<BoardId>, note: impl Into<StickyNoteId>) -> Self {
        Self {
            board: board.into(),
            note: note.into(),
            content: None,
            position: None,
            color: None,
            cycle_color: false,
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn with_position(mut self, x: f64, y: f64) -> Self {
        self.position = Some(NotePosition { x, y });
        self
    }

    pub fn cycle_color(mut self) -> Self {
        self.cycle_color = true;
        self
    }
}

impl BoardCommand for UpdateStickyNote {
    fn op(&self) -> &'static str {
        "update sticky note"
    }

    fn board_id(&self) -> &BoardId {
        &self.board
    }

    fn action(&self) -> Action {
        Action::EditContent
    }

    fn apply(&self, board: &mut Board, _actor: &UserProfile) -> Result<Value> {
        let note = note_mut(board, &self.note)?;
        if let Some(content) = &self.content {
            note.content = content.clone();
        }
        if let Some(position) = self.position {
            note.position = position;
        }
        if let Some(color) = self.color {
            note.color = color;
        } else if self.cycle_color {
            note.color = note.color.next();
        }
        Ok(serde_json::to_value(&*note)?)
    }
}

#[derive(Debug, Deserialize)]
pub struct DeleteStickyNote {
    pub board: BoardId,
    pub note: StickyNoteId,
}

impl DeleteStickyNote {
    pub fn new(board: impl Into<BoardId>, note: impl Into<StickyNoteId>) -> Self {
        Self {
            board: board.into(),
            note: note.into(),
        }
    }
}

impl BoardCommand for DeleteStickyNote {
    fn op(&self) -> &'static str {
        "delete sticky note"
    }

    fn board_id(&self) -> &BoardId {
        &self.board
    }

    fn action(&self) -> Action {
        Action::EditContent
    }

    fn apply(&self, board: &mut Board, _actor: &UserProfile) -> Result<Value> {
        note_mut(board, &self.note)?;
        board.sticky_notes.retain(|n| n.id != self.note);
        Ok(json!({ "deleted": true, "id": self.note }))
    }
}

impl_execute!(AddStickyNote, UpdateStickyNote, DeleteStickyNote);

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::super::Execute;
    use super::*;
    use crate::store::BoardStore;

    #[tokio::test]
    async fn test_add_note_defaults() {
        let (_temp, store, ctx) = setup().await;
        let result = AddStickyNote::new("b1", 40.0, 80.0)
            .execute(&ctx)
            .await
            .unwrap();
        assert_eq!(result["content"], DEFAULT_NOTE_CONTENT);
        assert_eq!(result["color"], "yellow");
        assert_eq!(result["position"]["x"], 40.0);

        let board = store.get_board(&BoardId::from("b1")).await.unwrap();
        assert_eq!(board.sticky_notes.len(), 1);
    }

    #[tokio::test]
    async fn test_update_note() {
        let (_temp, store, ctx) = setup().await;
        let result = AddStickyNote::new("b1", 0.0, 0.0)
            .with_content("remember")
            .execute(&ctx)
            .await
            .unwrap();
        let id = result["id"].as_str().unwrap().to_string();

        let result = UpdateStickyNote::new("b1", id.as_str())
            .with_position(10.0, 20.0)
            .cycle_color()
            .execute(&ctx)
            .await
            .unwrap();
        assert_eq!(result["color"], "green");
        assert_eq!(result["content"], "remember");

        let board = store.get_board(&BoardId::from("b1")).await.unwrap();
        assert_eq!(board.sticky_notes[0].position, NotePosition { x: 10.0, y: 20.0 });
    }

    #[tokio::test]
    async fn test_delete_note() {
        let (_temp, store, ctx) = setup().await;
        let result = AddStickyNote::new("b1", 0.0, 0.0)
            .with_color(NoteColor::Pink)
            .execute(&ctx)
            .await
            .unwrap();
        let id = result["id"].as_str().unwrap().to_string();

        DeleteStickyNote::new("b1", id.as_str()).execute(&ctx).await.unwrap();
        let board = store.get_board(&BoardId::from("b1")).await.unwrap();
        assert!(board.sticky_notes.is_empty());

        let err = DeleteStickyNote::new("b1", id.as_str())
            .execute(&ctx)
            .await
            .unwrap_err();
        assert!(matches!(err, BoardError::NotFound { .. }));
    }
}
