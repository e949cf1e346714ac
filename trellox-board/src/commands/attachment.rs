//! Attachment commands

use super::{impl_execute, required_text, BoardCommand};
use crate::error::{BoardError, Result};
use crate::types::{Action, Attachment, AttachmentId, Board, BoardId, CardId, UserProfile};
use serde::Deserialize;
use serde_json::{json, Value};

/// Link a file to a card by URL
#[derive(Debug, Deserialize)]
pub struct AddAttachment {
    pub board: BoardId,
    pub card: CardId,
    pub url: String,
    /// Display name; the last path segment of the URL when omitted
    #[serde(default)]
    pub name: Option<String>,
}

impl AddAttachment {
    pub fn new(board: impl Into<BoardId>, card: impl Into<CardId>, url: impl Into<String>) -> Self {
        Self {
            board: board.into(),
            card: card.into(),
            url: url.into(),
            name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

fn name_from_url(url: &str) -> &str {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    path.trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty())
        .unwrap_or("Unnamed attachment")
}

impl BoardCommand for AddAttachment {
    fn op(&self) -> &'static str {
        "add attachment"
    }

    fn board_id(&self) -> &BoardId {
        &self.board
    }

    fn action(&self) -> Action {
        Action::EditContent
    }

    fn apply(&self, board: &mut Board, actor: &UserProfile) -> Result<Value> {
        let url = required_text("attachment url", &self.url)?;
        let name = self
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| name_from_url(&url))
            .to_string();

        let mut attachment = Attachment::new(name, url.clone());
        attachment.uploaded_by = Some(actor.user_id.clone());
        let card = board.card_mut(&self.card)?;
        let value = serde_json::to_value(&attachment)?;
        card.attachments.push(attachment);
        Ok(value)
    }
}

#[derive(Debug, Deserialize)]
pub struct RemoveAttachment {
    pub board: BoardId,
    pub card: CardId,
    pub attachment: AttachmentId,
}

impl RemoveAttachment {
    pub fn new(
        board: impl Into<BoardId>,
        card: impl Into<CardId>,
        attachment: impl Into<AttachmentId>,
    ) -> Self {
        Self {
            board: board.into(),
            card: card.into(),
            attachment: attachment.into(),
        }
    }
}

impl BoardCommand for RemoveAttachment {
    fn op(&self) -> &'static str {
        "remove attachment"
    }

    fn board_id(&self) -> &BoardId {
        &self.board
    }

    fn action(&self) -> Action {
        Action::EditContent
    }

    fn apply(&self, board: &mut Board, _actor: &UserProfile) -> Result<Value> {
        let card = board.card_mut(&self.card)?;
        let before = card.attachments.len();
        card.attachments.retain(|a| a.id != self.attachment);
        if card.attachments.len() == before {
            return Err(BoardError::not_found("attachment", self.attachment.as_str()));
        }
        Ok(json!({ "deleted": true, "id": self.attachment }))
    }
}

impl_execute!(AddAttachment, RemoveAttachment);

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::super::Execute;
    use super::*;
    use crate::store::BoardStore;

    #[test]
    fn test_name_from_url() {
        assert_eq!(name_from_url("https://x.example.com/files/plan.pdf?dl=1"), "plan.pdf");
        assert_eq!(name_from_url("https://x.example.com/files/"), "files");
        assert_eq!(name_from_url(""), "Unnamed attachment");
    }

    #[tokio::test]
    async fn test_add_and_remove_attachment() {
        let (_temp, store, ctx) = setup().await;
        let result = AddAttachment::new("b1", "c1", "https://files.example.com/spec.pdf")
            .execute(&ctx)
            .await
            .unwrap();
        assert_eq!(result["name"], "spec.pdf");
        assert_eq!(result["uploadedBy"], OWNER);

        let id = result["id"].as_str().unwrap().to_string();
        RemoveAttachment::new("b1", "c1", id.as_str())
            .execute(&ctx)
            .await
            .unwrap();
        let board = store.get_board(&BoardId::from("b1")).await.unwrap();
        assert!(board.card(&CardId::from("c1")).unwrap().attachments.is_empty());

        let err = RemoveAttachment::new("b1", "c1", id.as_str())
            .execute(&ctx)
            .await
            .unwrap_err();
        assert!(matches!(err, BoardError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_named_attachment() {
        let (_temp, _store, ctx) = setup().await;
        let result = AddAttachment::new("b1", "c1", "https://files.example.com/a1")
            .with_name("Mockups")
            .execute(&ctx)
            .await
            .unwrap();
        assert_eq!(result["name"], "Mockups");
    }
}
