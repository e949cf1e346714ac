//! Card types: Card, Label, Comment, Attachment, Checklist

use super::ids::{AttachmentId, CardId, ChecklistId, ChecklistItemId, CommentId, LabelId, UserId};
use crate::reorder::Positioned;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A card within a list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: CardId,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub labels: Vec<Label>,
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    #[serde(default)]
    pub checklists: Vec<Checklist>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub assigned_to: Vec<UserId>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<UserId>,
}

impl Card {
    /// Create a new card with the given content
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            id: CardId::new(),
            content: content.into(),
            description: None,
            labels: Vec::new(),
            comments: Vec::new(),
            attachments: Vec::new(),
            checklists: Vec::new(),
            due_date: None,
            assigned_to: Vec::new(),
            created_at: Utc::now(),
            created_by: None,
        }
    }

    /// A card carrying only its title, used when its details could not be processed
    pub fn placeholder(id: impl Into<CardId>, name: &str) -> Self {
        let content = if name.trim().is_empty() {
            "Unnamed Card"
        } else {
            name
        };
        Self {
            id: id.into(),
            ..Self::new(content)
        }
    }

    pub fn with_id(mut self, id: impl Into<CardId>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_created_by(mut self, user: impl Into<UserId>) -> Self {
        self.created_by = Some(user.into());
        self
    }

    pub fn checklist_mut(&mut self, id: &ChecklistId) -> Option<&mut Checklist> {
        self.checklists.iter_mut().find(|c| &c.id == id)
    }
}

/// Label color palette
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelColor {
    Green,
    Yellow,
    Orange,
    Red,
    Purple,
    #[default]
    Blue,
}

impl LabelColor {
    /// Map a color name from an external palette onto ours
    pub fn from_external(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "green" | "lime" => LabelColor::Green,
            "yellow" => LabelColor::Yellow,
            "orange" => LabelColor::Orange,
            "red" => LabelColor::Red,
            "purple" | "pink" | "black" => LabelColor::Purple,
            _ => LabelColor::Blue,
        }
    }

    /// Parse one of our own color names
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "green" => Some(LabelColor::Green),
            "yellow" => Some(LabelColor::Yellow),
            "orange" => Some(LabelColor::Orange),
            "red" => Some(LabelColor::Red),
            "purple" => Some(LabelColor::Purple),
            "blue" => Some(LabelColor::Blue),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Label {
    pub id: LabelId,
    pub text: String,
    #[serde(default)]
    pub color: LabelColor,
}

impl Label {
    pub fn new(text: impl Into<String>, color: LabelColor) -> Self {
        Self {
            id: LabelId::new(),
            text: text.into(),
            color,
        }
    }
}

/// A comment on a card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: CommentId,
    pub text: String,
    pub created_at: DateTime<Utc>,
    /// Author display name
    pub author: String,
    pub author_id: UserId,
}

impl Comment {
    pub fn new(
        text: impl Into<String>,
        author: impl Into<String>,
        author_id: impl Into<UserId>,
    ) -> Self {
        Self {
            id: CommentId::new(),
            text: text.into(),
            created_at: Utc::now(),
            author: author.into(),
            author_id: author_id.into(),
        }
    }
}

/// A file linked to a card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub id: AttachmentId,
    pub name: String,
    pub url: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uploaded_by: Option<UserId>,
}

impl Attachment {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: AttachmentId::new(),
            name: name.into(),
            url: url.into(),
            created_at: Utc::now(),
            uploaded_by: None,
        }
    }
}

/// A named list of check items on a card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checklist {
    pub id: ChecklistId,
    pub title: String,
    #[serde(default)]
    pub items: Vec<ChecklistItem>,
    #[serde(default)]
    pub pos: u32,
}

impl Checklist {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: ChecklistId::new(),
            title: title.into(),
            items: Vec::new(),
            pos: 0,
        }
    }

    pub fn item_index(&self, id: &ChecklistItemId) -> Option<usize> {
        self.items.iter().position(|item| &item.id == id)
    }

    /// Count of completed items
    pub fn completed(&self) -> usize {
        self.items
            .iter()
            .filter(|item| item.state == ChecklistState::Complete)
            .count()
    }
}

impl Positioned for Checklist {
    fn pos(&self) -> u32 {
        self.pos
    }

    fn set_pos(&mut self, pos: u32) {
        self.pos = pos;
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChecklistState {
    Complete,
    #[default]
    Incomplete,
}

impl ChecklistState {
    pub fn toggled(self) -> Self {
        match self {
            ChecklistState::Complete => ChecklistState::Incomplete,
            ChecklistState::Incomplete => ChecklistState::Complete,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub id: ChecklistItemId,
    pub name: String,
    #[serde(default)]
    pub state: ChecklistState,
    #[serde(default)]
    pub pos: u32,
}

impl ChecklistItem {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: ChecklistItemId::new(),
            name: name.into(),
            state: ChecklistState::Incomplete,
            pos: 0,
        }
    }
}

impl Positioned for ChecklistItem {
    fn pos(&self) -> u32 {
        self.pos
    }

    fn set_pos(&mut self, pos: u32) {
        self.pos = pos;
    }
}
