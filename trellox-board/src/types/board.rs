//! Board types: Board, List, Background, StickyNote

use super::card::Card;
use super::ids::{BoardId, CardId, ListId, StickyNoteId, UserId};
use super::member::{Membership, Role};
use crate::error::{BoardError, Result};
use crate::reorder::{move_between, reorder_within};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Color used when a board has no background at all
pub const DEFAULT_BACKGROUND_COLOR: &str = "#0079BF";

/// The board aggregate: everything a viewer sees, saved as one document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Board {
    pub id: BoardId,
    pub title: String,
    #[serde(default)]
    pub lists: Vec<List>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<Background>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<UserId>,
    /// Every user with access; queried by membership
    #[serde(default)]
    pub members: BTreeSet<UserId>,
    #[serde(default)]
    pub board_members: Vec<Membership>,
    #[serde(default)]
    pub sticky_notes: Vec<StickyNote>,
    /// Optimistic concurrency token, bumped on every save
    #[serde(default)]
    pub revision: u64,
}

impl Board {
    /// Create an empty board owned by `owner`
    pub fn new(title: impl Into<String>, owner: Membership) -> Self {
        let mut board = Self {
            id: BoardId::new(),
            title: title.into(),
            lists: Vec::new(),
            background: None,
            created_at: Utc::now(),
            created_by: Some(owner.user_id.clone()),
            members: BTreeSet::new(),
            board_members: vec![owner],
            sticky_notes: Vec::new(),
            revision: 0,
        };
        board.ensure_membership_invariants();
        board
    }

    pub fn with_id(mut self, id: impl Into<BoardId>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_background(mut self, background: Background) -> Self {
        self.background = Some(background);
        self
    }

    pub fn with_lists(mut self, lists: Vec<List>) -> Self {
        self.lists = lists;
        self
    }

    /// Background to display, falling back to the default color
    pub fn effective_background(&self) -> Background {
        self.background.clone().unwrap_or_default()
    }

    // =========================================================================
    // Membership
    // =========================================================================

    /// The role `user` holds on this board, if any.
    ///
    /// The creator is always the owner. Users listed in `members` without a
    /// membership record predate role tracking and count as members.
    pub fn role_of(&self, user: &UserId) -> Option<Role> {
        if self.created_by.as_ref() == Some(user) {
            return Some(Role::Owner);
        }
        if let Some(record) = self.membership(user) {
            return Some(record.role);
        }
        self.members.contains(user).then_some(Role::Member)
    }

    pub fn membership(&self, user: &UserId) -> Option<&Membership> {
        self.board_members.iter().find(|m| &m.user_id == user)
    }

    pub fn membership_mut(&mut self, user: &UserId) -> Option<&mut Membership> {
        self.board_members.iter_mut().find(|m| &m.user_id == user)
    }

    /// Restore the membership invariants: the member set covers the creator
    /// and every membership record, the creator is the single owner, and
    /// each user has at most one record.
    pub fn ensure_membership_invariants(&mut self) {
        let mut seen = BTreeSet::new();
        self.board_members
            .retain(|record| seen.insert(record.user_id.clone()));

        for record in &mut self.board_members {
            let is_creator = self.created_by.as_ref() == Some(&record.user_id);
            if is_creator {
                record.role = Role::Owner;
            } else if record.role == Role::Owner {
                record.role = Role::Admin;
            }
            self.members.insert(record.user_id.clone());
        }

        if let Some(creator) = &self.created_by {
            self.members.insert(creator.clone());
        }
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    pub fn list_index(&self, id: &ListId) -> Result<usize> {
        self.lists
            .iter()
            .position(|l| &l.id == id)
            .ok_or_else(|| BoardError::ListNotFound { id: id.to_string() })
    }

    pub fn list(&self, id: &ListId) -> Result<&List> {
        let index = self.list_index(id)?;
        Ok(&self.lists[index])
    }

    pub fn list_mut(&mut self, id: &ListId) -> Result<&mut List> {
        let index = self.list_index(id)?;
        Ok(&mut self.lists[index])
    }

    /// Locate a card as (list index, card index)
    pub fn find_card(&self, id: &CardId) -> Option<(usize, usize)> {
        self.lists.iter().enumerate().find_map(|(li, list)| {
            list.cards
                .iter()
                .position(|c| &c.id == id)
                .map(|ci| (li, ci))
        })
    }

    pub fn card(&self, id: &CardId) -> Result<&Card> {
        let (li, ci) = self
            .find_card(id)
            .ok_or_else(|| BoardError::CardNotFound { id: id.to_string() })?;
        Ok(&self.lists[li].cards[ci])
    }

    pub fn card_mut(&mut self, id: &CardId) -> Result<&mut Card> {
        let (li, ci) = self
            .find_card(id)
            .ok_or_else(|| BoardError::CardNotFound { id: id.to_string() })?;
        Ok(&mut self.lists[li].cards[ci])
    }

    pub fn card_count(&self) -> usize {
        self.lists.iter().map(|l| l.cards.len()).sum()
    }

    // =========================================================================
    // Reordering
    // =========================================================================

    /// Move a list to a new position on the board
    pub fn move_list(&mut self, from: usize, to: usize) -> Result<()> {
        self.lists = reorder_within(&self.lists, from, to)?;
        Ok(())
    }

    /// Move a card within a list or between lists.
    ///
    /// When both list ids name the same list this is a plain reorder and
    /// `to_index` must be a valid index. Across lists `to_index` is clamped
    /// to the destination length.
    pub fn move_card(
        &mut self,
        from_list: &ListId,
        from_index: usize,
        to_list: &ListId,
        to_index: usize,
    ) -> Result<()> {
        let source = self.list_index(from_list)?;

        if from_list == to_list {
            let list = &mut self.lists[source];
            list.cards = reorder_within(&list.cards, from_index, to_index)?;
            return Ok(());
        }

        let dest = self.list_index(to_list)?;
        let (new_source, new_dest) = move_between(
            &self.lists[source].cards,
            &self.lists[dest].cards,
            from_index,
            to_index,
        )?;
        self.lists[source].cards = new_source;
        self.lists[dest].cards = new_dest;
        Ok(())
    }
}

/// An ordered column of cards
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct List {
    pub id: ListId,
    pub title: String,
    #[serde(default)]
    pub cards: Vec<Card>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<UserId>,
}

impl List {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: ListId::new(),
            title: title.into(),
            cards: Vec::new(),
            created_at: Utc::now(),
            created_by: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<ListId>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_cards(mut self, cards: Vec<Card>) -> Self {
        self.cards = cards;
        self
    }

    pub fn with_created_by(mut self, user: impl Into<UserId>) -> Self {
        self.created_by = Some(user.into());
        self
    }

    pub fn card_index(&self, id: &CardId) -> Option<usize> {
        self.cards.iter().position(|c| &c.id == id)
    }
}

/// Board background
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Background {
    Color { color: String },
    Gradient { top: String, bottom: String },
    Image { url: String },
}

impl Background {
    pub fn color(color: impl Into<String>) -> Self {
        Background::Color {
            color: color.into(),
        }
    }

    pub fn image(url: impl Into<String>) -> Self {
        Background::Image { url: url.into() }
    }

    /// CSS value for the background
    pub fn css(&self) -> String {
        match self {
            Background::Color { color } => color.clone(),
            Background::Gradient { top, bottom } => {
                format!("linear-gradient(to bottom, {top}, {bottom})")
            }
            Background::Image { url } => format!("url({url})"),
        }
    }
}

impl Default for Background {
    fn default() -> Self {
        Background::color(DEFAULT_BACKGROUND_COLOR)
    }
}

/// Sticky note palette, cycled in this order
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteColor {
    #[default]
    Yellow,
    Green,
    Blue,
    Pink,
}

impl NoteColor {
    pub fn next(self) -> Self {
        match self {
            NoteColor::Yellow => NoteColor::Green,
            NoteColor::Green => NoteColor::Blue,
            NoteColor::Blue => NoteColor::Pink,
            NoteColor::Pink => NoteColor::Yellow,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NotePosition {
    pub x: f64,
    pub y: f64,
}

/// A note pinned to the board canvas at 2D coordinates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StickyNote {
    pub id: StickyNoteId,
    pub content: String,
    #[serde(default)]
    pub color: NoteColor,
    #[serde(default)]
    pub position: NotePosition,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<UserId>,
}

impl StickyNote {
    pub fn new(content: impl Into<String>, x: f64, y: f64) -> Self {
        Self {
            id: StickyNoteId::new(),
            content: content.into(),
            color: NoteColor::default(),
            position: NotePosition { x, y },
            created_at: Utc::now(),
            created_by: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owner() -> Membership {
        Membership::new("owner", "owner@example.com", Role::Owner)
    }

    fn board_with_cards() -> Board {
        let l1 = List::new("L1").with_id("l1").with_cards(vec![
            Card::new("C1").with_id("c1"),
            Card::new("C2").with_id("c2"),
        ]);
        let l2 = List::new("L2")
            .with_id("l2")
            .with_cards(vec![Card::new("C3").with_id("c3")]);
        Board::new("Test", owner()).with_lists(vec![l1, l2])
    }

    fn card_ids(list: &List) -> Vec<&str> {
        list.cards.iter().map(|c| c.id.as_str()).collect()
    }

    #[test]
    fn test_new_board_membership() {
        let board = Board::new("Test", owner());
        let creator = UserId::from("owner");
        assert!(board.members.contains(&creator));
        assert_eq!(board.role_of(&creator), Some(Role::Owner));
        assert_eq!(board.role_of(&UserId::from("stranger")), None);
    }

    #[test]
    fn test_invariants_demote_extra_owner() {
        let mut board = Board::new("Test", owner());
        board
            .board_members
            .push(Membership::new("u2", "b@example.com", Role::Owner));
        board
            .board_members
            .push(Membership::new("u2", "dup@example.com", Role::Viewer));
        board.ensure_membership_invariants();

        let u2 = UserId::from("u2");
        assert_eq!(board.role_of(&u2), Some(Role::Admin));
        assert!(board.members.contains(&u2));
        assert_eq!(board.board_members.len(), 2);
    }

    #[test]
    fn test_legacy_member_without_record() {
        let mut board = Board::new("Test", owner());
        board.members.insert(UserId::from("legacy"));
        assert_eq!(board.role_of(&UserId::from("legacy")), Some(Role::Member));
    }

    #[test]
    fn test_move_card_between_lists() {
        let mut board = board_with_cards();
        board
            .move_card(&"l1".into(), 0, &"l2".into(), 1)
            .unwrap();
        assert_eq!(card_ids(&board.lists[0]), vec!["c2"]);
        assert_eq!(card_ids(&board.lists[1]), vec!["c3", "c1"]);
    }

    #[test]
    fn test_move_card_same_list_is_reorder() {
        let mut board = board_with_cards();
        board
            .move_card(&"l1".into(), 0, &"l1".into(), 1)
            .unwrap();
        assert_eq!(card_ids(&board.lists[0]), vec!["c2", "c1"]);

        let err = board
            .move_card(&"l1".into(), 0, &"l1".into(), 2)
            .unwrap_err();
        assert!(matches!(err, BoardError::IndexOutOfRange { index: 2, len: 2 }));
    }

    #[test]
    fn test_move_card_unknown_list() {
        let mut board = board_with_cards();
        let err = board
            .move_card(&"nope".into(), 0, &"l2".into(), 0)
            .unwrap_err();
        assert!(matches!(err, BoardError::ListNotFound { .. }));
    }

    #[test]
    fn test_move_list() {
        let mut board = board_with_cards();
        board.move_list(1, 0).unwrap();
        assert_eq!(board.lists[0].id.as_str(), "l2");
    }

    #[test]
    fn test_background_css() {
        let gradient = Background::Gradient {
            top: "#000".into(),
            bottom: "#fff".into(),
        };
        assert_eq!(gradient.css(), "linear-gradient(to bottom, #000, #fff)");
        assert_eq!(Background::default().css(), DEFAULT_BACKGROUND_COLOR);

        let json = serde_json::to_value(Background::image("https://x/y.jpg")).unwrap();
        assert_eq!(json["type"], "image");
        assert_eq!(json["url"], "https://x/y.jpg");
    }

    #[test]
    fn test_note_color_cycle() {
        let mut color = NoteColor::Yellow;
        for _ in 0..4 {
            color = color.next();
        }
        assert_eq!(color, NoteColor::Yellow);
    }
}
