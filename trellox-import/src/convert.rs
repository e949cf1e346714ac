//! Trello records to TrelloX boards
//!
//! Lists and cards keep the source order given by `pos`. Card details are
//! fetched per card with bounded concurrency; a failed fetch leaves that one
//! field empty and a card that cannot be converted becomes a placeholder.

use crate::background::resolve_background;
use crate::error::{ImportError, Result};
use crate::source::ImportSource;
use crate::types::{
    TrelloAttachment, TrelloBoard, TrelloCard, TrelloCheckItem, TrelloChecklist, TrelloComment,
    TrelloLabel, TrelloList,
};
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use tracing::{debug, warn};
use trellox_board::reorder::renumber;
use trellox_board::sanitize::{sanitize_board, RawValue};
use trellox_board::types::{
    Attachment, Board, BoardId, Card, CardId, Checklist, ChecklistItem, ChecklistState, Comment,
    Label, LabelColor, List, ListId, Membership, Role, UserProfile,
};
use trellox_config::ImportSettings;

const UNKNOWN_AUTHOR: &str = "Unknown";
const UNKNOWN_AUTHOR_ID: &str = "unknown";
const UNNAMED_ATTACHMENT: &str = "Unnamed attachment";

/// Source id when present, otherwise a fresh one
fn id_or_new<I: From<String> + Default>(raw: &str) -> I {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        I::default()
    } else {
        I::from(trimmed.to_string())
    }
}

fn timestamp(raw: Option<&str>) -> Option<DateTime<Utc>> {
    raw.and_then(|s| DateTime::parse_from_rfc3339(s.trim()).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Stable sort by the source's fractional position
fn by_pos<T>(items: &mut [T], pos: impl Fn(&T) -> f64) {
    items.sort_by(|a, b| pos(a).total_cmp(&pos(b)));
}

fn label(label: &TrelloLabel) -> Label {
    Label {
        id: id_or_new(&label.id),
        text: label.name.clone(),
        color: LabelColor::from_external(&label.color),
    }
}

fn comment(comment: &TrelloComment) -> Comment {
    let creator = comment.member_creator.as_ref();
    let author = creator
        .and_then(|m| non_blank(m.full_name.as_deref()).or(non_blank(m.username.as_deref())))
        .unwrap_or(UNKNOWN_AUTHOR);
    let author_id = creator
        .and_then(|m| non_blank(m.username.as_deref()))
        .unwrap_or(UNKNOWN_AUTHOR_ID);

    let mut converted = Comment::new(
        comment.data.text.clone().unwrap_or_default(),
        author,
        author_id,
    );
    converted.id = id_or_new(&comment.id);
    if let Some(created_at) = timestamp(comment.date.as_deref()) {
        converted.created_at = created_at;
    }
    converted
}

fn attachment(attachment: &TrelloAttachment, owner: &UserProfile) -> Attachment {
    let mut converted = Attachment::new(
        non_blank(attachment.name.as_deref()).unwrap_or(UNNAMED_ATTACHMENT),
        attachment.url.clone().unwrap_or_default(),
    );
    converted.id = id_or_new(&attachment.id);
    converted.uploaded_by = Some(owner.user_id.clone());
    if let Some(created_at) = timestamp(attachment.date.as_deref()) {
        converted.created_at = created_at;
    }
    converted
}

fn checklist_item(item: &TrelloCheckItem) -> ChecklistItem {
    let mut converted = ChecklistItem::new(item.name.clone());
    converted.id = id_or_new(&item.id);
    converted.state = if item.state.eq_ignore_ascii_case("complete") {
        ChecklistState::Complete
    } else {
        ChecklistState::Incomplete
    };
    converted
}

/// Checklists and their items in source order, renumbered `0..n`
fn checklists(mut source: Vec<TrelloChecklist>) -> Vec<Checklist> {
    by_pos(&mut source, |c| c.pos);
    let mut converted: Vec<Checklist> = source
        .into_iter()
        .map(|mut checklist| {
            by_pos(&mut checklist.check_items, |i| i.pos);
            let mut items: Vec<ChecklistItem> =
                checklist.check_items.iter().map(checklist_item).collect();
            renumber(&mut items);
            Checklist {
                id: id_or_new(&checklist.id),
                title: checklist.name,
                items,
                pos: 0,
            }
        })
        .collect();
    renumber(&mut converted);
    converted
}

/// Per-card resources fetched alongside the card itself
#[derive(Debug, Default)]
struct CardDetails {
    comments: Vec<TrelloComment>,
    attachments: Vec<TrelloAttachment>,
    checklists: Vec<TrelloChecklist>,
}

fn or_empty<T>(result: Result<Vec<T>>, what: &str, card: &str) -> Vec<T> {
    result.unwrap_or_else(|e| {
        warn!("could not fetch {} for card {}: {}", what, card, e);
        Vec::new()
    })
}

/// Converts one Trello board at a time
pub struct BoardConverter<'a> {
    source: &'a dyn ImportSource,
    owner: &'a UserProfile,
    concurrency: usize,
    backgrounds_base: &'a str,
}

impl<'a> BoardConverter<'a> {
    pub fn new(
        source: &'a dyn ImportSource,
        owner: &'a UserProfile,
        settings: &'a ImportSettings,
    ) -> Self {
        Self {
            source,
            owner,
            concurrency: settings.max_concurrent_requests.max(1),
            backgrounds_base: &settings.backgrounds_base_url,
        }
    }

    /// Build the board, fetching card details from the source, and run the
    /// result through the sanitizer
    pub async fn convert(
        &self,
        board: &TrelloBoard,
        mut lists: Vec<TrelloList>,
        mut cards: Vec<TrelloCard>,
    ) -> Result<Board> {
        by_pos(&mut lists, |l| l.pos);
        by_pos(&mut cards, |c| c.pos);

        let mut converted_lists = Vec::with_capacity(lists.len());
        let mut placed = 0;
        for list in &lists {
            let list_cards: Vec<&TrelloCard> =
                cards.iter().filter(|c| c.id_list == list.id).collect();
            placed += list_cards.len();

            let converted: Vec<Card> = stream::iter(list_cards)
                .map(|card| self.convert_card(card))
                .buffered(self.concurrency)
                .collect()
                .await;

            converted_lists.push(
                List::new(list.name.clone())
                    .with_id(id_or_new::<ListId>(&list.id))
                    .with_cards(converted)
                    .with_created_by(self.owner.user_id.clone()),
            );
        }
        if placed < cards.len() {
            debug!(
                "{} cards on board {} belong to no fetched list",
                cards.len() - placed,
                board.id
            );
        }

        let owner = Membership::new(
            self.owner.user_id.clone(),
            self.owner.email.clone(),
            Role::Owner,
        );
        let owner = match &self.owner.display_name {
            Some(name) => owner.with_display_name(name.clone()),
            None => owner,
        };

        let converted = Board::new(board.name.clone(), owner)
            .with_id(id_or_new::<BoardId>(&board.id))
            .with_background(resolve_background(
                &board.prefs,
                &board.url,
                self.backgrounds_base,
            ))
            .with_lists(converted_lists);

        let raw = RawValue::from(serde_json::to_value(&converted)?);
        Ok(sanitize_board(&raw))
    }

    async fn convert_card(&self, card: &TrelloCard) -> Card {
        let details = self.fetch_details(card).await;
        match self.build_card(card, details) {
            Ok(converted) => converted,
            Err(e) => {
                warn!("could not convert card {}: {}", card.id, e);
                let id: CardId = id_or_new(&card.id);
                Card::placeholder(id, &card.name).with_created_by(self.owner.user_id.clone())
            }
        }
    }

    async fn fetch_details(&self, card: &TrelloCard) -> CardDetails {
        if card.id.trim().is_empty() {
            return CardDetails::default();
        }
        let (comments, attachments, checklists) = futures::join!(
            self.source.comments(&card.id),
            self.source.attachments(&card.id),
            self.source.checklists(&card.id),
        );
        CardDetails {
            comments: or_empty(comments, "comments", &card.id),
            attachments: or_empty(attachments, "attachments", &card.id),
            checklists: or_empty(checklists, "checklists", &card.id),
        }
    }

    fn build_card(&self, card: &TrelloCard, details: CardDetails) -> Result<Card> {
        if card.id.trim().is_empty() {
            return Err(ImportError::invalid_record("card", "missing id"));
        }

        let mut converted = Card::new(card.name.clone())
            .with_id(card.id.trim())
            .with_created_by(self.owner.user_id.clone());
        if !card.desc.trim().is_empty() {
            converted = converted.with_description(card.desc.clone());
        }
        converted.labels = card.labels.iter().map(label).collect();
        converted.due_date = timestamp(card.due.as_deref());
        converted.assigned_to = card
            .id_members
            .iter()
            .filter(|m| !m.trim().is_empty())
            .map(|m| m.as_str().into())
            .collect();
        converted.comments = details.comments.iter().map(comment).collect();
        converted.attachments = details
            .attachments
            .iter()
            .map(|a| attachment(a, self.owner))
            .collect();
        converted.checklists = checklists(details.checklists);
        Ok(converted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CommentData, MemberCreator};

    #[test]
    fn test_comment_author_fallbacks() {
        let full = TrelloComment {
            id: "a1".into(),
            data: CommentData {
                text: Some("hi".into()),
            },
            date: Some("2024-01-02T03:04:05.000Z".into()),
            member_creator: Some(MemberCreator {
                full_name: Some("Ann Lee".into()),
                username: Some("ann".into()),
            }),
        };
        let converted = comment(&full);
        assert_eq!(converted.author, "Ann Lee");
        assert_eq!(converted.author_id.as_str(), "ann");
        assert_eq!(converted.created_at.to_rfc3339(), "2024-01-02T03:04:05+00:00");

        let anonymous = comment(&TrelloComment::default());
        assert_eq!(anonymous.text, "");
        assert_eq!(anonymous.author, UNKNOWN_AUTHOR);
        assert_eq!(anonymous.author_id.as_str(), UNKNOWN_AUTHOR_ID);
        assert!(!anonymous.id.is_empty());

        let username_only = comment(&TrelloComment {
            member_creator: Some(MemberCreator {
                full_name: None,
                username: Some("bo".into()),
            }),
            ..TrelloComment::default()
        });
        assert_eq!(username_only.author, "bo");
    }

    #[test]
    fn test_attachment_defaults() {
        let owner = UserProfile::new("u1", "u1@example.com");
        let converted = attachment(&TrelloAttachment::default(), &owner);
        assert_eq!(converted.name, UNNAMED_ATTACHMENT);
        assert_eq!(converted.url, "");
        assert_eq!(converted.uploaded_by.as_ref().map(|u| u.as_str()), Some("u1"));
    }

    #[test]
    fn test_checklists_sorted_and_renumbered() {
        let item = |id: &str, pos: f64, state: &str| TrelloCheckItem {
            id: id.into(),
            name: id.into(),
            state: state.into(),
            pos,
        };
        let source = vec![
            TrelloChecklist {
                id: "second".into(),
                name: "Second".into(),
                pos: 65536.0,
                check_items: vec![],
            },
            TrelloChecklist {
                id: "first".into(),
                name: "First".into(),
                pos: 16384.5,
                check_items: vec![
                    item("c", 300.0, "incomplete"),
                    item("a", 100.0, "complete"),
                    item("b", 200.0, "weird"),
                ],
            },
        ];

        let converted = checklists(source);
        assert_eq!(converted[0].id.as_str(), "first");
        assert_eq!(converted[1].pos, 1);
        let names: Vec<&str> = converted[0].items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        let positions: Vec<u32> = converted[0].items.iter().map(|i| i.pos).collect();
        assert_eq!(positions, vec![0, 1, 2]);
        assert_eq!(converted[0].items[0].state, ChecklistState::Complete);
        assert_eq!(converted[0].items[1].state, ChecklistState::Incomplete);
    }

    #[test]
    fn test_by_pos_is_stable() {
        let mut items = vec![(1.0, "x"), (0.5, "y"), (1.0, "z")];
        by_pos(&mut items, |i| i.0);
        let order: Vec<&str> = items.iter().map(|i| i.1).collect();
        assert_eq!(order, vec!["y", "x", "z"]);
    }

    #[test]
    fn test_label_conversion() {
        let converted = label(&TrelloLabel {
            id: "".into(),
            name: "urgent".into(),
            color: "sky".into(),
        });
        assert_eq!(converted.color, LabelColor::Blue);
        assert!(!converted.id.is_empty());
    }

    /// Serves no card details; detail fetches for `flaky` fail
    struct DetailSource {
        flaky: &'static str,
        fetched: std::sync::Mutex<Vec<String>>,
    }

    impl DetailSource {
        fn record(&self, card: &str) -> Result<()> {
            self.fetched.lock().unwrap().push(card.to_string());
            if card == self.flaky {
                return Err(ImportError::Network {
                    url: format!("/cards/{card}"),
                    message: "unavailable".into(),
                });
            }
            Ok(())
        }
    }

    #[async_trait::async_trait]
    impl ImportSource for DetailSource {
        async fn boards(&self) -> Result<Vec<TrelloBoard>> {
            Ok(Vec::new())
        }

        async fn board_detail(&self, board: &str) -> Result<TrelloBoard> {
            Err(ImportError::invalid_record("board", board))
        }

        async fn lists(&self, _board: &str) -> Result<Vec<TrelloList>> {
            Ok(Vec::new())
        }

        async fn cards(&self, _board: &str) -> Result<Vec<TrelloCard>> {
            Ok(Vec::new())
        }

        async fn comments(&self, card: &str) -> Result<Vec<TrelloComment>> {
            self.record(card)?;
            Ok(Vec::new())
        }

        async fn attachments(&self, card: &str) -> Result<Vec<TrelloAttachment>> {
            self.record(card)?;
            Ok(Vec::new())
        }

        async fn checklists(&self, card: &str) -> Result<Vec<TrelloChecklist>> {
            self.record(card)?;
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_card_without_id_becomes_placeholder() {
        let source = DetailSource {
            flaky: "c2",
            fetched: Default::default(),
        };
        let owner = UserProfile::new("u1", "u1@example.com");
        let settings = ImportSettings::default();
        let converter = BoardConverter::new(&source, &owner, &settings);

        let board = TrelloBoard {
            id: "b1".into(),
            name: "Roadmap".into(),
            ..TrelloBoard::default()
        };
        let lists = vec![TrelloList {
            id: "l1".into(),
            name: "Todo".into(),
            pos: 1.0,
            closed: false,
        }];
        let card = |id: &str, name: &str, pos: f64| TrelloCard {
            id: id.into(),
            name: name.into(),
            desc: "details".into(),
            id_list: "l1".into(),
            pos,
            labels: vec![TrelloLabel {
                id: "lb".into(),
                name: "urgent".into(),
                color: "red".into(),
            }],
            ..TrelloCard::default()
        };
        let cards = vec![card("c1", "First", 1.0), card("  ", "", 2.0), card("c2", "Third", 3.0)];

        let converted = converter.convert(&board, lists, cards).await.unwrap();
        let list = &converted.lists[0];
        assert_eq!(list.cards.len(), 3);

        let placeholder = &list.cards[1];
        assert_eq!(placeholder.content, "Unnamed Card");
        assert!(!placeholder.id.as_str().trim().is_empty());
        assert!(placeholder.labels.is_empty());
        assert!(placeholder.description.is_none());
        assert_eq!(placeholder.created_by, Some("u1".into()));

        // The neighbours convert normally, a failed detail fetch included
        assert_eq!(list.cards[0].id.as_str(), "c1");
        assert_eq!(list.cards[0].labels.len(), 1);
        assert_eq!(list.cards[2].content, "Third");
        assert!(list.cards[2].comments.is_empty());

        let fetched = source.fetched.lock().unwrap();
        assert!(fetched.iter().all(|c| c == "c1" || c == "c2"));
    }
}
