//! Field-level defaulting from plain JSON into the typed board model

use super::{sanitize_value, RawValue};
use crate::reorder::sort_by_pos;
use crate::types::{
    Attachment, Background, Board, Card, Checklist, ChecklistItem, ChecklistState, Comment,
    Label, LabelColor, List, Membership, NoteColor, NotePosition, Role, StickyNote, UserId,
};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

const UNTITLED_BOARD: &str = "Untitled Board";
const UNTITLED_LIST: &str = "Untitled List";
const UNTITLED_CARD: &str = "Untitled Card";
const UNTITLED_CHECKLIST: &str = "Untitled Checklist";
const UNTITLED_ITEM: &str = "Untitled Item";
const UNKNOWN_AUTHOR: &str = "Unknown";
const UNKNOWN_AUTHOR_ID: &str = "unknown";
const UNNAMED_ATTACHMENT: &str = "Unnamed attachment";
const NEW_STICKY_NOTE: &str = "New sticky note";

/// Sanitize a raw graph and parse it into a fully defaulted board
pub fn sanitize_board(raw: &RawValue) -> Board {
    normalize_board(&sanitize_value(raw))
}

/// Parse plain JSON into a board, defaulting every field that is absent or
/// malformed.
pub fn normalize_board(value: &Value) -> Board {
    let empty = Map::new();
    let obj = value.as_object().unwrap_or(&empty);

    let mut board = Board {
        id: id(obj, "id"),
        title: text_or(obj, "title", UNTITLED_BOARD),
        lists: objects(obj, "lists").map(list).collect(),
        background: background(obj),
        created_at: timestamp_or_now(obj, "createdAt"),
        created_by: user(obj, "createdBy"),
        members: array(obj, "members")
            .iter()
            .filter_map(non_blank)
            .map(UserId::from_string)
            .collect::<BTreeSet<_>>(),
        board_members: objects(obj, "boardMembers").filter_map(membership).collect(),
        sticky_notes: objects(obj, "stickyNotes").map(sticky_note).collect(),
        revision: obj.get("revision").and_then(Value::as_u64).unwrap_or(0),
    };
    board.ensure_membership_invariants();
    board
}

fn list(obj: &Map<String, Value>) -> List {
    List {
        id: id(obj, "id"),
        title: text_or(obj, "title", UNTITLED_LIST),
        cards: objects(obj, "cards").map(card).collect(),
        created_at: timestamp_or_now(obj, "createdAt"),
        created_by: user(obj, "createdBy"),
    }
}

fn card(obj: &Map<String, Value>) -> Card {
    let mut checklists: Vec<Checklist> = objects(obj, "checklists").map(checklist).collect();
    sort_by_pos(&mut checklists);

    Card {
        id: id(obj, "id"),
        content: text_or(obj, "content", UNTITLED_CARD),
        description: obj.get("description").and_then(Value::as_str).map(str::to_string),
        labels: objects(obj, "labels").map(label).collect(),
        comments: objects(obj, "comments").map(comment).collect(),
        attachments: objects(obj, "attachments").map(attachment).collect(),
        checklists,
        due_date: obj.get("dueDate").and_then(parse_timestamp),
        assigned_to: array(obj, "assignedTo")
            .iter()
            .filter_map(non_blank)
            .map(UserId::from_string)
            .collect(),
        created_at: timestamp_or_now(obj, "createdAt"),
        created_by: user(obj, "createdBy"),
    }
}

fn label(obj: &Map<String, Value>) -> Label {
    Label {
        id: id(obj, "id"),
        text: text_or(obj, "text", ""),
        color: obj
            .get("color")
            .and_then(Value::as_str)
            .and_then(LabelColor::parse)
            .unwrap_or_default(),
    }
}

fn comment(obj: &Map<String, Value>) -> Comment {
    Comment {
        id: id(obj, "id"),
        text: text_or(obj, "text", ""),
        created_at: timestamp_or_now(obj, "createdAt"),
        author: text_or(obj, "author", UNKNOWN_AUTHOR),
        author_id: UserId::from_string(text_or(obj, "authorId", UNKNOWN_AUTHOR_ID)),
    }
}

fn attachment(obj: &Map<String, Value>) -> Attachment {
    Attachment {
        id: id(obj, "id"),
        name: text_or(obj, "name", UNNAMED_ATTACHMENT),
        url: text_or(obj, "url", ""),
        created_at: timestamp_or_now(obj, "createdAt"),
        uploaded_by: user(obj, "uploadedBy"),
    }
}

fn checklist(obj: &Map<String, Value>) -> Checklist {
    let mut items: Vec<ChecklistItem> = objects(obj, "items").map(checklist_item).collect();
    sort_by_pos(&mut items);

    Checklist {
        id: id(obj, "id"),
        title: text_or(obj, "title", UNTITLED_CHECKLIST),
        items,
        pos: pos(obj),
    }
}

fn checklist_item(obj: &Map<String, Value>) -> ChecklistItem {
    let state = match obj.get("state").and_then(Value::as_str) {
        Some("complete") => ChecklistState::Complete,
        _ => ChecklistState::Incomplete,
    };
    ChecklistItem {
        id: id(obj, "id"),
        name: text_or(obj, "name", UNTITLED_ITEM),
        state,
        pos: pos(obj),
    }
}

/// Membership records without a user id are unusable and dropped
fn membership(obj: &Map<String, Value>) -> Option<Membership> {
    let user_id = obj.get("userId").and_then(non_blank)?;
    let role = obj
        .get("permission")
        .and_then(Value::as_str)
        .and_then(|s| s.parse::<Role>().ok())
        .unwrap_or(Role::Viewer);

    Some(Membership {
        user_id: UserId::from_string(user_id),
        email: text_or(obj, "email", ""),
        display_name: obj.get("displayName").and_then(non_blank),
        photo_url: obj.get("photoURL").and_then(non_blank),
        role,
        joined_at: timestamp_or_now(obj, "joinedAt"),
    })
}

fn sticky_note(obj: &Map<String, Value>) -> StickyNote {
    let position = obj
        .get("position")
        .and_then(Value::as_object)
        .map(|p| NotePosition {
            x: p.get("x").and_then(Value::as_f64).unwrap_or(0.0),
            y: p.get("y").and_then(Value::as_f64).unwrap_or(0.0),
        })
        .unwrap_or_default();

    StickyNote {
        id: id(obj, "id"),
        content: text_or(obj, "content", NEW_STICKY_NOTE),
        color: obj
            .get("color")
            .and_then(|c| serde_json::from_value::<NoteColor>(c.clone()).ok())
            .unwrap_or_default(),
        position,
        created_at: timestamp_or_now(obj, "createdAt"),
        created_by: user(obj, "createdBy"),
    }
}

/// Background from the current tagged form, or from the legacy
/// `backgroundImage` / `backgroundColor` fields.
fn background(obj: &Map<String, Value>) -> Option<Background> {
    if let Some(bg) = obj
        .get("background")
        .and_then(|v| serde_json::from_value::<Background>(v.clone()).ok())
    {
        return Some(bg);
    }

    if let Some(url) = obj.get("backgroundImage").and_then(non_blank) {
        return Some(Background::Image { url });
    }

    let color = obj.get("backgroundColor").and_then(non_blank)?;
    Some(parse_gradient(&color).unwrap_or(Background::Color { color }))
}

/// Parse `linear-gradient(to bottom, <top>, <bottom>)`
fn parse_gradient(css: &str) -> Option<Background> {
    let inner = css
        .trim()
        .strip_prefix("linear-gradient(")?
        .strip_suffix(')')?;
    let mut parts = inner.split(',').map(str::trim);
    if parts.next()? != "to bottom" {
        return None;
    }
    let top = parts.next()?.to_string();
    let bottom = parts.next()?.to_string();
    if parts.next().is_some() {
        return None;
    }
    Some(Background::Gradient { top, bottom })
}

// =============================================================================
// Field helpers
// =============================================================================

fn array<'a>(obj: &'a Map<String, Value>, key: &str) -> &'a [Value] {
    obj.get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// Object elements of an array field; non-object elements are skipped
fn objects<'a>(
    obj: &'a Map<String, Value>,
    key: &str,
) -> impl Iterator<Item = &'a Map<String, Value>> {
    array(obj, key).iter().filter_map(Value::as_object)
}

fn non_blank(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn text_or(obj: &Map<String, Value>, key: &str, default: &str) -> String {
    obj.get(key)
        .and_then(non_blank)
        .unwrap_or_else(|| default.to_string())
}

/// Existing id, or a freshly generated one
fn id<I: From<String> + Default>(obj: &Map<String, Value>, key: &str) -> I {
    obj.get(key)
        .and_then(non_blank)
        .map(I::from)
        .unwrap_or_default()
}

fn user(obj: &Map<String, Value>, key: &str) -> Option<UserId> {
    obj.get(key).and_then(non_blank).map(UserId::from_string)
}

fn pos(obj: &Map<String, Value>) -> u32 {
    obj.get("pos")
        .and_then(Value::as_f64)
        .filter(|p| p.is_finite() && *p >= 0.0)
        .map(|p| p.min(u32::MAX as f64) as u32)
        .unwrap_or(0)
}

fn timestamp_or_now(obj: &Map<String, Value>, key: &str) -> DateTime<Utc> {
    obj.get(key).and_then(parse_timestamp).unwrap_or_else(Utc::now)
}

/// Accept RFC 3339 strings, epoch milliseconds and `{seconds, nanoseconds}`
/// timestamp objects (with or without leading underscores).
pub fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s.trim())
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .and_then(DateTime::from_timestamp_millis),
        Value::Object(fields) => {
            let seconds = fields
                .get("seconds")
                .or_else(|| fields.get("_seconds"))
                .and_then(Value::as_i64)?;
            let nanos = fields
                .get("nanoseconds")
                .or_else(|| fields.get("_nanoseconds"))
                .and_then(Value::as_u64)
                .unwrap_or(0);
            DateTime::from_timestamp(seconds, u32::try_from(nanos).ok()?)
        }
        _ => None,
    }
}
