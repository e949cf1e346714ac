//! Core types for the board engine

mod board;
mod card;
mod ids;
mod member;
mod presence;

pub use board::{
    Background, Board, List, NoteColor, NotePosition, StickyNote, DEFAULT_BACKGROUND_COLOR,
};
pub use card::{
    Attachment, Card, Checklist, ChecklistItem, ChecklistState, Comment, Label, LabelColor,
};
pub use ids::{
    AttachmentId, BoardId, CardId, ChecklistId, ChecklistItemId, CommentId, LabelId, ListId,
    StickyNoteId, UserId,
};
pub use member::{Action, Membership, Role};
pub use presence::{UserPresence, UserProfile};
