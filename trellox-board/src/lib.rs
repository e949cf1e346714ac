//! Collaborative board engine
//!
//! This crate holds the board aggregate (lists of cards with labels, comments,
//! attachments and checklists, plus sticky notes and memberships) and the
//! pieces that keep it consistent while several people edit it at once.
//!
//! ## Overview
//!
//! - **Reorder engine** - pure splices for drag-and-drop of lists and cards
//! - **Sanitizer** - turns arbitrary, possibly cyclic input into a storable board
//! - **Commands** - authorized, revision-checked edits of a stored board
//! - **Sessions** - presence and live subscriptions scoped to a signed-in user
//!
//! ## Basic Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use trellox_board::commands::{AddCard, BoardContext, CreateBoard, Execute};
//! use trellox_board::notify::InviteMailer;
//! use trellox_board::store::FileStore;
//! use trellox_board::types::UserProfile;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(FileStore::new("/path/to/.trellox"));
//! let ctx = BoardContext::new(
//!     store.clone(),
//!     store,
//!     Arc::new(InviteMailer::disabled()?),
//!     UserProfile::new("u1", "ann@example.com"),
//! );
//!
//! let board = CreateBoard::new("Launch").execute(&ctx).await?;
//! let todo = board["lists"][0]["id"].as_str().unwrap_or_default();
//! AddCard::new(board["id"].as_str().unwrap_or_default(), todo, "Write the announcement")
//!     .execute(&ctx)
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Storage Structure
//!
//! ```text
//! .trellox/
//! ├── boards/{id}.json             # Whole board document
//! ├── users/{id}.json              # User profile
//! ├── presence/{board}/{user}.json # Presence record
//! └── .lock                        # Writer lock
//! ```

pub mod commands;
pub mod error;
pub mod notify;
pub mod presence;
pub mod reorder;
pub mod sanitize;
pub mod session;
pub mod store;
pub mod sync;
pub mod types;

pub use commands::{BoardCommand, BoardContext, Execute};
pub use error::{BoardError, Result};
pub use sanitize::{normalize_board, sanitize_board, sanitize_value, RawValue};
pub use types::{Board, BoardId, Card, CardId, List, ListId, Role, UserId, UserProfile};
