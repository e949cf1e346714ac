//! Trello import for TrelloX boards
//!
//! Reads boards from the Trello REST API and turns them into sanitized
//! TrelloX boards, optionally saving them to a board store.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use trellox_board::store::FileStore;
//! use trellox_board::types::UserProfile;
//! use trellox_config::ImportSettings;
//! use trellox_import::{ImportPipeline, TrelloClient, TrelloCredentials};
//!
//! # async fn example() -> trellox_import::Result<()> {
//! let settings = ImportSettings::default();
//! let client = TrelloClient::new(&settings, TrelloCredentials::new("key", "token"))?;
//! let pipeline = ImportPipeline::new(Arc::new(client), settings, UserProfile::new("u1", "ann@example.com"))
//!     .with_store(Arc::new(FileStore::new(".trellox")));
//!
//! let boards = pipeline.list_boards().await?;
//! let report = pipeline.import(&boards).await?;
//! println!("imported {}, failed {:?}", report.imported.len(), report.failed);
//! # Ok(())
//! # }
//! ```
//!
//! Failures are contained as close to their source as possible: a missing
//! comment fetch empties that card's comments, a broken card becomes a
//! placeholder, and a broken board is reported by name while the others
//! import.

pub mod background;
pub mod client;
pub mod convert;
pub mod error;
pub mod pipeline;
pub mod probe;
pub mod source;
pub mod types;

pub use background::resolve_background;
pub use client::{TrelloClient, TrelloCredentials};
pub use convert::BoardConverter;
pub use error::{ImportError, Result};
pub use pipeline::{ImportPipeline, ImportReport};
pub use probe::ImageProbe;
pub use source::ImportSource;
