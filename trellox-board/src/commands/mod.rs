//! Board commands
//!
//! Every mutation of a stored board is a command struct. Commands that edit an
//! existing board implement [`BoardCommand`] and run through
//! [`BoardContext::run`]: load, authorize, apply, save. A save that loses a
//! revision race is retried from a fresh load, so edits are re-applied on top
//! of whatever another writer saved.
//!
//! Commands that do not fit that shape (creating, listing and deleting boards)
//! implement [`Execute`] directly.

mod attachment;
mod board;
mod card;
mod checklist;
mod comment;
mod label;
mod list;
mod member;
mod sticky_note;

pub use attachment::{AddAttachment, RemoveAttachment};
pub use board::{
    background_upload_path, upload_background, CreateBoard, DeleteBoard, GetBoard, ListBoards,
    RenameBoard, SetBackground, DEFAULT_LIST_TITLES,
};
pub use card::{AddCard, DeleteCard, MoveCard, UpdateCard};
pub use checklist::{
    AddChecklist, AddChecklistItem, DeleteChecklistItem, MoveChecklistItem, ToggleChecklistItem,
};
pub use comment::AddComment;
pub use label::{AddLabel, RemoveLabel};
pub use list::{AddList, DeleteList, MoveList, RenameList};
pub use member::{AddMember, ChangeMemberRole, RemoveMember};
pub use sticky_note::{AddStickyNote, DeleteStickyNote, UpdateStickyNote};

use crate::error::{BoardError, Result};
use crate::notify::{InviteMailer, SharingInvite};
use crate::store::{BoardStore, UserDirectory};
use crate::sync::SubscriptionHub;
use crate::types::{Action, Board, BoardId, Role, UserProfile};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use trellox_config::SyncSettings;

const LOCK_BACKOFF: Duration = Duration::from_millis(20);

/// A command that edits one existing board
pub trait BoardCommand: Send + Sync {
    /// Short name used in logs
    fn op(&self) -> &'static str;

    fn board_id(&self) -> &BoardId;

    /// Minimum capability the actor needs on the board
    fn action(&self) -> Action;

    /// Extra checks beyond the role table, run before `apply`
    fn authorize(&self, _board: &Board, _actor: &UserProfile, _role: Role) -> Result<()> {
        Ok(())
    }

    /// Mutate the board and describe the result
    fn apply(&self, board: &mut Board, actor: &UserProfile) -> Result<Value>;

    /// Invite to send once the change is saved
    fn invite(&self, _board: &Board, _actor: &UserProfile) -> Option<SharingInvite> {
        None
    }
}

/// Run a command against a context
#[async_trait]
pub trait Execute: Send + Sync {
    async fn execute(&self, ctx: &BoardContext) -> Result<Value>;
}

/// Implement [`Execute`] for commands that go through [`BoardContext::run`]
macro_rules! impl_execute {
    ($($command:ty),+ $(,)?) => {
        $(
            #[async_trait::async_trait]
            impl $crate::commands::Execute for $command {
                async fn execute(
                    &self,
                    ctx: &$crate::commands::BoardContext,
                ) -> $crate::error::Result<serde_json::Value> {
                    ctx.run(self).await
                }
            }
        )+
    };
}
pub(crate) use impl_execute;

/// Everything a command needs: storage, the acting user and the side channels
/// a saved change fans out to
pub struct BoardContext {
    store: Arc<dyn BoardStore>,
    users: Arc<dyn UserDirectory>,
    mailer: Arc<InviteMailer>,
    actor: UserProfile,
    settings: SyncSettings,
    hub: Option<Arc<SubscriptionHub>>,
}

impl BoardContext {
    pub fn new(
        store: Arc<dyn BoardStore>,
        users: Arc<dyn UserDirectory>,
        mailer: Arc<InviteMailer>,
        actor: UserProfile,
    ) -> Self {
        Self {
            store,
            users,
            mailer,
            actor,
            settings: SyncSettings::default(),
            hub: None,
        }
    }

    pub fn with_settings(mut self, settings: SyncSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Publish every saved board to the subscribers of `hub`
    pub fn with_hub(mut self, hub: Arc<SubscriptionHub>) -> Self {
        self.hub = Some(hub);
        self
    }

    pub fn store(&self) -> &dyn BoardStore {
        self.store.as_ref()
    }

    pub fn users(&self) -> &dyn UserDirectory {
        self.users.as_ref()
    }

    pub fn actor(&self) -> &UserProfile {
        &self.actor
    }

    /// The actor's role on `board`, failing when it is not enough for `action`
    pub fn authorize(&self, board: &Board, action: Action) -> Result<Role> {
        let role = board.role_of(&self.actor.user_id).ok_or_else(|| {
            BoardError::permission_denied(self.actor.user_id.to_string(), action.to_string())
        })?;
        if !role.allows(action) {
            return Err(BoardError::permission_denied(
                self.actor.user_id.to_string(),
                action.to_string(),
            ));
        }
        Ok(role)
    }

    /// Load, authorize, apply and save, retrying lost revision races
    pub async fn run<C>(&self, command: &C) -> Result<Value>
    where
        C: BoardCommand + ?Sized,
    {
        let attempts = self.settings.max_save_attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.run_once(command).await {
                Err(e) if e.is_retryable() && attempt < attempts => {
                    debug!(
                        op = command.op(),
                        board = %command.board_id(),
                        attempt,
                        "retrying after {}",
                        e
                    );
                    if matches!(e, BoardError::LockBusy) {
                        tokio::time::sleep(LOCK_BACKOFF * attempt).await;
                    }
                    attempt += 1;
                }
                Err(e) => {
                    if !e.is_user_facing() {
                        warn!(
                            op = command.op(),
                            board = %command.board_id(),
                            "command failed: {}",
                            e
                        );
                    }
                    return Err(e);
                }
                ok => return ok,
            }
        }
    }

    async fn run_once<C>(&self, command: &C) -> Result<Value>
    where
        C: BoardCommand + ?Sized,
    {
        let mut board = self.store.get_board(command.board_id()).await?;
        let role = self.authorize(&board, command.action())?;
        command.authorize(&board, &self.actor, role)?;

        let result = command.apply(&mut board, &self.actor)?;
        board.ensure_membership_invariants();
        let saved = self.store.save_board(&board).await?;
        debug!(
            op = command.op(),
            board = %saved.id,
            revision = saved.revision,
            "board saved"
        );

        if let Some(invite) = command.invite(&saved, &self.actor) {
            self.mailer.notify(&invite).await;
        }
        self.publish(saved);
        Ok(result)
    }

    pub(crate) fn publish(&self, board: Board) {
        if let Some(hub) = &self.hub {
            hub.publish(board);
        }
    }
}

/// Reject blank user-entered text, returning it trimmed
pub(crate) fn required_text(field: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(BoardError::invalid_operation(format!(
            "{field} must not be empty"
        )));
    }
    Ok(trimmed.to_string())
}
