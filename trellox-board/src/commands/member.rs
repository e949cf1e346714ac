//! Membership commands
//!
//! Admins manage viewers and members; only the owner hands out admin. Nobody
//! can be made owner, and the owner can be neither re-roled nor removed.

use super::{impl_execute, BoardCommand, BoardContext};
use crate::error::{BoardError, Result};
use crate::notify::SharingInvite;
use crate::types::{Action, Board, BoardId, Membership, Role, UserId, UserProfile};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

const EMAIL_LOOKUP_LIMIT: usize = 20;

fn target_role(board: &Board, user: &UserId) -> Result<Role> {
    board
        .role_of(user)
        .ok_or_else(|| BoardError::not_found("member", user.as_str()))
}

fn deny(actor: &UserProfile, action: String) -> BoardError {
    BoardError::permission_denied(actor.user_id.to_string(), action)
}

/// Share a board with a user
#[derive(Debug, Deserialize)]
pub struct AddMember {
    pub board: BoardId,
    pub user: UserProfile,
    pub role: Role,
}

impl AddMember {
    pub fn new(board: impl Into<BoardId>, user: UserProfile, role: Role) -> Self {
        Self {
            board: board.into(),
            user,
            role,
        }
    }

    /// Resolve `email` through the user directory. Only registered users can
    /// be added.
    pub async fn by_email(
        ctx: &BoardContext,
        board: impl Into<BoardId>,
        email: &str,
        role: Role,
    ) -> Result<Self> {
        let wanted = email.trim().to_lowercase();
        let user = ctx
            .users()
            .search_by_email_prefix(&wanted, EMAIL_LOOKUP_LIMIT)
            .await?
            .into_iter()
            .find(|profile| profile.email.to_lowercase() == wanted)
            .ok_or_else(|| BoardError::not_found("user", email.trim()))?;
        Ok(Self::new(board, user, role))
    }
}

impl BoardCommand for AddMember {
    fn op(&self) -> &'static str {
        "add member"
    }

    fn board_id(&self) -> &BoardId {
        &self.board
    }

    fn action(&self) -> Action {
        Action::ManageMembers
    }

    fn authorize(&self, _board: &Board, actor: &UserProfile, role: Role) -> Result<()> {
        if !role.can_manage(None, Some(self.role)) {
            return Err(deny(actor, format!("add a {}", self.role)));
        }
        Ok(())
    }

    fn apply(&self, board: &mut Board, _actor: &UserProfile) -> Result<Value> {
        if board.role_of(&self.user.user_id).is_some() {
            return Err(BoardError::invalid_operation(format!(
                "{} is already a member of this board",
                self.user.label()
            )));
        }
        let membership = Membership {
            display_name: self.user.display_name.clone(),
            photo_url: self.user.photo_url.clone(),
            ..Membership::new(self.user.user_id.clone(), self.user.email.clone(), self.role)
        };
        let value = serde_json::to_value(&membership)?;
        board.board_members.push(membership);
        info!(board = %board.id, user = %self.user.user_id, role = %self.role, "added member");
        Ok(value)
    }

    fn invite(&self, board: &Board, actor: &UserProfile) -> Option<SharingInvite> {
        Some(SharingInvite {
            recipient_email: self.user.email.clone(),
            recipient_name: self.user.display_name.clone(),
            board_id: board.id.clone(),
            board_title: board.title.clone(),
            shared_by_name: actor.display_name.clone(),
            shared_by_email: actor.email.clone(),
            role: self.role,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct ChangeMemberRole {
    pub board: BoardId,
    pub user: UserId,
    pub role: Role,
}

impl ChangeMemberRole {
    pub fn new(board: impl Into<BoardId>, user: impl Into<UserId>, role: Role) -> Self {
        Self {
            board: board.into(),
            user: user.into(),
            role,
        }
    }
}

impl BoardCommand for ChangeMemberRole {
    fn op(&self) -> &'static str {
        "change member role"
    }

    fn board_id(&self) -> &BoardId {
        &self.board
    }

    fn action(&self) -> Action {
        Action::ManageMembers
    }

    fn authorize(&self, board: &Board, actor: &UserProfile, role: Role) -> Result<()> {
        let target = target_role(board, &self.user)?;
        if target == Role::Owner {
            return Err(BoardError::invalid_operation(
                "the board owner's role cannot be changed",
            ));
        }
        if !role.can_manage(Some(target), Some(self.role)) {
            return Err(deny(
                actor,
                format!("change a {} to {}", target, self.role),
            ));
        }
        Ok(())
    }

    fn apply(&self, board: &mut Board, _actor: &UserProfile) -> Result<Value> {
        let membership = match board.membership_mut(&self.user) {
            Some(record) => {
                record.role = self.role;
                record.clone()
            }
            None => {
                // Member from before role tracking
                let record = Membership::new(self.user.clone(), "", self.role);
                board.board_members.push(record.clone());
                record
            }
        };
        Ok(serde_json::to_value(&membership)?)
    }
}

#[derive(Debug, Deserialize)]
pub struct RemoveMember {
    pub board: BoardId,
    pub user: UserId,
}

impl RemoveMember {
    pub fn new(board: impl Into<BoardId>, user: impl Into<UserId>) -> Self {
        Self {
            board: board.into(),
            user: user.into(),
        }
    }
}

impl BoardCommand for RemoveMember {
    fn op(&self) -> &'static str {
        "remove member"
    }

    fn board_id(&self) -> &BoardId {
        &self.board
    }

    fn action(&self) -> Action {
        Action::ManageMembers
    }

    fn authorize(&self, board: &Board, actor: &UserProfile, role: Role) -> Result<()> {
        let target = target_role(board, &self.user)?;
        if target == Role::Owner {
            return Err(BoardError::invalid_operation(
                "the board owner cannot be removed",
            ));
        }
        if !role.can_manage(Some(target), None) {
            return Err(deny(actor, format!("remove a {target}")));
        }
        Ok(())
    }

    fn apply(&self, board: &mut Board, _actor: &UserProfile) -> Result<Value> {
        board.board_members.retain(|m| m.user_id != self.user);
        board.members.remove(&self.user);
        info!(board = %board.id, user = %self.user, "removed member");
        Ok(json!({ "removed": true, "user": self.user }))
    }
}

impl_execute!(AddMember, ChangeMemberRole, RemoveMember);
