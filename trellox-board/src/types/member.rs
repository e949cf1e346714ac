//! Membership types: roles, membership records and the actions they gate

use super::ids::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A member's role on a board, ranked `viewer < member < admin < owner`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Viewer,
    Member,
    Admin,
    Owner,
}

impl Role {
    /// Human readable description shown when picking a role
    pub fn description(&self) -> &'static str {
        match self {
            Role::Owner => "Full access to the board and can manage members",
            Role::Admin => "Can edit board content and manage members",
            Role::Member => "Can view and edit board content (lists, cards, etc.)",
            Role::Viewer => "Can only view board content (read-only access)",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Owner => "owner",
            Role::Admin => "admin",
            Role::Member => "member",
            Role::Viewer => "viewer",
        }
    }

    /// Whether this role is enough for `action`
    pub fn allows(&self, action: Action) -> bool {
        *self >= action.required_role()
    }

    /// Whether this role may add, remove or re-role a member holding `target`
    /// and, when given, hand out `granted`.
    pub fn can_manage(&self, target: Option<Role>, granted: Option<Role>) -> bool {
        if !self.allows(Action::ManageMembers) {
            return false;
        }
        if target == Some(Role::Owner) || granted == Some(Role::Owner) {
            return false;
        }
        let ceiling = if self.allows(Action::GrantAdmin) {
            Role::Admin
        } else {
            Role::Member
        };
        target.is_none_or(|role| role <= ceiling) && granted.is_none_or(|role| role <= ceiling)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "owner" => Ok(Role::Owner),
            "admin" => Ok(Role::Admin),
            "member" => Ok(Role::Member),
            "viewer" => Ok(Role::Viewer),
            other => Err(format!("unknown role '{other}'")),
        }
    }
}

/// Something a user attempts on a board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    ViewBoard,
    EditContent,
    ManageMembers,
    GrantAdmin,
    DeleteBoard,
}

impl Action {
    /// Minimum role required to perform the action
    pub fn required_role(&self) -> Role {
        match self {
            Action::ViewBoard => Role::Viewer,
            Action::EditContent => Role::Member,
            Action::ManageMembers => Role::Admin,
            Action::GrantAdmin | Action::DeleteBoard => Role::Owner,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Action::ViewBoard => "view board",
            Action::EditContent => "edit content",
            Action::ManageMembers => "manage members",
            Action::GrantAdmin => "grant admin",
            Action::DeleteBoard => "delete board",
        };
        f.write_str(text)
    }
}

/// A member record with a denormalized profile snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Membership {
    pub user_id: UserId,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, rename = "photoURL", skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    #[serde(rename = "permission")]
    pub role: Role,
    pub joined_at: DateTime<Utc>,
}

impl Membership {
    pub fn new(user_id: impl Into<UserId>, email: impl Into<String>, role: Role) -> Self {
        Self {
            user_id: user_id.into(),
            email: email.into(),
            display_name: None,
            photo_url: None,
            role,
            joined_at: Utc::now(),
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn with_photo_url(mut self, url: impl Into<String>) -> Self {
        self.photo_url = Some(url.into());
        self
    }
}
