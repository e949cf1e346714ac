//! User profile and presence records

use super::ids::{BoardId, UserId};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Denormalized profile kept in the user directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub user_id: UserId,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, rename = "photoURL", skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
}

impl UserProfile {
    pub fn new(user_id: impl Into<UserId>, email: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            email: email.into(),
            display_name: None,
            photo_url: None,
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Display name, falling back to the email address
    pub fn label(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(&self.email)
    }
}

/// Liveness record for one user on one board
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPresence {
    pub user_id: UserId,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, rename = "photoURL", skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    pub last_seen: DateTime<Utc>,
    pub is_active: bool,
    pub board_id: BoardId,
}

impl UserPresence {
    pub fn for_profile(profile: &UserProfile, board_id: BoardId, is_active: bool) -> Self {
        Self {
            user_id: profile.user_id.clone(),
            email: profile.email.clone(),
            display_name: profile.display_name.clone(),
            photo_url: profile.photo_url.clone(),
            last_seen: Utc::now(),
            is_active,
            board_id,
        }
    }

    /// Seen within `threshold` of `now`
    pub fn is_online(&self, now: DateTime<Utc>, threshold: Duration) -> bool {
        now.signed_duration_since(self.last_seen) < threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_online_threshold() {
        let profile = UserProfile::new("u1", "a@example.com");
        let mut presence = UserPresence::for_profile(&profile, BoardId::from("b1"), true);
        let now = Utc::now();
        presence.last_seen = now - Duration::seconds(119);
        assert!(presence.is_online(now, Duration::seconds(120)));
        presence.last_seen = now - Duration::seconds(121);
        assert!(!presence.is_online(now, Duration::seconds(120)));
    }

    #[test]
    fn test_profile_label() {
        let profile = UserProfile::new("u1", "a@example.com");
        assert_eq!(profile.label(), "a@example.com");
        assert_eq!(profile.with_display_name("Ada").label(), "Ada");
    }
}
