//! Strongly typed settings for every TrelloX subsystem

use crate::error::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration object
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrelloxConfig {
    pub storage: StorageSettings,
    pub import: ImportSettings,
    pub presence: PresenceSettings,
    pub sync: SyncSettings,
    pub notifications: NotificationSettings,
}

impl TrelloxConfig {
    /// Reject settings that would make a subsystem misbehave
    pub fn validate(&self) -> ConfigResult<()> {
        if self.import.max_concurrent_requests == 0 {
            return Err(ConfigError::invalid_value(
                "import.max_concurrent_requests",
                "must be at least 1",
            ));
        }
        if self.import.request_timeout_secs == 0 {
            return Err(ConfigError::invalid_value(
                "import.request_timeout_secs",
                "must be at least 1",
            ));
        }
        if self.presence.heartbeat_secs == 0 {
            return Err(ConfigError::invalid_value(
                "presence.heartbeat_secs",
                "must be at least 1",
            ));
        }
        if self.presence.heartbeat_secs >= self.presence.offline_threshold_secs {
            return Err(ConfigError::invalid_value(
                "presence.offline_threshold_secs",
                format!(
                    "must be greater than the heartbeat interval ({}s)",
                    self.presence.heartbeat_secs
                ),
            ));
        }
        if self.sync.max_save_attempts == 0 {
            return Err(ConfigError::invalid_value(
                "sync.max_save_attempts",
                "must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Where board, profile and presence documents live
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    pub root: PathBuf,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            root: PathBuf::from(".trellox").join("data"),
        }
    }
}

/// Import source endpoints and fan-out limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportSettings {
    /// Base URL of the Trello REST API
    pub api_base_url: String,
    /// Host used to resolve relative background image paths
    pub backgrounds_base_url: String,
    pub request_timeout_secs: u64,
    /// Upper bound on in-flight requests per sibling set (cards of a list)
    pub max_concurrent_requests: usize,
    pub user_agent: String,
}

impl ImportSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.trello.com/1".to_string(),
            backgrounds_base_url: "https://trello-backgrounds.s3.amazonaws.com".to_string(),
            request_timeout_secs: 30,
            max_concurrent_requests: 8,
            user_agent: concat!("trellox/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Presence heartbeat and liveness window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PresenceSettings {
    pub heartbeat_secs: u64,
    /// A user not seen for this long is reported offline
    pub offline_threshold_secs: u64,
}

impl PresenceSettings {
    pub fn heartbeat(&self) -> Duration {
        Duration::from_secs(self.heartbeat_secs)
    }

    pub fn offline_threshold(&self) -> Duration {
        Duration::from_secs(self.offline_threshold_secs)
    }
}

impl Default for PresenceSettings {
    fn default() -> Self {
        Self {
            heartbeat_secs: 30,
            offline_threshold_secs: 120,
        }
    }
}

/// Local/remote reconciliation knobs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    /// Window after a remote snapshot during which local changes are not re-broadcast
    pub echo_guard_ms: u64,
    /// Attempts per command when a save hits a stale revision
    pub max_save_attempts: u32,
}

impl SyncSettings {
    pub fn echo_guard(&self) -> Duration {
        Duration::from_millis(self.echo_guard_ms)
    }
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            echo_guard_ms: 100,
            max_save_attempts: 3,
        }
    }
}

/// Outbound notification settings. Absent email settings disable sending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationSettings {
    pub email: Option<EmailSettings>,
    pub app_name: String,
    /// Prefix for links to a board; the board id is appended
    pub board_url_base: String,
}

impl NotificationSettings {
    /// Email settings, only when every credential is present
    pub fn email_if_configured(&self) -> Option<&EmailSettings> {
        self.email.as_ref().filter(|email| email.is_complete())
    }
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            email: None,
            app_name: "TrelloX".to_string(),
            board_url_base: "http://localhost:5173/board".to_string(),
        }
    }
}

/// Credentials for the email delivery service
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailSettings {
    pub service_id: String,
    pub template_id: String,
    pub public_key: String,
}

impl EmailSettings {
    pub fn is_complete(&self) -> bool {
        !self.service_id.trim().is_empty()
            && !self.template_id.trim().is_empty()
            && !self.public_key.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = TrelloxConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.sync.echo_guard(), Duration::from_millis(100));
        assert_eq!(config.presence.heartbeat(), Duration::from_secs(30));
        assert_eq!(config.presence.offline_threshold(), Duration::from_secs(120));
        assert_eq!(config.import.max_concurrent_requests, 8);
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let mut config = TrelloxConfig::default();
        config.import.max_concurrent_requests = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("import.max_concurrent_requests"));
    }

    #[test]
    fn test_heartbeat_must_be_shorter_than_threshold() {
        let mut config = TrelloxConfig::default();
        config.presence.heartbeat_secs = 120;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_incomplete_email_is_not_configured() {
        let mut settings = NotificationSettings::default();
        assert!(settings.email_if_configured().is_none());

        settings.email = Some(EmailSettings {
            service_id: "svc".into(),
            template_id: "".into(),
            public_key: "key".into(),
        });
        assert!(settings.email_if_configured().is_none());

        settings.email = Some(EmailSettings {
            service_id: "svc".into(),
            template_id: "tpl".into(),
            public_key: "key".into(),
        });
        assert!(settings.email_if_configured().is_some());
    }
}
