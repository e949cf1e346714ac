//! Outbound invite notifications
//!
//! When a member is added to a board an email goes out through the configured
//! [`Notifier`]. Sending is best effort: without complete email settings it is
//! skipped, and a failed send is logged without failing the membership change.

use crate::error::{BoardError, Result};
use crate::types::{BoardId, Role};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};
use trellox_config::{EmailSettings, NotificationSettings};

const SUBJECT_TEMPLATE: &str = "{{ from_name }} shared \"{{ board_title }}\" with you on {{ app_name }}";

const TEXT_TEMPLATE: &str = "Hi {{ to_name }},

{{ message }}

Your access level: {{ permission_level }}
{{ permission_description }}

Open the board: {{ board_url }}

- The {{ app_name }} team
";

const HTML_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
  <body style="font-family: sans-serif; color: #172b4d;">
    <p>Hi {{ to_name | escape }},</p>
    <p>{{ message | escape }}</p>
    <p>
      <strong>Your access level:</strong> {{ permission_level | escape }}<br>
      {{ permission_description | escape }}
    </p>
    <p>
      <a href="{{ board_url | escape }}" style="background: #0079bf; color: #fff; padding: 8px 16px; border-radius: 3px; text-decoration: none;">Open board</a>
    </p>
    <p style="color: #5e6c84;">The {{ app_name | escape }} team</p>
  </body>
</html>
"#;

/// A board was shared with someone
#[derive(Debug, Clone, PartialEq)]
pub struct SharingInvite {
    pub recipient_email: String,
    pub recipient_name: Option<String>,
    pub board_id: BoardId,
    pub board_title: String,
    pub shared_by_name: Option<String>,
    pub shared_by_email: String,
    pub role: Role,
}

/// A rendered email ready to hand to a delivery service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundEmail {
    pub to: String,
    pub subject: String,
    pub html: String,
    pub text: String,
}

/// Email delivery collaborator
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, credentials: &EmailSettings, email: &OutboundEmail) -> Result<()>;
}

/// Renders invite emails and sends them when delivery is configured
pub struct InviteMailer {
    settings: NotificationSettings,
    notifier: Option<Arc<dyn Notifier>>,
    subject: liquid::Template,
    text: liquid::Template,
    html: liquid::Template,
}

impl std::fmt::Debug for InviteMailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InviteMailer")
            .field("app_name", &self.settings.app_name)
            .field("has_notifier", &self.notifier.is_some())
            .finish()
    }
}

impl InviteMailer {
    pub fn new(settings: NotificationSettings, notifier: Option<Arc<dyn Notifier>>) -> Result<Self> {
        let parser = liquid::ParserBuilder::with_stdlib()
            .build()
            .map_err(template_error)?;
        Ok(Self {
            subject: parser.parse(SUBJECT_TEMPLATE).map_err(template_error)?,
            text: parser.parse(TEXT_TEMPLATE).map_err(template_error)?,
            html: parser.parse(HTML_TEMPLATE).map_err(template_error)?,
            settings,
            notifier,
        })
    }

    /// A mailer that never sends
    pub fn disabled() -> Result<Self> {
        Self::new(NotificationSettings::default(), None)
    }

    pub fn board_url(&self, board: &BoardId) -> String {
        format!("{}/{}", self.settings.board_url_base.trim_end_matches('/'), board)
    }

    pub fn render(&self, invite: &SharingInvite) -> Result<OutboundEmail> {
        let from_name = invite
            .shared_by_name
            .clone()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| "Someone".to_string());
        let to_name = invite
            .recipient_name
            .clone()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| invite.recipient_email.clone());
        let message = format!(
            "{} has invited you to collaborate on the board \"{}\" in {}.",
            from_name, invite.board_title, self.settings.app_name
        );

        let globals = liquid::object!({
            "to_email": invite.recipient_email,
            "to_name": to_name,
            "from_name": from_name,
            "from_email": invite.shared_by_email,
            "board_title": invite.board_title,
            "board_url": self.board_url(&invite.board_id),
            "permission_level": capitalize(invite.role.as_str()),
            "permission_description": invite.role.description(),
            "app_name": self.settings.app_name,
            "message": message,
        });

        Ok(OutboundEmail {
            to: invite.recipient_email.clone(),
            subject: self.subject.render(&globals).map_err(template_error)?,
            text: self.text.render(&globals).map_err(template_error)?,
            html: self.html.render(&globals).map_err(template_error)?,
        })
    }

    /// Send the invite if delivery is configured. Returns whether an email
    /// was actually sent.
    pub async fn notify(&self, invite: &SharingInvite) -> bool {
        let Some(credentials) = self.settings.email_if_configured() else {
            debug!("email delivery not configured, skipping invite notification");
            return false;
        };
        let Some(notifier) = &self.notifier else {
            debug!("no notifier installed, skipping invite notification");
            return false;
        };

        let email = match self.render(invite) {
            Ok(email) => email,
            Err(e) => {
                warn!("failed to render invite email: {}", e);
                return false;
            }
        };

        match notifier.send(credentials, &email).await {
            Ok(()) => {
                info!(board = %invite.board_id, to = %email.to, "sent invite notification");
                true
            }
            Err(e) => {
                warn!(board = %invite.board_id, "failed to send invite notification: {}", e);
                false
            }
        }
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn template_error(e: liquid::Error) -> BoardError {
    BoardError::Template {
        message: e.to_string(),
    }
}
