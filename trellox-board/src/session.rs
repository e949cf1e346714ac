//! Signed-in sessions
//!
//! Everything that only makes sense while a user is signed in (presence
//! tracking, board subscriptions) hangs off a [`Session`]. The
//! [`SessionManager`] follows the identity provider and builds a session on
//! sign-in and tears it down on sign-out.

use crate::error::Result;
use crate::presence::PresenceTracker;
use crate::store::{PresenceStore, UserDirectory};
use crate::sync::SubscriptionHub;
use crate::types::{UserId, UserProfile};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};
use trellox_config::TrelloxConfig;

/// The signed-in user as reported by the identity provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub uid: UserId,
    pub email: String,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
}

impl AuthUser {
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            user_id: self.uid.clone(),
            email: self.email.clone(),
            display_name: self.display_name.clone(),
            photo_url: self.photo_url.clone(),
        }
    }
}

/// Third-party sign-in providers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FederatedProvider {
    Google,
}

/// Identity collaborator
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn register(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> Result<AuthUser>;

    async fn sign_in_password(&self, email: &str, password: &str) -> Result<AuthUser>;

    async fn sign_in_federated(&self, provider: FederatedProvider) -> Result<AuthUser>;

    async fn sign_out(&self) -> Result<()>;

    fn current(&self) -> Option<AuthUser>;

    /// Receiver that observes every session change
    fn subscribe(&self) -> watch::Receiver<Option<AuthUser>>;

    async fn request_password_reset(&self, email: &str) -> Result<()>;
}

/// Services scoped to one signed-in user
pub struct Session {
    user: AuthUser,
    presence: PresenceTracker,
    subscriptions: Arc<SubscriptionHub>,
}

impl Session {
    /// Record the user's profile in the directory and set up session services
    pub async fn start(
        user: AuthUser,
        users: &dyn UserDirectory,
        presence_store: Arc<dyn PresenceStore>,
        config: &TrelloxConfig,
    ) -> Result<Self> {
        users.upsert_profile(&user.profile()).await?;
        let presence =
            PresenceTracker::new(presence_store, user.profile(), config.presence.clone());
        info!(user = %user.uid, "session started");
        Ok(Self {
            user,
            presence,
            subscriptions: Arc::new(SubscriptionHub::new()),
        })
    }

    pub fn user(&self) -> &AuthUser {
        &self.user
    }

    pub fn presence(&self) -> &PresenceTracker {
        &self.presence
    }

    pub fn subscriptions(&self) -> &Arc<SubscriptionHub> {
        &self.subscriptions
    }

    /// Leave the current board and drop every subscription
    pub async fn shutdown(self) {
        self.presence.stop().await;
        self.subscriptions.unsubscribe_all();
        info!(user = %self.user.uid, "session ended");
    }
}

/// Owns the current session and keeps it in step with the identity provider
pub struct SessionManager {
    identity: Arc<dyn IdentityProvider>,
    users: Arc<dyn UserDirectory>,
    presence_store: Arc<dyn PresenceStore>,
    config: TrelloxConfig,
    current: Mutex<Option<Session>>,
}

impl SessionManager {
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        users: Arc<dyn UserDirectory>,
        presence_store: Arc<dyn PresenceStore>,
        config: TrelloxConfig,
    ) -> Self {
        Self {
            identity,
            users,
            presence_store,
            config,
            current: Mutex::new(None),
        }
    }

    /// React to a session change. Signing in as the same user keeps the
    /// existing session.
    pub async fn on_auth_change(&self, user: Option<AuthUser>) -> Result<()> {
        let mut current = self.current.lock().await;

        if let (Some(session), Some(next)) = (current.as_ref(), user.as_ref()) {
            if session.user.uid == next.uid {
                debug!(user = %next.uid, "session unchanged");
                return Ok(());
            }
        }

        if let Some(session) = current.take() {
            session.shutdown().await;
        }

        if let Some(user) = user {
            let session = Session::start(
                user,
                self.users.as_ref(),
                Arc::clone(&self.presence_store),
                &self.config,
            )
            .await?;
            *current = Some(session);
        }
        Ok(())
    }

    /// Follow the identity provider until its change stream closes
    pub async fn run(&self) -> Result<()> {
        let mut changes = self.identity.subscribe();
        let initial = changes.borrow_and_update().clone();
        self.on_auth_change(initial).await?;

        while changes.changed().await.is_ok() {
            let user = changes.borrow_and_update().clone();
            if let Err(e) = self.on_auth_change(user).await {
                warn!("failed to switch session: {}", e);
            }
        }
        Ok(())
    }

    /// Sign out with the provider and tear down the session
    pub async fn sign_out(&self) -> Result<()> {
        self.identity.sign_out().await?;
        self.on_auth_change(None).await
    }

    pub async fn current_user(&self) -> Option<AuthUser> {
        self.current.lock().await.as_ref().map(|s| s.user.clone())
    }

    /// Run `f` against the current session, if any
    pub async fn with_session<R>(&self, f: impl FnOnce(&Session) -> R) -> Option<R> {
        self.current.lock().await.as_ref().map(f)
    }
}
