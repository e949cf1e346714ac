//! Presence tracking for the signed-in user
//!
//! A [`PresenceTracker`] belongs to one session. It writes the user's presence
//! record for the board being viewed, refreshes it on a heartbeat, and removes
//! it when the user leaves the board or signs out.

use crate::error::Result;
use crate::store::PresenceStore;
use crate::types::{BoardId, UserPresence, UserProfile};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use trellox_config::PresenceSettings;

pub struct PresenceTracker {
    inner: Arc<Inner>,
}

struct Inner {
    store: Arc<dyn PresenceStore>,
    profile: UserProfile,
    settings: PresenceSettings,
    state: Mutex<TrackerState>,
}

#[derive(Default)]
struct TrackerState {
    board: Option<BoardId>,
    active: bool,
    heartbeat: Option<JoinHandle<()>>,
}

impl Inner {
    async fn write(&self) -> Result<()> {
        let (board, active) = {
            let state = self.state.lock().await;
            match &state.board {
                Some(board) => (board.clone(), state.active),
                None => return Ok(()),
            }
        };
        let presence = UserPresence::for_profile(&self.profile, board, active);
        self.store.put_presence(&presence).await
    }
}

impl PresenceTracker {
    pub fn new(
        store: Arc<dyn PresenceStore>,
        profile: UserProfile,
        settings: PresenceSettings,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                profile,
                settings,
                state: Mutex::new(TrackerState::default()),
            }),
        }
    }

    /// Start tracking presence on `board`, leaving any previous board first
    pub async fn start(&self, board: BoardId) -> Result<()> {
        let previous = self.inner.state.lock().await.board.clone();
        if previous.as_ref().is_some_and(|current| current != &board) {
            self.stop().await;
        }

        {
            let mut state = self.inner.state.lock().await;
            state.board = Some(board.clone());
            state.active = true;
        }
        self.inner.write().await?;

        let inner = Arc::clone(&self.inner);
        let period = self.inner.settings.heartbeat();
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            // The first tick completes immediately; presence was just written
            interval.tick().await;
            loop {
                interval.tick().await;
                if let Err(e) = inner.write().await {
                    warn!("presence heartbeat failed: {}", e);
                }
            }
        });

        let mut state = self.inner.state.lock().await;
        if let Some(old) = state.heartbeat.replace(handle) {
            old.abort();
        }
        debug!(board = %board, user = %self.inner.profile.user_id, "presence started");
        Ok(())
    }

    /// Stop the heartbeat and remove the presence record. Storage failures are
    /// logged; leaving a board never fails.
    pub async fn stop(&self) {
        let board = {
            let mut state = self.inner.state.lock().await;
            if let Some(handle) = state.heartbeat.take() {
                handle.abort();
            }
            state.board.take()
        };

        if let Some(board) = board {
            if let Err(e) = self
                .inner
                .store
                .remove_presence(&board, &self.inner.profile.user_id)
                .await
            {
                warn!(board = %board, "failed to remove presence: {}", e);
            }
            debug!(board = %board, "presence stopped");
        }
    }

    /// Record whether the user is actively interacting (e.g. the view is
    /// focused) and publish it right away
    pub async fn set_active(&self, active: bool) -> Result<()> {
        self.inner.state.lock().await.active = active;
        self.inner.write().await
    }

    pub async fn current_board(&self) -> Option<BoardId> {
        self.inner.state.lock().await.board.clone()
    }

    pub async fn is_running(&self) -> bool {
        self.inner
            .state
            .lock()
            .await
            .heartbeat
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }

    /// Users seen on `board` within the offline threshold, as of `now`
    pub async fn online(&self, board: &BoardId, now: DateTime<Utc>) -> Result<Vec<UserPresence>> {
        online_users(
            self.inner.store.as_ref(),
            board,
            now,
            &self.inner.settings,
        )
        .await
    }
}

impl Drop for PresenceTracker {
    fn drop(&mut self) {
        if let Ok(mut state) = self.inner.state.try_lock() {
            if let Some(handle) = state.heartbeat.take() {
                handle.abort();
            }
        }
    }
}

/// Presence records on `board` seen within the offline threshold. A record is
/// reported active only while it is also online.
pub async fn online_users(
    store: &dyn PresenceStore,
    board: &BoardId,
    now: DateTime<Utc>,
    settings: &PresenceSettings,
) -> Result<Vec<UserPresence>> {
    let threshold = chrono::Duration::seconds(settings.offline_threshold_secs as i64);
    let mut online: Vec<UserPresence> = store
        .list_presence(board)
        .await?
        .into_iter()
        .filter(|p| p.is_online(now, threshold))
        .collect();
    online.sort_by(|a, b| a.user_id.cmp(&b.user_id));
    Ok(online)
}
