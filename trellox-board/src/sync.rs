//! Real-time board synchronization
//!
//! [`SubscriptionHub`] fans remote snapshots out to every view of a board.
//! [`LocalBoard`] is the client-side copy: local edits apply immediately,
//! remote snapshots replace it wholesale, and an [`EchoGuard`] keeps an update
//! triggered by a remote snapshot from being broadcast straight back.

use crate::error::Result;
use crate::types::{Board, BoardId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::Instant;
use tracing::{debug, trace};

const DEFAULT_CHANNEL_CAPACITY: usize = 16;

/// Per-board broadcast of board snapshots
#[derive(Debug)]
pub struct SubscriptionHub {
    channels: Mutex<HashMap<BoardId, broadcast::Sender<Arc<Board>>>>,
    capacity: usize,
}

impl Default for SubscriptionHub {
    fn default() -> Self {
        Self::new()
    }
}

impl SubscriptionHub {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Snapshots buffered per board before slow receivers start lagging
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            channels: Mutex::new(HashMap::new()),
            capacity: capacity.max(1),
        }
    }

    fn channels(&self) -> MutexGuard<'_, HashMap<BoardId, broadcast::Sender<Arc<Board>>>> {
        self.channels.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Receive every snapshot published for `board` from now on
    pub fn subscribe(&self, board: &BoardId) -> broadcast::Receiver<Arc<Board>> {
        let mut channels = self.channels();
        let sender = channels
            .entry(board.clone())
            .or_insert_with(|| broadcast::channel(self.capacity).0);
        debug!(board = %board, "subscribed to board updates");
        sender.subscribe()
    }

    /// Publish a snapshot. Returns how many receivers got it.
    pub fn publish(&self, board: Board) -> usize {
        let channels = self.channels();
        let Some(sender) = channels.get(&board.id) else {
            trace!(board = %board.id, "no subscribers for board");
            return 0;
        };
        sender.send(Arc::new(board)).unwrap_or(0)
    }

    /// Drop the channel for `board`; its receivers see the stream close
    pub fn unsubscribe(&self, board: &BoardId) -> bool {
        let removed = self.channels().remove(board).is_some();
        if removed {
            debug!(board = %board, "unsubscribed from board updates");
        }
        removed
    }

    pub fn unsubscribe_all(&self) {
        let mut channels = self.channels();
        debug!(count = channels.len(), "dropping all board subscriptions");
        channels.clear();
    }

    /// Number of boards with an open subscription
    pub fn active_count(&self) -> usize {
        self.channels().len()
    }
}

/// Suppresses re-broadcast for a short window after a remote snapshot
#[derive(Debug, Clone)]
pub struct EchoGuard {
    window: Duration,
    armed_at: Option<Instant>,
}

impl EchoGuard {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            armed_at: None,
        }
    }

    pub fn arm(&mut self) {
        self.armed_at = Some(Instant::now());
    }

    /// Whether updates should currently be kept local
    pub fn is_suppressing(&self) -> bool {
        self.armed_at
            .is_some_and(|armed| armed.elapsed() < self.window)
    }
}

/// The client-side copy of a board
#[derive(Debug, Clone)]
pub struct LocalBoard {
    board: Board,
    guard: EchoGuard,
}

impl LocalBoard {
    pub fn new(board: Board, echo_window: Duration) -> Self {
        Self {
            board,
            guard: EchoGuard::new(echo_window),
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn into_board(self) -> Board {
        self.board
    }

    /// Apply a local edit right away.
    ///
    /// Returns the snapshot to persist and broadcast, or `None` while the echo
    /// guard is suppressing. A failed edit leaves the board unchanged.
    pub fn apply_local<F>(&mut self, edit: F) -> Result<Option<Board>>
    where
        F: FnOnce(&mut Board) -> Result<()>,
    {
        let mut next = self.board.clone();
        edit(&mut next)?;
        self.board = next;

        if self.guard.is_suppressing() {
            trace!(board = %self.board.id, "local update inside echo window, not broadcasting");
            return Ok(None);
        }
        Ok(Some(self.board.clone()))
    }

    /// Replace local state with a remote snapshot, unconditionally
    pub fn apply_remote(&mut self, snapshot: Board) {
        self.board = snapshot;
        self.guard.arm();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Card, List, Membership, Role};

    fn board() -> Board {
        Board::new("B", Membership::new("u1", "a@example.com", Role::Owner))
            .with_id("b1")
            .with_lists(vec![List::new("L").with_id("l1")])
    }

    #[tokio::test]
    async fn test_publish_reaches_subscribers() {
        let hub = SubscriptionHub::new();
        let mut rx = hub.subscribe(&BoardId::from("b1"));
        assert_eq!(hub.active_count(), 1);

        assert_eq!(hub.publish(board()), 1);
        let snapshot = rx.recv().await.unwrap();
        assert_eq!(snapshot.id.as_str(), "b1");
    }

    #[tokio::test]
    async fn test_unsubscribe_closes_stream() {
        let hub = SubscriptionHub::new();
        let mut rx = hub.subscribe(&BoardId::from("b1"));
        assert!(hub.unsubscribe(&BoardId::from("b1")));
        assert!(!hub.unsubscribe(&BoardId::from("b1")));
        assert!(matches!(
            rx.recv().await,
            Err(broadcast::error::RecvError::Closed)
        ));
        assert_eq!(hub.publish(board()), 0);
    }

    #[test]
    fn test_unsubscribe_all() {
        let hub = SubscriptionHub::new();
        let _a = hub.subscribe(&BoardId::from("b1"));
        let _b = hub.subscribe(&BoardId::from("b2"));
        assert_eq!(hub.active_count(), 2);
        hub.unsubscribe_all();
        assert_eq!(hub.active_count(), 0);
    }

    fn add_card(board: &mut Board) -> Result<()> {
        board.lists[0].cards.push(Card::new("new"));
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_echo_guard_window() {
        let mut local = LocalBoard::new(board(), Duration::from_millis(100));

        assert!(local.apply_local(add_card).unwrap().is_some());

        let mut remote = board();
        remote.title = "Remote".into();
        local.apply_remote(remote);
        assert_eq!(local.board().title, "Remote");

        // Inside the window the edit applies but is not broadcast
        tokio::time::advance(Duration::from_millis(50)).await;
        assert!(local.apply_local(add_card).unwrap().is_none());
        assert_eq!(local.board().lists[0].cards.len(), 1);

        tokio::time::advance(Duration::from_millis(60)).await;
        let snapshot = local.apply_local(add_card).unwrap().unwrap();
        assert_eq!(snapshot.lists[0].cards.len(), 2);
    }

    #[test]
    fn test_failed_edit_leaves_board_unchanged() {
        let mut local = LocalBoard::new(board(), Duration::from_millis(100));
        let result = local.apply_local(|b| {
            b.title = "changed".into();
            b.move_list(0, 5)
        });
        assert!(result.is_err());
        assert_eq!(local.board().title, "B");
    }
}
