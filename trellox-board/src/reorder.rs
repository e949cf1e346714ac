//! Reorder engine
//!
//! Pure sequence splices used for drag-and-drop of lists and cards, plus the
//! hover bookkeeping that decides when a drag gesture turns into a move. None
//! of this knows about pixels beyond the extent of the hovered element along
//! the drag axis.

use crate::error::{BoardError, Result};

/// Remove the element at `from` and reinsert it at `to`.
///
/// Both indices must lie in `[0, len)`. `from == to` returns an equal copy.
pub fn reorder_within<T: Clone>(sequence: &[T], from: usize, to: usize) -> Result<Vec<T>> {
    let mut result = sequence.to_vec();
    reorder_in_place(&mut result, from, to)?;
    Ok(result)
}

/// In-place variant of [`reorder_within`]
pub fn reorder_in_place<T>(sequence: &mut Vec<T>, from: usize, to: usize) -> Result<()> {
    let len = sequence.len();
    check_index(from, len)?;
    check_index(to, len)?;
    if from != to {
        let item = sequence.remove(from);
        sequence.insert(to, item);
    }
    Ok(())
}

/// Move the element at `from` in `source` into `dest` at `to`.
///
/// `from` must be valid for `source`; `to` is clamped to `[0, dest.len()]`.
pub fn move_between<T: Clone>(
    source: &[T],
    dest: &[T],
    from: usize,
    to: usize,
) -> Result<(Vec<T>, Vec<T>)> {
    check_index(from, source.len())?;

    let mut new_source = source.to_vec();
    let item = new_source.remove(from);

    let mut new_dest = dest.to_vec();
    let to = to.min(new_dest.len());
    new_dest.insert(to, item);

    Ok((new_source, new_dest))
}

fn check_index(index: usize, len: usize) -> Result<()> {
    if index >= len {
        return Err(BoardError::IndexOutOfRange { index, len });
    }
    Ok(())
}

// =============================================================================
// Explicit positions
// =============================================================================

/// Elements that carry their own numeric position on the wire
pub trait Positioned {
    fn pos(&self) -> u32;
    fn set_pos(&mut self, pos: u32);
}

/// Rewrite `pos` so it matches the array index (`0..n`)
pub fn renumber<T: Positioned>(items: &mut [T]) {
    for (index, item) in items.iter_mut().enumerate() {
        item.set_pos(index as u32);
    }
}

/// Stable sort by `pos`, then renumber contiguously
pub fn sort_by_pos<T: Positioned>(items: &mut [T]) {
    items.sort_by_key(|item| item.pos());
    renumber(items);
}

// =============================================================================
// Hover tie-break
// =============================================================================

/// Extent of the hovered element along the drag axis
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent {
    pub start: f64,
    pub end: f64,
}

impl Extent {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }
}

/// Whether hovering `hover_index` with the pointer at `pointer` should commit
/// a move of the element currently at `drag_index`.
///
/// Dragging forward commits only once the pointer is past the hovered
/// element's midpoint; dragging backward only once it is before it. Hovering
/// the element's own slot in the same sequence never commits.
pub fn should_commit(
    drag_index: usize,
    hover_index: usize,
    same_sequence: bool,
    extent: Extent,
    pointer: f64,
) -> bool {
    if drag_index == hover_index && same_sequence {
        return false;
    }

    let middle = (extent.end - extent.start) / 2.0;
    let offset = pointer - extent.start;

    if drag_index < hover_index && offset < middle {
        return false;
    }
    if drag_index > hover_index && offset > middle {
        return false;
    }
    true
}

/// A committed move produced by a drag gesture
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Move<K> {
    pub from_sequence: K,
    pub from_index: usize,
    pub to_sequence: K,
    pub to_index: usize,
}

impl<K: PartialEq> Move<K> {
    pub fn is_within_sequence(&self) -> bool {
        self.from_sequence == self.to_sequence
    }
}

/// Tracks where the dragged element currently sits while a gesture is in
/// flight. Every committed move updates the tracked position so subsequent
/// hover events compare against the element's new slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragState<K> {
    sequence: K,
    index: usize,
}

impl<K: Clone + PartialEq> DragState<K> {
    /// Begin dragging the element at `index` of `sequence`
    pub fn start(sequence: K, index: usize) -> Self {
        Self { sequence, index }
    }

    pub fn sequence(&self) -> &K {
        &self.sequence
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Handle a hover over the element at `hover_index` of `target`
    pub fn hover(
        &mut self,
        target: &K,
        hover_index: usize,
        extent: Extent,
        pointer: f64,
    ) -> Option<Move<K>> {
        let same_sequence = &self.sequence == target;
        if !should_commit(self.index, hover_index, same_sequence, extent, pointer) {
            return None;
        }
        Some(self.commit(target.clone(), hover_index))
    }

    /// Handle a hover over the drop area of an empty sequence
    pub fn hover_empty(&mut self, target: K) -> Move<K> {
        self.commit(target, 0)
    }

    fn commit(&mut self, target: K, to_index: usize) -> Move<K> {
        let mv = Move {
            from_sequence: std::mem::replace(&mut self.sequence, target.clone()),
            from_index: self.index,
            to_sequence: target,
            to_index,
        };
        self.index = to_index;
        mv
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reorder_forward() {
        let result = reorder_within(&["a", "b", "c"], 0, 2).unwrap();
        assert_eq!(result, vec!["b", "c", "a"]);
    }

    #[test]
    fn test_reorder_backward() {
        let result = reorder_within(&["a", "b", "c"], 2, 0).unwrap();
        assert_eq!(result, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_reorder_identity() {
        let result = reorder_within(&[1, 2, 3], 1, 1).unwrap();
        assert_eq!(result, vec![1, 2, 3]);
    }

    #[test]
    fn test_reorder_out_of_range() {
        let err = reorder_within(&[1, 2, 3], 0, 3).unwrap_err();
        assert!(matches!(err, BoardError::IndexOutOfRange { index: 3, len: 3 }));
        assert!(reorder_within::<i32>(&[], 0, 0).is_err());
    }

    #[test]
    fn test_move_between() {
        let (source, dest) = move_between(&["c1", "c2"], &["c3"], 0, 1).unwrap();
        assert_eq!(source, vec!["c2"]);
        assert_eq!(dest, vec!["c3", "c1"]);
    }

    #[test]
    fn test_move_between_clamps_destination() {
        let (source, dest) = move_between(&["c1"], &["c2", "c3"], 0, 99).unwrap();
        assert!(source.is_empty());
        assert_eq!(dest, vec!["c2", "c3", "c1"]);

        let (_, dest) = move_between(&["c1"], &[], 0, 5).unwrap();
        assert_eq!(dest, vec!["c1"]);
    }

    #[test]
    fn test_move_between_bad_source_index() {
        assert!(move_between(&["c1"], &["c2"], 1, 0).is_err());
    }

    #[derive(Debug)]
    struct Item(u32);

    impl Positioned for Item {
        fn pos(&self) -> u32 {
            self.0
        }
        fn set_pos(&mut self, pos: u32) {
            self.0 = pos;
        }
    }

    #[test]
    fn test_sort_by_pos_renumbers() {
        let mut items = vec![Item(16384), Item(5), Item(700)];
        sort_by_pos(&mut items);
        let positions: Vec<u32> = items.iter().map(|i| i.0).collect();
        assert_eq!(positions, vec![0, 1, 2]);
    }

    #[test]
    fn test_should_commit_forward_needs_midpoint() {
        let extent = Extent::new(100.0, 140.0);
        assert!(!should_commit(0, 1, true, extent, 110.0));
        assert!(should_commit(0, 1, true, extent, 130.0));
    }

    #[test]
    fn test_should_commit_backward_needs_midpoint() {
        let extent = Extent::new(100.0, 140.0);
        assert!(!should_commit(2, 1, true, extent, 130.0));
        assert!(should_commit(2, 1, true, extent, 110.0));
    }

    #[test]
    fn test_own_slot_never_commits() {
        let extent = Extent::new(0.0, 40.0);
        assert!(!should_commit(1, 1, true, extent, 0.0));
        assert!(!should_commit(1, 1, true, extent, 40.0));
        // Same index in another list is a real move
        assert!(should_commit(1, 1, false, extent, 20.0));
    }

    #[test]
    fn test_drag_state_tracks_committed_moves() {
        let mut drag = DragState::start("l1", 0);
        let extent = Extent::new(0.0, 40.0);

        // Not past the midpoint yet
        assert!(drag.hover(&"l1", 1, extent, 10.0).is_none());

        let mv = drag.hover(&"l1", 1, extent, 30.0).unwrap();
        assert!(mv.is_within_sequence());
        assert_eq!((mv.from_index, mv.to_index), (0, 1));
        assert_eq!(drag.index(), 1);

        // Hovering the new slot does nothing
        assert!(drag.hover(&"l1", 1, extent, 30.0).is_none());

        let mv = drag.hover(&"l2", 0, extent, 10.0).unwrap();
        assert_eq!(mv.from_sequence, "l1");
        assert_eq!(mv.to_sequence, "l2");
        assert_eq!(drag.sequence(), &"l2");
    }

    #[test]
    fn test_empty_list_commits_at_zero() {
        let mut drag = DragState::start("l1", 3);
        let mv = drag.hover_empty("l2");
        assert_eq!(mv.to_index, 0);
        assert_eq!(mv.from_index, 3);
        assert_eq!(drag.index(), 0);
        assert_eq!(drag.sequence(), &"l2");
    }
}
