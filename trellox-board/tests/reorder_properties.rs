//! Property-based tests for the reorder engine

use proptest::prelude::*;
use trellox_board::reorder::{move_between, reorder_within};

fn sequence_and_indices() -> impl Strategy<Value = (Vec<u16>, usize, usize)> {
    prop::collection::vec(any::<u16>(), 1..24).prop_flat_map(|seq| {
        let len = seq.len();
        (Just(seq), 0..len, 0..len)
    })
}

fn sorted(mut items: Vec<u16>) -> Vec<u16> {
    items.sort_unstable();
    items
}

proptest! {
    /// Property: a reorder is a permutation that lands the moved element at `to`
    #[test]
    fn reorder_is_a_permutation((seq, from, to) in sequence_and_indices()) {
        let result = reorder_within(&seq, from, to).unwrap();
        prop_assert_eq!(result.len(), seq.len());
        prop_assert_eq!(result[to], seq[from]);
        prop_assert_eq!(sorted(result), sorted(seq));
    }

    /// Property: moving back to the original index restores the sequence
    #[test]
    fn reorder_round_trip_is_identity((seq, from, to) in sequence_and_indices()) {
        let moved = reorder_within(&seq, from, to).unwrap();
        let restored = reorder_within(&moved, to, from).unwrap();
        prop_assert_eq!(restored, seq);
    }

    /// Property: an index at or past the end is rejected
    #[test]
    fn reorder_rejects_out_of_range(seq in prop::collection::vec(any::<u16>(), 0..8), extra in 0usize..4) {
        let bad = seq.len() + extra;
        prop_assert!(reorder_within(&seq, bad, 0).is_err());
    }

    /// Property: moving between sequences preserves the combined multiset
    #[test]
    fn move_between_preserves_elements(
        (source, from, _) in sequence_and_indices(),
        dest in prop::collection::vec(any::<u16>(), 0..24),
        to in 0usize..40,
    ) {
        let (new_source, new_dest) = move_between(&source, &dest, from, to).unwrap();

        prop_assert_eq!(new_source.len() + 1, source.len());
        prop_assert_eq!(new_dest.len(), dest.len() + 1);
        prop_assert_eq!(new_dest[to.min(dest.len())], source[from]);

        let before: Vec<u16> = source.iter().chain(dest.iter()).copied().collect();
        let after: Vec<u16> = new_source.iter().chain(new_dest.iter()).copied().collect();
        prop_assert_eq!(sorted(after), sorted(before));
    }
}
