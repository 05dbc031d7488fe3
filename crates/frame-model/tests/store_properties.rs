use flipbook_frame_model::{FrameStore, Snapshot, UndoLedger};
use proptest::prelude::*;

proptest! {
    #[test]
    fn apply_keeps_active_frame_in_range(
        initial in 1usize..40,
        active in 0usize..40,
        pending in 0usize..60,
    ) {
        let mut store = FrameStore::new(initial, 50);
        let _ = store.set_active_frame(active.min(initial - 1));
        store.set_pending_frame_count(pending);
        store.apply_pending_frame_count();

        prop_assert!(store.active_frame() < store.num_frames());
        prop_assert_eq!(store.num_frames(), pending.clamp(1, 50));
        prop_assert!(store.keyframes().iter().all(|&k| k < store.num_frames()));
    }

    #[test]
    fn apply_with_unchanged_count_is_idempotent(
        len in 1usize..30,
        active in 0usize..30,
        contents in proptest::collection::vec(proptest::option::of("[a-z]{1,4}"), 0..30),
    ) {
        let mut store = FrameStore::new(len, 120);
        store.set_frames(
            contents
                .into_iter()
                .map(|c| c.map(Snapshot::new).unwrap_or_default()),
        );
        let _ = store.set_active_frame(active.min(len - 1));
        let before = store.clone();

        let outcome = store.apply_pending_frame_count();

        prop_assert_eq!(&store, &before);
        prop_assert_eq!(outcome.active_clamped_from, None);
        prop_assert!(outcome.dropped_keyframes.is_empty());
    }

    #[test]
    fn ledger_never_exceeds_depth(
        depth in 1usize..6,
        saves in proptest::collection::vec("[a-z]{1,3}", 0..20),
    ) {
        let mut ledger = UndoLedger::new(depth);
        for s in saves {
            ledger.push(Snapshot::new(s));
            prop_assert!(ledger.states().len() <= depth);
        }
    }

    #[test]
    fn toggling_twice_restores_membership(len in 1usize..30, index in 0usize..30) {
        let mut store = FrameStore::new(len, 120);
        let before = store.keyframes().clone();
        if index < len {
            prop_assert!(store.toggle_keyframe(index).unwrap());
            prop_assert!(!store.toggle_keyframe(index).unwrap());
        } else {
            prop_assert!(store.toggle_keyframe(index).is_err());
        }
        prop_assert_eq!(store.keyframes(), &before);
    }
}
