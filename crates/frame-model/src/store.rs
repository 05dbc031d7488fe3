//! The frame store: ordered frame snapshots, the active frame, and the
//! keyframe marker set.
//!
//! The store size only changes through [`FrameStore::apply_pending_frame_count`];
//! editing the proposed count never resizes anything.

use std::collections::BTreeSet;

use crate::snapshot::Snapshot;

/// Errors raised by frame store operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("Frame {index} is out of range (sequence has {len} frames)")]
    OutOfRange { index: usize, len: usize },
}

/// What an applied frame count changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResizeOutcome {
    pub previous_len: usize,
    pub new_len: usize,
    /// Set when the active frame had to move to stay in range.
    pub active_clamped_from: Option<usize>,
    /// Keyframes that pointed past the new end.
    pub dropped_keyframes: Vec<usize>,
}

/// Ordered per-frame snapshots with an active frame and keyframe set.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameStore {
    frames: Vec<Snapshot>,
    active: usize,
    keyframes: BTreeSet<usize>,
    pending_frame_count: usize,
    max_frames: usize,
}

impl FrameStore {
    /// A store of `frame_count` blank frames. `frame_count` is clamped to
    /// `[1, max_frames]`.
    pub fn new(frame_count: usize, max_frames: usize) -> Self {
        let max_frames = max_frames.max(1);
        let frame_count = frame_count.clamp(1, max_frames);
        Self {
            frames: vec![Snapshot::blank(); frame_count],
            active: 0,
            keyframes: BTreeSet::new(),
            pending_frame_count: frame_count,
            max_frames,
        }
    }

    pub fn frames(&self) -> &[Snapshot] {
        &self.frames
    }

    pub fn frame(&self, index: usize) -> Option<&Snapshot> {
        self.frames.get(index)
    }

    /// Committed frame count.
    pub fn num_frames(&self) -> usize {
        self.frames.len()
    }

    pub fn active_frame(&self) -> usize {
        self.active
    }

    pub fn active_snapshot(&self) -> &Snapshot {
        &self.frames[self.active]
    }

    pub fn keyframes(&self) -> &BTreeSet<usize> {
        &self.keyframes
    }

    pub fn is_keyframe(&self, index: usize) -> bool {
        self.keyframes.contains(&index)
    }

    pub fn pending_frame_count(&self) -> usize {
        self.pending_frame_count
    }

    pub fn max_frames(&self) -> usize {
        self.max_frames
    }

    /// Whether applying the pending count would change anything.
    pub fn can_apply_frame_count(&self) -> bool {
        self.pending_frame_count != self.frames.len()
    }

    /// True when every frame is blank.
    pub fn is_empty(&self) -> bool {
        self.frames.iter().all(Snapshot::is_blank)
    }

    /// Indices of frames that carry content, in order.
    pub fn non_blank_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.frames
            .iter()
            .enumerate()
            .filter(|(_, s)| !s.is_blank())
            .map(|(i, _)| i)
    }

    fn check(&self, index: usize) -> Result<(), StoreError> {
        if index < self.frames.len() {
            Ok(())
        } else {
            Err(StoreError::OutOfRange {
                index,
                len: self.frames.len(),
            })
        }
    }

    /// Overwrite a frame's content. Out-of-range indices are ignored.
    ///
    /// Returns whether the frame was written.
    pub fn set_frame_data(&mut self, index: usize, snapshot: Snapshot) -> bool {
        match self.frames.get_mut(index) {
            Some(slot) => {
                *slot = snapshot;
                true
            }
            None => {
                tracing::debug!(
                    index,
                    len = self.frames.len(),
                    "Ignoring frame data for missing frame"
                );
                false
            }
        }
    }

    /// Load frames in order starting at index 0; extra entries are ignored.
    pub fn set_frames<I>(&mut self, snapshots: I)
    where
        I: IntoIterator<Item = Snapshot>,
    {
        for (index, snapshot) in snapshots.into_iter().enumerate() {
            self.set_frame_data(index, snapshot);
        }
    }

    /// Overwrite the active frame's content.
    pub fn write_active(&mut self, snapshot: Snapshot) {
        let active = self.active;
        self.frames[active] = snapshot;
    }

    /// Move the active frame. The index must be in range.
    pub fn set_active_frame(&mut self, index: usize) -> Result<(), StoreError> {
        self.check(index)?;
        self.active = index;
        Ok(())
    }

    /// Index after the active frame, wrapping to 0.
    pub fn next_index(&self) -> usize {
        if self.active + 1 >= self.frames.len() {
            0
        } else {
            self.active + 1
        }
    }

    /// Index before the active frame, wrapping to the last frame.
    pub fn prev_index(&self) -> usize {
        if self.active == 0 {
            self.frames.len() - 1
        } else {
            self.active - 1
        }
    }

    /// Record a proposed frame count, clamped to `[1, max_frames]`.
    pub fn set_pending_frame_count(&mut self, count: usize) {
        self.pending_frame_count = count.clamp(1, self.max_frames);
    }

    /// Commit the proposed frame count: grow with blank frames or truncate
    /// from the tail, keep the active frame in range, and drop keyframes
    /// past the end.
    pub fn apply_pending_frame_count(&mut self) -> ResizeOutcome {
        let previous_len = self.frames.len();
        let new_len = self.pending_frame_count;

        self.frames.resize(new_len, Snapshot::blank());

        let active_clamped_from = if self.active >= new_len {
            let from = self.active;
            self.active = new_len - 1;
            Some(from)
        } else {
            None
        };

        let dropped_keyframes: Vec<usize> =
            self.keyframes.split_off(&new_len).into_iter().collect();

        ResizeOutcome {
            previous_len,
            new_len,
            active_clamped_from,
            dropped_keyframes,
        }
    }

    /// Flip keyframe membership for `index`. Returns the new membership.
    pub fn toggle_keyframe(&mut self, index: usize) -> Result<bool, StoreError> {
        self.check(index)?;
        if self.keyframes.remove(&index) {
            Ok(false)
        } else {
            self.keyframes.insert(index);
            Ok(true)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with_content() -> FrameStore {
        let mut store = FrameStore::new(12, 120);
        store.set_frame_data(3, Snapshot::new("a"));
        store.set_frame_data(9, Snapshot::new("b"));
        store
    }

    #[test]
    fn test_new_store_is_blank() {
        let store = FrameStore::new(12, 120);
        assert_eq!(store.num_frames(), 12);
        assert_eq!(store.pending_frame_count(), 12);
        assert_eq!(store.active_frame(), 0);
        assert!(store.is_empty());
        assert!(!store.can_apply_frame_count());
    }

    #[test]
    fn test_set_frame_data_out_of_range_is_noop() {
        let mut store = FrameStore::new(3, 120);
        assert!(!store.set_frame_data(3, Snapshot::new("x")));
        assert!(store.is_empty());
        assert_eq!(store.num_frames(), 3);
    }

    #[test]
    fn test_set_frames_loads_in_order() {
        let mut store = FrameStore::new(2, 120);
        store.set_frames(vec![
            Snapshot::new("a"),
            Snapshot::new("b"),
            Snapshot::new("c"),
        ]);
        assert_eq!(store.frame(0).unwrap().as_str(), "a");
        assert_eq!(store.frame(1).unwrap().as_str(), "b");
        assert_eq!(store.num_frames(), 2);
    }

    #[test]
    fn test_set_active_frame_rejects_out_of_range() {
        let mut store = FrameStore::new(4, 120);
        assert_eq!(
            store.set_active_frame(4),
            Err(StoreError::OutOfRange { index: 4, len: 4 })
        );
        assert_eq!(store.active_frame(), 0);
    }

    #[test]
    fn test_neighbour_indices_wrap() {
        let mut store = FrameStore::new(4, 120);
        assert_eq!(store.prev_index(), 3);
        assert_eq!(store.next_index(), 1);
        store.set_active_frame(3).unwrap();
        assert_eq!(store.next_index(), 0);
        assert_eq!(store.prev_index(), 2);
    }

    #[test]
    fn test_pending_count_does_not_resize() {
        let mut store = store_with_content();
        store.set_pending_frame_count(5);
        assert_eq!(store.num_frames(), 12);
        assert!(store.can_apply_frame_count());
    }

    #[test]
    fn test_pending_count_is_clamped() {
        let mut store = FrameStore::new(12, 120);
        store.set_pending_frame_count(0);
        assert_eq!(store.pending_frame_count(), 1);
        store.set_pending_frame_count(500);
        assert_eq!(store.pending_frame_count(), 120);
    }

    #[test]
    fn test_shrink_truncates_clamps_and_drops_keyframes() {
        let mut store = store_with_content();
        store.set_active_frame(9).unwrap();
        store.toggle_keyframe(2).unwrap();
        store.toggle_keyframe(7).unwrap();

        store.set_pending_frame_count(5);
        let outcome = store.apply_pending_frame_count();

        assert_eq!(store.num_frames(), 5);
        assert_eq!(store.active_frame(), 4);
        assert_eq!(outcome.active_clamped_from, Some(9));
        assert_eq!(outcome.dropped_keyframes, vec![7]);
        assert!(store.is_keyframe(2));
        assert!(!store.is_keyframe(7));
        assert_eq!(store.frame(3).unwrap().as_str(), "a");
    }

    #[test]
    fn test_grow_appends_blank_frames() {
        let mut store = store_with_content();
        store.set_pending_frame_count(15);
        let outcome = store.apply_pending_frame_count();

        assert_eq!(outcome.previous_len, 12);
        assert_eq!(store.num_frames(), 15);
        assert!(store.frames()[12..].iter().all(Snapshot::is_blank));
        assert_eq!(store.frame(9).unwrap().as_str(), "b");
    }

    #[test]
    fn test_toggle_keyframe_is_symmetric() {
        let mut store = FrameStore::new(6, 120);
        assert_eq!(store.toggle_keyframe(5), Ok(true));
        assert!(store.is_keyframe(5));
        assert_eq!(store.toggle_keyframe(5), Ok(false));
        assert!(store.keyframes().is_empty());
        assert!(store.toggle_keyframe(6).is_err());
    }

    #[test]
    fn test_write_active() {
        let mut store = FrameStore::new(3, 120);
        store.set_active_frame(2).unwrap();
        store.write_active(Snapshot::new("z"));
        assert_eq!(store.active_snapshot().as_str(), "z");
        assert_eq!(store.non_blank_indices().collect::<Vec<_>>(), vec![2]);
    }
}
