//! Frame-scoped undo ledger.
//!
//! The ledger holds the last few saved states of exactly one frame. It is
//! reset whenever the active frame changes, so history never crosses a
//! frame boundary. The ledger never touches the frame store itself; callers
//! write back whatever [`UndoLedger::undo`] hands them.

use crate::snapshot::Snapshot;

/// Default number of states kept per frame.
pub const DEFAULT_UNDO_DEPTH: usize = 3;

/// Bounded history of saved states for the tracked frame.
#[derive(Debug, Clone, PartialEq)]
pub struct UndoLedger {
    frame_index: Option<usize>,
    states: Vec<Snapshot>,
    depth: usize,
}

impl Default for UndoLedger {
    fn default() -> Self {
        Self::new(DEFAULT_UNDO_DEPTH)
    }
}

impl UndoLedger {
    /// An empty ledger keeping at most `depth` states (minimum 1).
    pub fn new(depth: usize) -> Self {
        Self {
            frame_index: None,
            states: Vec::with_capacity(depth.max(1) + 1),
            depth: depth.max(1),
        }
    }

    /// Frame the ledger currently tracks, if any frame switch has happened.
    pub fn frame_index(&self) -> Option<usize> {
        self.frame_index
    }

    pub fn states(&self) -> &[Snapshot] {
        &self.states
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn can_undo(&self) -> bool {
        !self.states.is_empty()
    }

    /// Start tracking `frame_index`, seeded with its current content.
    /// A blank frame starts with an empty history.
    pub fn reset(&mut self, frame_index: usize, current: &Snapshot) {
        self.frame_index = Some(frame_index);
        self.states.clear();
        if !current.is_blank() {
            self.states.push(current.clone());
        }
    }

    /// Record a saved state, evicting the oldest beyond the depth.
    pub fn push(&mut self, snapshot: Snapshot) {
        self.states.push(snapshot);
        while self.states.len() > self.depth {
            self.states.remove(0);
        }
        tracing::debug!(
            frame = ?self.frame_index,
            undo_depth = self.states.len(),
            "Drawing state saved"
        );
    }

    /// Drop the newest state and return the content the frame should now
    /// show: the new newest state, or blank when none remain.
    ///
    /// Returns `None` when there is nothing to undo.
    pub fn undo(&mut self) -> Option<Snapshot> {
        self.states.pop()?;
        let restored = self.states.last().cloned().unwrap_or_default();
        tracing::debug!(
            frame = ?self.frame_index,
            undo_remaining = self.states.len(),
            "Undo"
        );
        Some(restored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(s: &str) -> Snapshot {
        Snapshot::new(s)
    }

    #[test]
    fn test_new_ledger_is_empty() {
        let ledger = UndoLedger::default();
        assert_eq!(ledger.frame_index(), None);
        assert!(!ledger.can_undo());
        assert_eq!(ledger.depth(), 3);
    }

    #[test]
    fn test_push_evicts_oldest() {
        let mut ledger = UndoLedger::new(3);
        for s in ["a", "b", "c", "d"] {
            ledger.push(snap(s));
        }
        assert_eq!(ledger.states(), &[snap("b"), snap("c"), snap("d")]);
    }

    #[test]
    fn test_undo_walks_back_to_blank() {
        let mut ledger = UndoLedger::new(3);
        ledger.push(snap("a"));
        ledger.push(snap("b"));

        assert_eq!(ledger.undo(), Some(snap("a")));
        assert_eq!(ledger.undo(), Some(Snapshot::blank()));
        assert_eq!(ledger.undo(), None);
    }

    #[test]
    fn test_reset_seeds_with_current_content() {
        let mut ledger = UndoLedger::new(3);
        ledger.push(snap("a"));
        ledger.push(snap("b"));

        ledger.reset(4, &snap("frame4"));
        assert_eq!(ledger.frame_index(), Some(4));
        assert_eq!(ledger.states(), &[snap("frame4")]);

        ledger.reset(5, &Snapshot::blank());
        assert_eq!(ledger.frame_index(), Some(5));
        assert!(ledger.states().is_empty());
    }

    #[test]
    fn test_zero_depth_is_raised_to_one() {
        let mut ledger = UndoLedger::new(0);
        ledger.push(snap("a"));
        ledger.push(snap("b"));
        assert_eq!(ledger.states(), &[snap("b")]);
    }
}
