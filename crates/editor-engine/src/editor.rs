//! The editor: one editing session's state and its single dispatch point.

use std::collections::BTreeSet;

use serde::Serialize;

use flipbook_common::clock::TimestampNs;
use flipbook_common::config::{AppConfig, ExportSettings, OverlayStyle};
use flipbook_frame_model::snapshot::Snapshot;
use flipbook_frame_model::store::{FrameStore, ResizeOutcome};
use flipbook_frame_model::undo::UndoLedger;
use flipbook_render_engine::compositor::{check_style, compose_overlays, OverlayLayer};
use flipbook_render_engine::export::{
    render_export, ExportArtifact, ExportGuard, ExportRequest, ExportTicket, FrameEncoder,
    ProgressCallback,
};

use crate::action::Action;
use crate::error::EditorResult;
use crate::playback::{Playback, PlaybackPhase};

/// Owns the frame store, the undo ledger, playback state and the export
/// guard for one editing session.
#[derive(Debug)]
pub struct Editor {
    store: FrameStore,
    ledger: UndoLedger,
    playback: Playback,
    export_guard: ExportGuard,
    overlay_style: OverlayStyle,
    export_settings: ExportSettings,
}

/// Point-in-time copy of the editor state, for presentation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EditorView {
    pub frames: Vec<Snapshot>,
    pub active_frame: usize,
    pub num_frames: usize,
    pub pending_frame_count: usize,
    pub keyframes: BTreeSet<usize>,
    pub playback: PlaybackPhase,
    pub fps: u32,
    pub can_undo: bool,
    pub can_apply_frame_count: bool,
    pub is_empty: bool,
    pub is_exporting: bool,
}

impl Default for Editor {
    fn default() -> Self {
        let config = AppConfig::default();
        Self::assemble(&config, Playback::default())
    }
}

impl Editor {
    /// A fresh session shaped by `config`.
    pub fn new(config: &AppConfig) -> EditorResult<Self> {
        check_style(&config.overlay)?;
        let playback = Playback::new(config.editor.fps)?;
        Ok(Self::assemble(config, playback))
    }

    fn assemble(config: &AppConfig, playback: Playback) -> Self {
        let store = FrameStore::new(config.editor.frame_count, config.editor.max_frames);
        tracing::debug!(
            frames = store.num_frames(),
            fps = playback.fps(),
            undo_depth = config.editor.undo_depth,
            "Editor created"
        );
        Self {
            store,
            ledger: UndoLedger::new(config.editor.undo_depth),
            playback,
            export_guard: ExportGuard::new(),
            overlay_style: config.overlay.clone(),
            export_settings: config.export.clone(),
        }
    }

    /// Apply one action. Every state change goes through here.
    pub fn dispatch(&mut self, action: Action) -> EditorResult<()> {
        tracing::trace!(action = action.label(), "Dispatch");
        match action {
            Action::SetFrameData { index, snapshot } => {
                self.set_frame_data(index, snapshot);
            }
            Action::SetFrames(snapshots) => self.set_frames(snapshots),
            Action::SetActiveFrame(index) => self.set_active_frame(index)?,
            Action::NextFrame => self.next_frame(),
            Action::PrevFrame => self.prev_frame(),
            Action::SetPlaying { playing, now_ns } => self.set_playing(playing, now_ns),
            Action::Tick { now_ns } => {
                self.tick(now_ns);
            }
            Action::SetPendingFrameCount(count) => self.set_pending_frame_count(count),
            Action::ApplyFrameCount => {
                self.apply_pending_frame_count();
            }
            Action::SetFps(fps) => self.set_fps(fps)?,
            Action::SaveDrawingState(snapshot) => self.save_drawing_state(snapshot),
            Action::Undo => {
                self.undo();
            }
            Action::ToggleKeyframe(index) => {
                self.toggle_keyframe(index)?;
            }
        }
        Ok(())
    }

    // Frames

    /// Overwrite a frame without recording undo history. Out-of-range
    /// indices are ignored. Returns whether the frame was written.
    pub fn set_frame_data(&mut self, index: usize, snapshot: Snapshot) -> bool {
        self.store.set_frame_data(index, snapshot)
    }

    /// Load snapshots into frames 0.. in order.
    pub fn set_frames(&mut self, snapshots: Vec<Snapshot>) {
        self.store.set_frames(snapshots);
    }

    /// Make `index` the active frame and start a fresh undo history for it.
    pub fn set_active_frame(&mut self, index: usize) -> EditorResult<()> {
        self.store.set_active_frame(index)?;
        self.ledger.reset(index, self.store.active_snapshot());
        Ok(())
    }

    pub fn next_frame(&mut self) {
        self.step_to(self.store.next_index());
    }

    pub fn prev_frame(&mut self) {
        self.step_to(self.store.prev_index());
    }

    fn step_to(&mut self, index: usize) {
        // Neighbour indices are always in range.
        if let Err(e) = self.set_active_frame(index) {
            tracing::warn!(error = %e, "Frame step rejected");
        }
    }

    // Frame count

    pub fn set_pending_frame_count(&mut self, count: usize) {
        self.store.set_pending_frame_count(count);
    }

    /// Commit the proposed frame count. Playback always stops.
    pub fn apply_pending_frame_count(&mut self) -> ResizeOutcome {
        self.playback.stop();
        let outcome = self.store.apply_pending_frame_count();
        if outcome.active_clamped_from.is_some() {
            self.ledger
                .reset(self.store.active_frame(), self.store.active_snapshot());
        }
        tracing::info!(
            from = outcome.previous_len,
            to = outcome.new_len,
            active = self.store.active_frame(),
            dropped_keyframes = outcome.dropped_keyframes.len(),
            "Frame count applied"
        );
        outcome
    }

    // Undo

    /// Commit a drawing gesture on the active frame and record it for undo.
    pub fn save_drawing_state(&mut self, snapshot: Snapshot) {
        self.store.write_active(snapshot.clone());
        self.ledger.push(snapshot);
    }

    /// Restore the active frame's previous saved state. Returns false when
    /// there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        match self.ledger.undo() {
            Some(restored) => {
                self.store.write_active(restored);
                true
            }
            None => false,
        }
    }

    // Keyframes

    /// Flip keyframe membership. Returns whether `index` is now a keyframe.
    pub fn toggle_keyframe(&mut self, index: usize) -> EditorResult<bool> {
        let is_keyframe = self.store.toggle_keyframe(index)?;
        tracing::debug!(index, is_keyframe, "Keyframe toggled");
        Ok(is_keyframe)
    }

    // Playback

    pub fn set_playing(&mut self, playing: bool, now_ns: TimestampNs) {
        if playing {
            self.playback.start(now_ns);
        } else {
            self.playback.stop();
        }
    }

    pub fn toggle_playback(&mut self, now_ns: TimestampNs) {
        let playing = !self.playback.is_playing();
        self.set_playing(playing, now_ns);
    }

    pub fn set_fps(&mut self, fps: u32) -> EditorResult<()> {
        self.playback.set_fps(fps)?;
        tracing::debug!(fps, "Frame rate changed");
        Ok(())
    }

    /// Scheduler wake-up. Advances to the next frame (wrapping) when enough
    /// time has passed; returns whether it did.
    pub fn tick(&mut self, now_ns: TimestampNs) -> bool {
        if !self.playback.should_advance(now_ns) {
            return false;
        }
        let next = self.store.next_index();
        self.step_to(next);
        tracing::trace!(frame = next, now_ns, "Playback advanced");
        true
    }

    // Overlays and export

    /// Reference layers for the active frame, in render order.
    pub fn overlays(&self) -> Vec<OverlayLayer> {
        compose_overlays(&self.store, self.playback.is_playing(), &self.overlay_style)
    }

    /// Claim the export guard and copy the frames to export. The guard is
    /// held until the returned ticket is dropped.
    pub fn begin_export(&self) -> EditorResult<(ExportRequest, ExportTicket)> {
        let ticket = self.export_guard.try_begin()?;
        let request = ExportRequest::from_frames(
            self.store.frames(),
            self.playback.fps(),
            &self.export_settings,
        )?;
        Ok((request, ticket))
    }

    /// Run a complete export on the current thread.
    pub fn export_with(
        &self,
        encoder: &mut dyn FrameEncoder,
        progress: Option<&ProgressCallback>,
    ) -> EditorResult<ExportArtifact> {
        let (request, _ticket) = self.begin_export()?;
        Ok(render_export(&request, encoder, progress)?)
    }

    // Accessors

    pub fn store(&self) -> &FrameStore {
        &self.store
    }

    pub fn ledger(&self) -> &UndoLedger {
        &self.ledger
    }

    pub fn playback(&self) -> &Playback {
        &self.playback
    }

    pub fn frames(&self) -> &[Snapshot] {
        self.store.frames()
    }

    pub fn active_frame(&self) -> usize {
        self.store.active_frame()
    }

    pub fn num_frames(&self) -> usize {
        self.store.num_frames()
    }

    pub fn is_playing(&self) -> bool {
        self.playback.is_playing()
    }

    pub fn fps(&self) -> u32 {
        self.playback.fps()
    }

    pub fn can_undo(&self) -> bool {
        self.ledger.can_undo()
    }

    pub fn is_exporting(&self) -> bool {
        self.export_guard.is_exporting()
    }

    pub fn export_settings(&self) -> &ExportSettings {
        &self.export_settings
    }

    pub fn view(&self) -> EditorView {
        EditorView {
            frames: self.store.frames().to_vec(),
            active_frame: self.store.active_frame(),
            num_frames: self.store.num_frames(),
            pending_frame_count: self.store.pending_frame_count(),
            keyframes: self.store.keyframes().clone(),
            playback: self.playback.phase(),
            fps: self.playback.fps(),
            can_undo: self.ledger.can_undo(),
            can_apply_frame_count: self.store.can_apply_frame_count(),
            is_empty: self.store.is_empty(),
            is_exporting: self.export_guard.is_exporting(),
        }
    }
}
