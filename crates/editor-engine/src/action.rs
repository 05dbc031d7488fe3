//! Actions accepted by [`Editor::dispatch`](crate::editor::Editor::dispatch).

use flipbook_common::clock::TimestampNs;
use flipbook_frame_model::snapshot::Snapshot;

/// A single state mutation. Every change to an editing session is one of
/// these, applied in order through one dispatch point.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Overwrite a frame without touching undo history.
    SetFrameData { index: usize, snapshot: Snapshot },

    /// Bulk load frames from index 0.
    SetFrames(Vec<Snapshot>),

    /// Make `index` the active frame.
    SetActiveFrame(usize),

    /// Step forward, wrapping to the first frame.
    NextFrame,

    /// Step back, wrapping to the last frame.
    PrevFrame,

    /// Start or stop playback; `now_ns` arms the rate gate on start.
    SetPlaying { playing: bool, now_ns: TimestampNs },

    /// Scheduler wake-up at `now_ns`.
    Tick { now_ns: TimestampNs },

    /// Propose a frame count (applied later).
    SetPendingFrameCount(usize),

    /// Commit the proposed frame count.
    ApplyFrameCount,

    SetFps(u32),

    /// Commit a finished drawing gesture on the active frame.
    SaveDrawingState(Snapshot),

    Undo,

    ToggleKeyframe(usize),
}

impl Action {
    /// Short label for logging.
    pub fn label(&self) -> &'static str {
        match self {
            Action::SetFrameData { .. } => "set_frame_data",
            Action::SetFrames(_) => "set_frames",
            Action::SetActiveFrame(_) => "set_active_frame",
            Action::NextFrame => "next_frame",
            Action::PrevFrame => "prev_frame",
            Action::SetPlaying { .. } => "set_playing",
            Action::Tick { .. } => "tick",
            Action::SetPendingFrameCount(_) => "set_pending_frame_count",
            Action::ApplyFrameCount => "apply_frame_count",
            Action::SetFps(_) => "set_fps",
            Action::SaveDrawingState(_) => "save_drawing_state",
            Action::Undo => "undo",
            Action::ToggleKeyframe(_) => "toggle_keyframe",
        }
    }
}
