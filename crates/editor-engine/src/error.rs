//! Errors returned by editor operations.

use flipbook_common::error::FlipbookError;
use flipbook_frame_model::store::StoreError;
use flipbook_render_engine::export::ExportError;

/// Errors surfaced to callers of the editor.
#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    #[error("Frame {index} is out of range (sequence has {len} frames)")]
    FrameOutOfRange { index: usize, len: usize },

    #[error("Invalid frame rate: {fps}")]
    InvalidFps { fps: u32 },

    #[error(transparent)]
    Config(#[from] FlipbookError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error("Editor session has shut down")]
    SessionClosed,
}

/// Result type alias using EditorError.
pub type EditorResult<T> = Result<T, EditorError>;

impl From<StoreError> for EditorError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::OutOfRange { index, len } => Self::FrameOutOfRange { index, len },
        }
    }
}
