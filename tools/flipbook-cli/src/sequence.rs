//! Sequence files: frame snapshots to bulk-load into an editor.
//!
//! ```json
//! { "frames": ["<snapshot>", ""], "keyframes": [0], "fps": 12 }
//! ```

use std::collections::BTreeSet;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use flipbook_common::config::AppConfig;
use flipbook_editor_engine::Editor;
use flipbook_frame_model::Snapshot;

/// A frame sequence as stored on disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SequenceFile {
    /// One snapshot per frame; an empty string is a blank frame.
    pub frames: Vec<Snapshot>,

    #[serde(default)]
    pub keyframes: Vec<usize>,

    #[serde(default)]
    pub fps: Option<u32>,
}

impl SequenceFile {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read sequence {}", path.display()))?;
        Self::from_json(&content)
            .with_context(|| format!("Failed to parse sequence {}", path.display()))
    }

    pub fn from_json(content: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Build an editor holding this sequence. `fps` takes precedence over
    /// the file's rate, which takes precedence over the config.
    pub fn into_editor(self, config: &AppConfig, fps: Option<u32>) -> anyhow::Result<Editor> {
        let mut config = config.clone();
        let max_frames = config.editor.max_frames;
        if self.frames.len() > max_frames {
            tracing::warn!(
                frames = self.frames.len(),
                max_frames,
                "Sequence is longer than the frame limit; extra frames are ignored"
            );
        }
        config.editor.frame_count = self.frames.len().clamp(1, max_frames.max(1));
        if let Some(fps) = fps.or(self.fps) {
            config.editor.fps = fps;
        }

        let mut editor = Editor::new(&config)?;
        editor.set_frames(self.frames);

        let keyframes: BTreeSet<usize> = self.keyframes.into_iter().collect();
        for index in keyframes {
            editor
                .toggle_keyframe(index)
                .with_context(|| format!("Invalid keyframe {index}"))?;
        }

        tracing::debug!(
            frames = editor.num_frames(),
            keyframes = editor.store().keyframes().len(),
            fps = editor.fps(),
            "Sequence loaded"
        );
        Ok(editor)
    }
}
