//! Show the reference overlays for one frame.

use std::path::PathBuf;

use anyhow::Context;

use flipbook_common::config::AppConfig;
use flipbook_render_engine::compositor::OverlayKind;

use crate::sequence::SequenceFile;

pub fn run(path: PathBuf, frame: usize, config: &AppConfig) -> anyhow::Result<()> {
    let mut editor = SequenceFile::load(&path)?.into_editor(config, None)?;
    editor
        .set_active_frame(frame)
        .with_context(|| format!("Cannot edit frame {frame}"))?;

    let layers = editor.overlays();
    println!("Overlays for frame {frame} of {}:", editor.num_frames());
    if layers.is_empty() {
        println!("  (none)");
    }

    for layer in &layers {
        let kind = match layer.kind {
            OverlayKind::OnionSkin => "onion-skin",
            OverlayKind::Keyframe => "keyframe",
        };
        let strokes = match layer.snapshot.parse() {
            Ok(doc) => format!("{} stroke(s)", doc.lines.len()),
            Err(_) => "unreadable".to_string(),
        };
        println!(
            "  frame {:>3}  {:<10}  opacity {:.2}  {}",
            layer.index, kind, layer.opacity, strokes
        );
    }

    Ok(())
}
