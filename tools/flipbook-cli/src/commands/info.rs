//! Show sequence information.

use std::path::PathBuf;

use flipbook_common::config::AppConfig;

use crate::sequence::SequenceFile;

pub fn run(path: PathBuf, config: &AppConfig) -> anyhow::Result<()> {
    let editor = SequenceFile::load(&path)?.into_editor(config, None)?;
    let store = editor.store();

    let drawn: Vec<usize> = store.non_blank_indices().collect();
    let keyframes: Vec<usize> = store.keyframes().iter().copied().collect();

    println!("Sequence: {}", path.display());
    println!("  Frames: {}", store.num_frames());
    println!("  Drawn: {} {:?}", drawn.len(), drawn);
    println!("  Blank: {}", store.num_frames() - drawn.len());
    println!("  Keyframes: {keyframes:?}");
    println!("  FPS: {}", editor.fps());
    println!();

    let settings = editor.export_settings();
    println!("Export:");
    if store.is_empty() {
        println!("  Nothing to export (all frames are blank)");
    } else {
        println!(
            "  {} frame(s) at {}x{}, {:.1} ms per frame -> {}",
            drawn.len(),
            settings.width,
            settings.height(),
            1000.0 / editor.fps() as f64,
            settings.file_name
        );
    }

    Ok(())
}
