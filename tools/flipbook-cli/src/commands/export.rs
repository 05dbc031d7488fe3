//! Export a sequence to an animated GIF.

use std::path::PathBuf;

use anyhow::Context;

use flipbook_common::config::AppConfig;
use flipbook_editor_engine::EditorSession;
use flipbook_render_engine::export::{ExportProgress, GifFrameEncoder};

use crate::sequence::SequenceFile;

pub async fn run(
    path: PathBuf,
    output: Option<PathBuf>,
    fps: Option<u32>,
    config: &AppConfig,
) -> anyhow::Result<()> {
    println!("Exporting sequence at: {}", path.display());

    let editor = SequenceFile::load(&path)?.into_editor(config, fps)?;
    let output_path = output.unwrap_or_else(|| PathBuf::from(&config.export.file_name));

    println!("  Output: {}", output_path.display());
    println!(
        "  Canvas: {}x{}",
        config.export.width,
        config.export.height()
    );
    println!("  FPS: {}", editor.fps());

    let session = EditorSession::spawn(editor, &config.playback);
    let handle = session.handle();

    let progress_cb: Box<dyn Fn(ExportProgress) + Send> = Box::new(|p| {
        print!(
            "\r  Progress: {:.1}% ({}/{} frames)  ",
            p.progress * 100.0,
            p.frames_rendered,
            p.total_frames,
        );
    });

    let result = handle
        .export_with_progress(Box::new(GifFrameEncoder::default()), Some(progress_cb))
        .await;
    session.shutdown().await;

    let artifact = match result {
        Ok(artifact) => artifact,
        Err(e) => {
            println!("\nExport failed: {e}");
            return Err(e.into());
        }
    };

    std::fs::write(&output_path, &artifact.bytes)
        .with_context(|| format!("Failed to write {}", output_path.display()))?;

    println!(
        "\nExport complete: {} ({} frames, {} bytes, {:.1} ms per frame)",
        output_path.display(),
        artifact.frame_count,
        artifact.bytes.len(),
        artifact.delay_ms
    );
    Ok(())
}
