//! Run timed playback and log every frame advance.

use std::path::PathBuf;
use std::time::Duration;

use tokio::sync::broadcast::error::RecvError;

use flipbook_common::clock::SessionClock;
use flipbook_common::config::AppConfig;
use flipbook_editor_engine::{EditorSession, SessionEvent};

use crate::sequence::SequenceFile;

pub async fn run(
    path: PathBuf,
    fps: Option<u32>,
    secs: f64,
    config: &AppConfig,
) -> anyhow::Result<()> {
    let duration = playback_duration(secs)?;

    let editor = SequenceFile::load(&path)?.into_editor(config, fps)?;
    let fps = editor.fps();
    println!(
        "Playing {} frame(s) at {fps} fps for {secs:.1}s",
        editor.num_frames()
    );

    let session = EditorSession::spawn(editor, &config.playback);
    let handle = session.handle();
    let mut events = handle.subscribe();

    handle.play().await?;
    let deadline = tokio::time::sleep(duration);
    tokio::pin!(deadline);

    let mut advances = 0usize;
    loop {
        tokio::select! {
            _ = &mut deadline => break,
            event = events.recv() => match event {
                Ok(SessionEvent::FrameAdvanced { frame, at_ns }) => {
                    advances += 1;
                    println!("  {:>9.1} ms  frame {frame}", SessionClock::ns_to_ms(at_ns));
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Missed playback events");
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    handle.pause().await?;
    let view = handle.view().await?;
    session.shutdown().await;

    println!(
        "Stopped on frame {} after {advances} advance(s)",
        view.active_frame
    );
    Ok(())
}

fn playback_duration(secs: f64) -> anyhow::Result<Duration> {
    Duration::try_from_secs_f64(secs).map_err(|e| {
        anyhow::anyhow!("Playback duration must be a non-negative number of seconds ({secs}): {e}")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_playback_duration_accepts_plain_seconds() {
        assert_eq!(playback_duration(2.0).unwrap(), Duration::from_secs(2));
        assert_eq!(playback_duration(0.0).unwrap(), Duration::ZERO);
    }

    #[test]
    fn test_playback_duration_rejects_unrepresentable_values() {
        for secs in [-1.0, f64::NAN, f64::INFINITY, 1e30] {
            assert!(playback_duration(secs).is_err(), "{secs} should be rejected");
        }
    }
}
