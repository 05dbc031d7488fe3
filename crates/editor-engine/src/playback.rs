//! Playback state machine.
//!
//! ```text
//! Stopped ──start(t)──▶ Playing ──stop()──▶ Stopped
//!                          │
//!                       tick(t): advance iff t - last_advance >= 1e9 / fps
//! ```
//!
//! Ticks arrive at whatever rate the host can manage; only elapsed time
//! decides whether the active frame moves. The rate gate is disarmed on
//! stop so a later start never catches up on time spent stopped.

use flipbook_common::clock::{RateGate, TimestampNs};
use serde::Serialize;

use crate::error::{EditorError, EditorResult};

/// Rate of a new session.
pub const DEFAULT_FPS: u32 = 12;

/// Whether the sequence is playing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackPhase {
    Stopped,
    Playing,
}

/// Playback phase, rate, and the gate deciding when to advance.
#[derive(Debug, Clone)]
pub struct Playback {
    phase: PlaybackPhase,
    fps: u32,
    gate: RateGate,
}

impl Default for Playback {
    fn default() -> Self {
        Self {
            phase: PlaybackPhase::Stopped,
            fps: DEFAULT_FPS,
            gate: RateGate::new(DEFAULT_FPS),
        }
    }
}

impl Playback {
    /// A stopped playback at `fps` frames per second.
    pub fn new(fps: u32) -> EditorResult<Self> {
        if fps == 0 {
            return Err(EditorError::InvalidFps { fps });
        }
        Ok(Self {
            phase: PlaybackPhase::Stopped,
            fps,
            gate: RateGate::new(fps),
        })
    }

    pub fn phase(&self) -> PlaybackPhase {
        self.phase
    }

    pub fn is_playing(&self) -> bool {
        self.phase == PlaybackPhase::Playing
    }

    pub fn fps(&self) -> u32 {
        self.fps
    }

    /// Timestamp of the last advance (or of the start, before the first one).
    pub fn last_advance_ns(&self) -> Option<TimestampNs> {
        self.gate.last_pass_ns()
    }

    /// Enter `Playing`, arming the gate at `now_ns`. Starting while already
    /// playing keeps the existing schedule.
    pub fn start(&mut self, now_ns: TimestampNs) {
        if self.is_playing() {
            return;
        }
        self.phase = PlaybackPhase::Playing;
        self.gate.arm(now_ns);
        tracing::debug!(fps = self.fps, now_ns, "Playback started");
    }

    /// Enter `Stopped`. Returns whether playback was running.
    pub fn stop(&mut self) -> bool {
        let was_playing = self.is_playing();
        self.phase = PlaybackPhase::Stopped;
        self.gate.disarm();
        if was_playing {
            tracing::debug!("Playback stopped");
        }
        was_playing
    }

    /// Change the rate. While playing, the new interval is measured from
    /// the last advance.
    pub fn set_fps(&mut self, fps: u32) -> EditorResult<()> {
        if fps == 0 {
            return Err(EditorError::InvalidFps { fps });
        }
        self.fps = fps;
        self.gate.set_rate(fps);
        Ok(())
    }

    /// Whether a tick at `now_ns` should advance the active frame.
    pub fn should_advance(&mut self, now_ns: TimestampNs) -> bool {
        self.is_playing() && self.gate.try_pass(now_ns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS: u64 = 1_000_000;

    #[test]
    fn test_zero_fps_is_rejected() {
        assert!(matches!(
            Playback::new(0),
            Err(EditorError::InvalidFps { fps: 0 })
        ));
        let mut playback = Playback::new(12).unwrap();
        assert!(playback.set_fps(0).is_err());
        assert_eq!(playback.fps(), 12);
    }

    #[test]
    fn test_stopped_never_advances() {
        let mut playback = Playback::new(12).unwrap();
        assert!(!playback.should_advance(0));
        assert!(!playback.should_advance(10_000 * MS));
    }

    #[test]
    fn test_advance_boundary_at_12_fps() {
        let mut playback = Playback::new(12).unwrap();
        playback.start(0);
        assert!(!playback.should_advance(83 * MS));
        assert!(playback.should_advance(84 * MS));
        assert!(!playback.should_advance(100 * MS));
        assert_eq!(playback.last_advance_ns(), Some(84 * MS));
    }

    #[test]
    fn test_restart_does_not_catch_up() {
        let mut playback = Playback::new(12).unwrap();
        playback.start(0);
        assert!(playback.stop());
        assert!(!playback.stop());

        playback.start(5_000 * MS);
        assert!(!playback.should_advance(5_050 * MS));
        assert!(playback.should_advance(5_084 * MS));
    }

    #[test]
    fn test_start_while_playing_keeps_schedule() {
        let mut playback = Playback::new(12).unwrap();
        playback.start(0);
        playback.start(80 * MS);
        assert!(playback.should_advance(84 * MS));
    }

    #[test]
    fn test_rate_change_measures_from_last_advance() {
        let mut playback = Playback::new(3).unwrap();
        playback.start(0);
        playback.set_fps(24).unwrap();
        assert!(!playback.should_advance(41 * MS));
        assert!(playback.should_advance(42 * MS));
    }
}
