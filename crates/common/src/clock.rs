//! Clock and timing utilities for the playback loop.
//!
//! Playback timestamps are monotonic nanoseconds relative to a session
//! epoch. This module provides:
//! - The session clock that produces those timestamps
//! - The rate gate that decides whether a tick is late enough to advance

use std::time::Instant;

/// Monotonic nanoseconds since a session epoch.
pub type TimestampNs = u64;

const NANOS_PER_SEC: u64 = 1_000_000_000;

/// A session clock that provides monotonic timestamps relative to
/// a fixed epoch (the moment the editing session started).
#[derive(Debug, Clone)]
pub struct SessionClock {
    epoch: Instant,

    /// Wall-clock time at epoch (RFC 3339).
    epoch_wall: String,
}

impl SessionClock {
    /// Create a clock anchored to a known instant.
    pub fn from_epoch(epoch: Instant) -> Self {
        Self {
            epoch,
            epoch_wall: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Nanoseconds between the epoch and `instant` (zero if earlier).
    pub fn ns_at(&self, instant: Instant) -> TimestampNs {
        instant.saturating_duration_since(self.epoch).as_nanos() as u64
    }

    /// Wall-clock time at session start.
    pub fn epoch_wall(&self) -> &str {
        &self.epoch_wall
    }

    /// Convert a nanosecond value to milliseconds.
    pub fn ns_to_ms(ns: u64) -> f64 {
        ns as f64 / 1_000_000.0
    }
}

/// Elapsed-time gate for frame advances.
///
/// The gate is armed with the time playback started. A tick only passes
/// once at least one interval has elapsed since the last pass; the stored
/// timestamp moves only when a tick passes, so ticks that arrive early
/// never shift the schedule.
#[derive(Debug, Clone)]
pub struct RateGate {
    interval_ns: u64,
    last_pass_ns: Option<TimestampNs>,
}

impl RateGate {
    /// Create a disarmed gate targeting `rate_hz` passes per second.
    ///
    /// A rate of zero is treated as one pass per second; callers validate
    /// rates before reaching this point.
    pub fn new(rate_hz: u32) -> Self {
        Self {
            interval_ns: Self::interval_for(rate_hz),
            last_pass_ns: None,
        }
    }

    fn interval_for(rate_hz: u32) -> u64 {
        NANOS_PER_SEC / rate_hz.max(1) as u64
    }

    /// Start measuring from `now_ns`.
    pub fn arm(&mut self, now_ns: TimestampNs) {
        self.last_pass_ns = Some(now_ns);
    }

    /// Forget the last pass. The next `arm` starts a fresh schedule.
    pub fn disarm(&mut self) {
        self.last_pass_ns = None;
    }

    /// Change the rate without touching the last pass timestamp.
    pub fn set_rate(&mut self, rate_hz: u32) {
        self.interval_ns = Self::interval_for(rate_hz);
    }

    /// Returns true, and records `now_ns` as the last pass, when at least
    /// one interval has elapsed since the previous pass. A disarmed gate
    /// never passes.
    pub fn try_pass(&mut self, now_ns: TimestampNs) -> bool {
        match self.last_pass_ns {
            Some(last) if now_ns.saturating_sub(last) >= self.interval_ns => {
                self.last_pass_ns = Some(now_ns);
                true
            }
            _ => false,
        }
    }

    /// Timestamp of the last pass (or of arming).
    pub fn last_pass_ns(&self) -> Option<TimestampNs> {
        self.last_pass_ns
    }
}
