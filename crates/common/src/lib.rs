//! Flipbook Common Utilities
//!
//! Shared infrastructure for all Flipbook crates:
//! - Error types and result aliases
//! - Session clock and the elapsed-time rate gate used by playback
//! - Tracing/logging initialization
//! - Configuration loading

pub mod clock;
pub mod config;
pub mod error;
pub mod logging;

pub use clock::*;
pub use config::*;
pub use error::*;
