//! Flipbook Frame Model
//!
//! Defines the core data contracts for a frame-by-frame animation:
//! - **Snapshot:** The serialized stroke list produced by the drawing surface
//! - **Frame store:** The ordered frame sequence, active frame, and keyframes
//! - **Undo ledger:** Bounded history scoped to the active frame
//!
//! Stroke coordinates are canvas pixels exactly as the drawing surface
//! reported them; nothing in this crate rescales geometry.

pub mod snapshot;
pub mod store;
pub mod undo;

pub use snapshot::*;
pub use store::*;
pub use undo::*;
