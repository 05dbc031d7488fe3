//! Flipbook Render Engine
//!
//! Everything that turns snapshots into pixels or pixels into files:
//! reference overlays for the drawing surface and the animated export.
//!
//! # Export Pipeline
//!
//! ```text
//! frames ──┐
//!          ├── drop blank frames
//!          │         │
//!          │         ├── rasterize (fixed canvas, frame order)
//!          │         │         │
//! fps ─────┘         │         ├── encode (delay = 1000/fps ms)
//!                    │         │         │
//!                    ▼         ▼         ▼
//!                                   animation.gif
//! ```

pub mod color;
pub mod compositor;
pub mod export;
pub mod raster;

pub use compositor::*;
pub use export::*;
pub use raster::*;
