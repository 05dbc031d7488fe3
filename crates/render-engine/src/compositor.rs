//! Overlay compositor: reference layers drawn around the active frame.
//!
//! Two passes produce the layer list, in render order:
//! 1. Onion skin: the two frames before the active one, farther first, at
//!    increasing opacity. Keyframes are skipped here.
//! 2. Keyframes: every other keyframe with content, recolored to the
//!    highlight color at a fixed opacity.
//!
//! Overlays are render-only. Nothing here writes to the frame store.

use flipbook_common::config::OverlayStyle;
use flipbook_common::error::{FlipbookError, FlipbookResult};
use flipbook_frame_model::snapshot::Snapshot;
use flipbook_frame_model::store::FrameStore;

use crate::color::parse_css_color;

/// Offsets behind the active frame, in emission order.
const ONION_SKIN_OFFSETS: [usize; 2] = [2, 1];

/// Why a layer was emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayKind {
    OnionSkin,
    Keyframe,
}

/// A single translucent, non-interactive reference layer.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayLayer {
    /// Frame the layer was taken from.
    pub index: usize,

    /// Content to draw (recolored for keyframes).
    pub snapshot: Snapshot,

    /// Layer opacity in `[0.0, 1.0]`.
    pub opacity: f32,

    pub kind: OverlayKind,
}

/// Opacity for an onion-skin layer `offset` frames back: `1 / (offset + 2)`
/// rounded to two decimals.
pub fn onion_skin_opacity(offset: usize) -> f32 {
    (100.0 / (offset + 2) as f32).round() / 100.0
}

/// Reject a style whose highlight color cannot be parsed. Opacity bounds
/// are checked with the rest of the config.
pub fn check_style(style: &OverlayStyle) -> FlipbookResult<()> {
    if parse_css_color(&style.highlight_color).is_none() {
        return Err(FlipbookError::config(format!(
            "overlay.highlight_color is not a color: {:?}",
            style.highlight_color
        )));
    }
    Ok(())
}

/// Compute the overlay layers for the store's active frame.
pub fn compose_overlays(
    store: &FrameStore,
    is_playing: bool,
    style: &OverlayStyle,
) -> Vec<OverlayLayer> {
    if is_playing {
        return Vec::new();
    }

    let active = store.active_frame();
    let mut layers = Vec::new();

    for offset in ONION_SKIN_OFFSETS {
        let Some(index) = active.checked_sub(offset) else {
            continue;
        };
        if store.is_keyframe(index) {
            continue;
        }
        if let Some(snapshot) = store.frame(index).filter(|s| !s.is_blank()) {
            layers.push(OverlayLayer {
                index,
                snapshot: snapshot.clone(),
                opacity: onion_skin_opacity(offset),
                kind: OverlayKind::OnionSkin,
            });
        }
    }

    for &index in store.keyframes() {
        if index == active {
            continue;
        }
        if let Some(snapshot) = store.frame(index).filter(|s| !s.is_blank()) {
            layers.push(OverlayLayer {
                index,
                snapshot: snapshot.recolored_or_original(&style.highlight_color),
                opacity: style.keyframe_opacity,
                kind: OverlayKind::Keyframe,
            });
        }
    }

    tracing::trace!(active, layers = layers.len(), "Overlays composed");
    layers
}
