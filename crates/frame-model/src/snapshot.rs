//! Snapshot types for the drawing-surface save format.
//!
//! A snapshot is the serialized content of one frame: a JSON document with
//! a background color and an ordered list of strokes. The engine treats the
//! serialized form as opaque and only parses it to recolor or rasterize.
//! Fields the engine does not model are carried through untouched.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Serialized content of one frame. The empty string is a blank frame.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot(String);

/// Parsed snapshot document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotDocument {
    /// Strokes in paint order.
    #[serde(default)]
    pub lines: Vec<Stroke>,

    /// Canvas background color. Absent means the renderer default.
    #[serde(
        rename = "backgroundColor",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub background_color: Option<String>,

    /// Canvas width the strokes were captured on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,

    /// Canvas height the strokes were captured on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A single brush stroke.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    /// Polyline vertices in canvas pixels.
    pub points: Vec<StrokePoint>,

    /// CSS color string.
    #[serde(rename = "brushColor")]
    pub color: String,

    /// Brush radius; the painted line is twice as wide.
    #[serde(rename = "brushRadius")]
    pub radius: f64,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A stroke vertex.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrokePoint {
    pub x: f64,
    pub y: f64,
}

/// Errors raised while decoding or re-encoding a snapshot.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("Snapshot is blank")]
    Blank,

    #[error("Malformed snapshot: {0}")]
    Malformed(#[from] serde_json::Error),
}

impl Snapshot {
    /// The blank frame.
    pub fn blank() -> Self {
        Self(String::new())
    }

    /// Wrap serialized content as produced by the drawing surface.
    pub fn new(data: impl Into<String>) -> Self {
        Self(data.into())
    }

    /// Serialize a document into a snapshot.
    pub fn from_document(doc: &SnapshotDocument) -> Result<Self, SnapshotError> {
        Ok(Self(serde_json::to_string(doc)?))
    }

    pub fn is_blank(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Decode the stroke list.
    pub fn parse(&self) -> Result<SnapshotDocument, SnapshotError> {
        if self.is_blank() {
            return Err(SnapshotError::Blank);
        }
        Ok(serde_json::from_str(&self.0)?)
    }

    /// Replace every stroke color with `color`, leaving geometry and all
    /// other fields as they were.
    pub fn recolored(&self, color: &str) -> Result<Self, SnapshotError> {
        let mut doc = self.parse()?;
        for stroke in &mut doc.lines {
            stroke.color = color.to_string();
        }
        Self::from_document(&doc)
    }

    /// Like [`Snapshot::recolored`], but a snapshot that cannot be parsed is
    /// returned unchanged after logging the failure.
    pub fn recolored_or_original(&self, color: &str) -> Self {
        match self.recolored(color) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!(error = %e, "Recolor skipped, keeping original snapshot");
                self.clone()
            }
        }
    }
}

impl From<String> for Snapshot {
    fn from(data: String) -> Self {
        Self(data)
    }
}

impl From<&str> for Snapshot {
    fn from(data: &str) -> Self {
        Self(data.to_string())
    }
}

impl SnapshotDocument {
    /// An empty canvas of the given size.
    pub fn empty(width: f64, height: f64) -> Self {
        Self {
            lines: Vec::new(),
            background_color: None,
            width: Some(width),
            height: Some(height),
            extra: Map::new(),
        }
    }
}

impl Stroke {
    /// A stroke through `points` with the given color and brush radius.
    pub fn new(color: impl Into<String>, radius: f64, points: &[(f64, f64)]) -> Self {
        Self {
            points: points.iter().map(|&(x, y)| StrokePoint { x, y }).collect(),
            color: color.into(),
            radius,
            extra: Map::new(),
        }
    }

    /// Painted line width.
    pub fn width(&self) -> f64 {
        self.radius * 2.0
    }
}
