//! Export pipeline: non-blank frames to an animated image.
//!
//! ```text
//! frames ── filter blank ── rasterize (in order) ── encode (uniform delay) ── artifact
//! ```
//!
//! Only one export may be in flight at a time; [`ExportGuard`] enforces
//! that. The guard is released when the [`ExportTicket`] is dropped, so every
//! exit path (success, error, or a panicking encoder) frees it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, Frame, RgbaImage};

use flipbook_common::config::ExportSettings;
use flipbook_common::error::{FlipbookError, FlipbookResult};
use flipbook_frame_model::snapshot::Snapshot;

use crate::raster::Rasterizer;

/// Errors surfaced to the caller of an export.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("No frames to export")]
    NothingToExport,

    #[error("An export is already in progress")]
    AlreadyExporting,

    #[error("Invalid frame rate: {fps}")]
    InvalidFps { fps: u32 },

    #[error("Rasterization failed: {0}")]
    Rasterize(#[source] FlipbookError),

    #[error("Encoding failed: {0}")]
    Encode(#[source] FlipbookError),

    #[error("Export task failed: {message}")]
    Task { message: String },
}

/// Everything needed to render an export, captured when it was requested.
#[derive(Debug, Clone)]
pub struct ExportRequest {
    /// Non-blank snapshots in frame order.
    pub snapshots: Vec<Snapshot>,

    /// Store index of each snapshot.
    pub source_indices: Vec<usize>,

    pub fps: u32,

    pub settings: ExportSettings,
}

impl ExportRequest {
    /// Copy the non-blank frames out of `frames`.
    pub fn from_frames(
        frames: &[Snapshot],
        fps: u32,
        settings: &ExportSettings,
    ) -> Result<Self, ExportError> {
        if fps == 0 {
            return Err(ExportError::InvalidFps { fps });
        }

        let (source_indices, snapshots): (Vec<usize>, Vec<Snapshot>) = frames
            .iter()
            .enumerate()
            .filter(|(_, s)| !s.is_blank())
            .map(|(i, s)| (i, s.clone()))
            .unzip();

        if snapshots.is_empty() {
            return Err(ExportError::NothingToExport);
        }

        Ok(Self {
            snapshots,
            source_indices,
            fps,
            settings: settings.clone(),
        })
    }

    /// Per-frame delay in milliseconds.
    pub fn delay_ms(&self) -> f64 {
        1000.0 / self.fps as f64
    }

    /// Per-frame delay as handed to the encoder.
    pub fn delay(&self) -> Delay {
        Delay::from_numer_denom_ms(1000, self.fps)
    }
}

/// The finished export.
#[derive(Debug, Clone)]
pub struct ExportArtifact {
    /// Encoded file contents.
    pub bytes: Vec<u8>,

    /// Suggested download name.
    pub file_name: String,

    pub mime_type: &'static str,

    pub frame_count: usize,

    pub width: u32,
    pub height: u32,

    /// Uniform inter-frame delay in milliseconds.
    pub delay_ms: f64,

    /// Completion time (RFC 3339).
    pub created_at: String,
}

/// Progress callback for export rendering.
pub type ProgressCallback = Box<dyn Fn(ExportProgress) + Send>;

/// Export progress report.
#[derive(Debug, Clone)]
pub struct ExportProgress {
    /// Current progress [0.0, 1.0].
    pub progress: f64,

    /// Frames rasterized so far.
    pub frames_rendered: usize,

    /// Frames in the export.
    pub total_frames: usize,

    pub stage: ExportStage,
}

/// Stages of the export process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportStage {
    Preparing,
    Rasterizing,
    Encoding,
    Complete,
    Failed,
}

/// Turns ordered pixel buffers into an animated image byte stream.
pub trait FrameEncoder: Send {
    /// Encode `frames` in order, each shown for `delay`.
    fn encode(&mut self, frames: Vec<RgbaImage>, delay: Delay) -> FlipbookResult<Vec<u8>>;

    /// MIME type of the produced bytes.
    fn mime_type(&self) -> &'static str;

    /// Encoder name for logging.
    fn name(&self) -> &str;
}

/// GIF encoder that loops forever.
#[derive(Debug, Clone)]
pub struct GifFrameEncoder {
    /// Quantization speed, 1 (best) to 30 (fastest).
    speed: i32,
}

impl Default for GifFrameEncoder {
    fn default() -> Self {
        Self { speed: 10 }
    }
}

impl GifFrameEncoder {
    pub fn with_speed(speed: i32) -> Self {
        Self {
            speed: speed.clamp(1, 30),
        }
    }
}

impl FrameEncoder for GifFrameEncoder {
    fn encode(&mut self, frames: Vec<RgbaImage>, delay: Delay) -> FlipbookResult<Vec<u8>> {
        let mut bytes = Vec::new();
        {
            let mut encoder = GifEncoder::new_with_speed(&mut bytes, self.speed);
            encoder
                .set_repeat(Repeat::Infinite)
                .map_err(|e| FlipbookError::encode(format!("Failed to set GIF repeat: {e}")))?;
            encoder
                .encode_frames(
                    frames
                        .into_iter()
                        .map(|buffer| Frame::from_parts(buffer, 0, 0, delay)),
                )
                .map_err(|e| FlipbookError::encode(format!("Failed to encode GIF frames: {e}")))?;
        }
        Ok(bytes)
    }

    fn mime_type(&self) -> &'static str {
        "image/gif"
    }

    fn name(&self) -> &str {
        "gif"
    }
}

/// Single-flight guard for exports.
#[derive(Debug, Clone, Default)]
pub struct ExportGuard {
    in_flight: Arc<AtomicBool>,
}

/// Proof that an export holds the guard. Dropping it releases the guard.
#[derive(Debug)]
pub struct ExportTicket {
    in_flight: Arc<AtomicBool>,
}

impl ExportGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the guard, failing if another export holds it.
    pub fn try_begin(&self) -> Result<ExportTicket, ExportError> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| ExportError::AlreadyExporting)?;
        Ok(ExportTicket {
            in_flight: self.in_flight.clone(),
        })
    }

    pub fn is_exporting(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }
}

impl Drop for ExportTicket {
    fn drop(&mut self) {
        self.in_flight.store(false, Ordering::Release);
    }
}

/// Rasterize and encode a request on the current thread.
pub fn render_export(
    request: &ExportRequest,
    encoder: &mut dyn FrameEncoder,
    progress: Option<&ProgressCallback>,
) -> Result<ExportArtifact, ExportError> {
    let total = request.snapshots.len();
    let report = |frames_rendered: usize, stage: ExportStage| {
        if let Some(cb) = progress {
            let progress = match stage {
                ExportStage::Complete => 1.0,
                ExportStage::Encoding => 0.9,
                _ => 0.9 * frames_rendered as f64 / total as f64,
            };
            cb(ExportProgress {
                progress,
                frames_rendered,
                total_frames: total,
                stage,
            });
        }
    };

    tracing::info!(
        frames = total,
        fps = request.fps,
        encoder = encoder.name(),
        "Starting export"
    );
    let started = Instant::now();
    report(0, ExportStage::Preparing);

    let rasterizer = match Rasterizer::from_settings(&request.settings) {
        Ok(r) => r,
        Err(e) => {
            report(0, ExportStage::Failed);
            return Err(ExportError::Rasterize(e));
        }
    };

    let mut buffers = Vec::with_capacity(total);
    for (n, snapshot) in request.snapshots.iter().enumerate() {
        buffers.push(rasterizer.rasterize(snapshot));
        report(n + 1, ExportStage::Rasterizing);
    }

    report(total, ExportStage::Encoding);
    let bytes = match encoder.encode(buffers, request.delay()) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::error!(error = %e, "Export encoding failed");
            report(total, ExportStage::Failed);
            return Err(ExportError::Encode(e));
        }
    };

    report(total, ExportStage::Complete);
    tracing::info!(
        bytes = bytes.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Export complete"
    );

    Ok(ExportArtifact {
        bytes,
        file_name: request.settings.file_name.clone(),
        mime_type: encoder.mime_type(),
        frame_count: total,
        width: rasterizer.width(),
        height: rasterizer.height(),
        delay_ms: request.delay_ms(),
        created_at: chrono::Utc::now().to_rfc3339(),
    })
}

/// Run an export on the blocking pool, holding `ticket` until it finishes.
pub async fn export_frames(
    request: ExportRequest,
    mut encoder: Box<dyn FrameEncoder>,
    ticket: ExportTicket,
    progress: Option<ProgressCallback>,
) -> Result<ExportArtifact, ExportError> {
    let handle = tokio::task::spawn_blocking(move || {
        let result = render_export(&request, encoder.as_mut(), progress.as_ref());
        drop(ticket);
        result
    });

    handle.await.map_err(|e| ExportError::Task {
        message: e.to_string(),
    })?
}
