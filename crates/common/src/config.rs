//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{FlipbookError, FlipbookResult};

/// Frame rates offered by the frame-rate selector.
pub const FPS_OPTIONS: [u32; 3] = [3, 12, 24];

/// Global application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Defaults for a new editing session.
    pub editor: EditorDefaults,

    /// Playback tick source settings.
    pub playback: PlaybackSettings,

    /// Reference overlay styling.
    pub overlay: OverlayStyle,

    /// Export canvas settings.
    pub export: ExportSettings,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Initial state of an editing session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorDefaults {
    /// Number of frames in a fresh sequence.
    pub frame_count: usize,

    /// Initial playback rate.
    pub fps: u32,

    /// Maximum number of undo states kept for the active frame.
    pub undo_depth: usize,

    /// Upper bound accepted for a proposed frame count.
    pub max_frames: usize,
}

/// Tick source configuration for the playback loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackSettings {
    /// How often the scheduler wakes to check elapsed time (Hz).
    pub tick_rate_hz: u32,
}

/// Colors and opacities used for reference overlays.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayStyle {
    /// Stroke color substituted into keyframe overlays.
    pub highlight_color: String,

    /// Opacity of keyframe overlays.
    pub keyframe_opacity: f32,
}

/// Export canvas configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    /// Canvas width in pixels.
    pub width: u32,

    /// Aspect ratio as (width, height); the height is derived from it.
    pub aspect: (u32, u32),

    /// Suggested file name for the artifact.
    pub file_name: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "flipbook=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for EditorDefaults {
    fn default() -> Self {
        Self {
            frame_count: 12,
            fps: 12,
            undo_depth: 3,
            max_frames: 120,
        }
    }
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self { tick_rate_hz: 60 }
    }
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            highlight_color: "#facc15".to_string(),
            keyframe_opacity: 0.5,
        }
    }
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            width: 1000,
            aspect: (16, 9),
            file_name: "animation.gif".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl ExportSettings {
    /// Canvas height derived from width and aspect ratio, rounded half up.
    pub fn height(&self) -> u32 {
        let (aw, ah) = self.aspect;
        if aw == 0 {
            return 0;
        }
        (self.width as f64 * ah as f64 / aw as f64).round() as u32
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        let config_path = config_file_path();
        if config_path.exists() {
            match std::fs::read_to_string(&config_path) {
                Ok(content) => match Self::from_json(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!("Failed to parse config at {:?}: {}", config_path, e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Parse and validate a config document.
    pub fn from_json(content: &str) -> FlipbookResult<Self> {
        let config: Self = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> FlipbookResult<()> {
        if self.editor.frame_count == 0 {
            return Err(FlipbookError::config("editor.frame_count must be at least 1"));
        }
        if self.editor.max_frames < self.editor.frame_count {
            return Err(FlipbookError::config(
                "editor.max_frames must not be below editor.frame_count",
            ));
        }
        if self.editor.fps == 0 {
            return Err(FlipbookError::config("editor.fps must be positive"));
        }
        if self.editor.undo_depth == 0 {
            return Err(FlipbookError::config("editor.undo_depth must be at least 1"));
        }
        if self.playback.tick_rate_hz == 0 {
            return Err(FlipbookError::config("playback.tick_rate_hz must be positive"));
        }
        if self.export.width == 0 || self.export.height() == 0 {
            return Err(FlipbookError::config("export canvas must not be empty"));
        }
        if !(0.0..=1.0).contains(&self.overlay.keyframe_opacity) {
            return Err(FlipbookError::config(format!(
                "overlay.keyframe_opacity must be within [0, 1], got {}",
                self.overlay.keyframe_opacity
            )));
        }
        Ok(())
    }
}

/// Standard config file location.
fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("flipbook").join("config.json")
}
