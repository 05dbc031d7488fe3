//! Error types shared across Flipbook crates.

/// Top-level error type for Flipbook operations.
#[derive(Debug, thiserror::Error)]
pub enum FlipbookError {
    #[error("Render error: {message}")]
    Render { message: String },

    #[error("Encode error: {message}")]
    Encode { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Result type alias using FlipbookError.
pub type FlipbookResult<T> = Result<T, FlipbookError>;

impl FlipbookError {
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render {
            message: msg.into(),
        }
    }

    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }
}
