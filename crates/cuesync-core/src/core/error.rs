//! cuesync Error Definitions
//!
//! Defines error types used throughout the project.

use thiserror::Error;

use super::captions::{ParseError, ValidationError};

/// Core engine error types
#[derive(Error, Debug)]
pub enum CoreError {
    // =========================================================================
    // Caption Errors
    // =========================================================================
    #[error("Caption parse failed: {0}")]
    Parse(#[from] ParseError),

    #[error("Caption file rejected: {0}")]
    Validation(#[from] ValidationError),

    // =========================================================================
    // Playback Errors
    // =========================================================================
    #[error("No async runtime available to drive the caption sampler")]
    RuntimeUnavailable,

    // =========================================================================
    // General Errors
    // =========================================================================
    #[error("Settings error: {0}")]
    Settings(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Core engine result type
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    /// Short machine-readable reason, used by callers that map failures to
    /// user-facing messages
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Parse(e) => e.reason(),
            Self::Validation(e) => e.reason(),
            Self::RuntimeUnavailable => "runtime-unavailable",
            Self::Settings(_) => "settings",
            Self::IoError(_) => "io",
            Self::JsonError(_) => "json",
        }
    }
}
