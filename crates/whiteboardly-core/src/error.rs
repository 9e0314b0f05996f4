//! Engine error types.

use thiserror::Error;

/// Errors raised by the drawing surface, snapshots and sessions.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Failed to decode snapshot: {0}")]
    Decode(String),
    #[error("Failed to encode snapshot: {0}")]
    Encode(String),
    #[error("Invalid surface size: {width}x{height}")]
    InvalidSurfaceSize { width: u32, height: u32 },
    #[error("Failed to load font: {0}")]
    FontLoad(String),
    #[error("Invalid data URL: {0}")]
    InvalidDataUrl(String),
    #[error("Unsupported interaction: {0}")]
    UnsupportedInteraction(String),
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
