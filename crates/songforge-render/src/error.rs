//! Error types for the renderer.

use songforge_core::SongError;
use thiserror::Error;

/// Errors that can occur while rendering an arrangement.
#[derive(Debug, Clone, Error)]
pub enum RenderError {
    /// The arrangement failed validation before rendering.
    #[error("invalid arrangement: {message}")]
    InvalidArrangement {
        /// What failed.
        message: String,
    },

    /// The arrangement renders to zero samples.
    #[error("arrangement has no audible content")]
    EmptyArrangement,
}

impl From<RenderError> for SongError {
    fn from(err: RenderError) -> Self {
        SongError::synthesis(err.to_string())
    }
}
