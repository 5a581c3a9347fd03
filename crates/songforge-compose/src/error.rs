//! Error types for the composer.

use songforge_core::SongError;
use thiserror::Error;

/// Errors that can occur during composition.
#[derive(Debug, Clone, Error)]
pub enum ComposeError {
    /// Blank or whitespace-only lyrics.
    #[error("lyrics are empty")]
    EmptyLyrics,

    /// Genre tag outside the supported enumeration.
    #[error("unsupported genre '{tag}'")]
    UnknownGenre {
        /// The rejected tag.
        tag: String,
    },

    /// The composed arrangement failed its own invariants. Indicates a
    /// composer bug, not bad input.
    #[error("composed arrangement is invalid: {message}")]
    Invalid {
        /// What failed.
        message: String,
    },
}

impl From<ComposeError> for SongError {
    fn from(err: ComposeError) -> Self {
        match err {
            ComposeError::EmptyLyrics | ComposeError::UnknownGenre { .. } => {
                SongError::invalid_input(err.to_string())
            }
            ComposeError::Invalid { message } => {
                SongError::synthesis(format!("composer: {}", message))
            }
        }
    }
}
