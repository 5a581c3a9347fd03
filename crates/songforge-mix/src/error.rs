//! Error types for mixing and mastering.

use songforge_core::{SongError, Tier};
use thiserror::Error;

/// Errors that can occur while producing a master.
#[derive(Debug, Clone, Error)]
pub enum MixError {
    /// No stems were handed to the mixer.
    #[error("no stems to mix")]
    EmptyStemSet,

    /// Encoding for a tier failed.
    #[error("encoding failed for tier '{tier}': {message}")]
    Encoding {
        /// The tier that failed.
        tier: Tier,
        /// What went wrong.
        message: String,
    },
}

impl From<MixError> for SongError {
    fn from(err: MixError) -> Self {
        match err {
            MixError::EmptyStemSet => SongError::invalid_input("no stems to mix"),
            MixError::Encoding { tier, message } => SongError::encoding(tier.as_str(), message),
        }
    }
}
