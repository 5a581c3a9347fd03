//! Error types for voice management and vocal synthesis.

use songforge_core::SongError;
use thiserror::Error;

/// Errors from the voice bank, embedding extractor, and vocal synthesizers.
#[derive(Debug, Clone, Error)]
pub enum VoiceError {
    /// The uploaded sample cannot be used to build a profile.
    #[error("invalid voice sample: {message}")]
    InvalidSample {
        /// What was wrong with it.
        message: String,
    },

    /// Embedding extraction cannot process this sample.
    #[error("embedding extraction failed: {message}")]
    Extraction {
        /// Unsupported rate, layout, or degenerate signal.
        message: String,
    },

    /// No profile with the given id.
    #[error("voice profile '{id}' not found")]
    NotFound {
        /// The missing profile id.
        id: String,
    },

    /// The requested profile exists but is not ready for synthesis.
    #[error("voice not ready: {message}")]
    VoiceNotReady {
        /// Pending, failed, or deleted mid-flight.
        message: String,
    },

    /// Synthesis backend failure.
    #[error("vocal synthesis failed: {message}")]
    Synthesis {
        /// Backend-internal detail.
        message: String,
    },
}

impl VoiceError {
    pub fn invalid_sample(message: impl Into<String>) -> Self {
        Self::InvalidSample {
            message: message.into(),
        }
    }

    pub fn extraction(message: impl Into<String>) -> Self {
        Self::Extraction {
            message: message.into(),
        }
    }

    pub fn synthesis(message: impl Into<String>) -> Self {
        Self::Synthesis {
            message: message.into(),
        }
    }
}

impl From<VoiceError> for SongError {
    fn from(err: VoiceError) -> Self {
        match err {
            VoiceError::InvalidSample { .. } | VoiceError::Extraction { .. } => {
                SongError::invalid_input(err.to_string())
            }
            VoiceError::NotFound { id } => SongError::not_found(format!("voice profile {}", id)),
            VoiceError::VoiceNotReady { message } => SongError::voice_not_ready(message),
            VoiceError::Synthesis { message } => SongError::synthesis(message),
        }
    }
}
