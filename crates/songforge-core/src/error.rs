//! Caller-visible error taxonomy for the song pipeline.
//!
//! Component crates define their own error enums; the pipeline maps them
//! into this taxonomy at the service boundary so callers see a small, stable
//! set of kinds with a clear retry policy.

use thiserror::Error;

/// Result type for pipeline-boundary operations.
pub type SongResult<T> = Result<T, SongError>;

/// Errors visible to callers of the song pipeline.
#[derive(Debug, Clone, Error)]
pub enum SongError {
    /// Bad lyrics, sample, genre, or tier. Not retried.
    #[error("invalid input: {message}")]
    InvalidInput {
        /// What was wrong with the input.
        message: String,
    },

    /// Missing profile or job.
    #[error("not found: {what}")]
    NotFound {
        /// The missing entity.
        what: String,
    },

    /// A rendering stage exceeded its timeout. Retryable by the caller.
    #[error("stage '{stage}' timed out")]
    StageTimeout {
        /// The stage that timed out.
        stage: String,
    },

    /// Synthesis backend failure. Retryable with backoff.
    #[error("synthesis failed: {message}")]
    Synthesis {
        /// Error message from the backend.
        message: String,
    },

    /// Encoding a master failed. Names the tier that failed.
    #[error("encoding failed for tier '{tier}': {message}")]
    Encoding {
        /// The tier whose encode failed.
        tier: String,
        /// Error message.
        message: String,
    },

    /// Cloning synthesis was requested against a profile that is not ready.
    /// The caller must wait or choose the generic backend.
    #[error("voice profile not ready: {message}")]
    VoiceNotReady {
        /// Why the profile is unusable.
        message: String,
    },
}

impl SongError {
    /// Creates an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Creates a not-found error.
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    /// Creates a stage timeout error.
    pub fn stage_timeout(stage: impl Into<String>) -> Self {
        Self::StageTimeout {
            stage: stage.into(),
        }
    }

    /// Creates a synthesis error.
    pub fn synthesis(message: impl Into<String>) -> Self {
        Self::Synthesis {
            message: message.into(),
        }
    }

    /// Creates an encoding error for a tier.
    pub fn encoding(tier: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Encoding {
            tier: tier.into(),
            message: message.into(),
        }
    }

    /// Creates a voice-not-ready error.
    pub fn voice_not_ready(message: impl Into<String>) -> Self {
        Self::VoiceNotReady {
            message: message.into(),
        }
    }

    /// Short stable kind tag, used in persisted job records.
    pub fn kind(&self) -> &'static str {
        match self {
            SongError::InvalidInput { .. } => "invalid_input",
            SongError::NotFound { .. } => "not_found",
            SongError::StageTimeout { .. } => "stage_timeout",
            SongError::Synthesis { .. } => "synthesis",
            SongError::Encoding { .. } => "encoding",
            SongError::VoiceNotReady { .. } => "voice_not_ready",
        }
    }

    /// Whether a caller may reasonably retry the operation.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SongError::StageTimeout { .. }
                | SongError::Synthesis { .. }
                | SongError::Encoding { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_are_stable() {
        assert_eq!(SongError::invalid_input("x").kind(), "invalid_input");
        assert_eq!(SongError::stage_timeout("vocal").kind(), "stage_timeout");
        assert_eq!(SongError::encoding("preview", "x").kind(), "encoding");
    }

    #[test]
    fn retry_policy() {
        assert!(!SongError::invalid_input("x").is_retryable());
        assert!(!SongError::not_found("job").is_retryable());
        assert!(!SongError::voice_not_ready("pending").is_retryable());
        assert!(SongError::stage_timeout("mix").is_retryable());
        assert!(SongError::synthesis("backend").is_retryable());
    }

    #[test]
    fn encoding_error_names_tier() {
        let err = SongError::encoding("preview", "resample failed");
        assert!(err.to_string().contains("preview"));
    }
}
