//! Voice profile records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use songforge_core::ProfileId;

use crate::embedding::VoiceEmbedding;
use crate::sample::VoiceSample;

/// Lifecycle of a registered voice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ProfileStatus {
    /// Registered, embedding extraction not yet finished.
    Pending,
    /// Embedding extracted; usable for cloning synthesis.
    Ready,
    /// Extraction failed; unusable until re-registered.
    Failed {
        /// Why extraction failed.
        reason: String,
    },
}

/// A registered voice.
///
/// Invariant: `embedding.is_some()` exactly when `status == Ready`. The
/// transitions that uphold it live on [`crate::bank::VoiceBank`]; profiles
/// handed out of the bank are immutable snapshots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceProfile {
    /// Stable content-derived id.
    pub id: ProfileId,
    /// Human-facing name.
    pub display_name: String,
    /// The upload the profile was built from.
    pub source_sample: VoiceSample,
    /// Spectral fingerprint, present once ready.
    pub embedding: Option<VoiceEmbedding>,
    /// Registration time.
    pub created_at: DateTime<Utc>,
    /// Current lifecycle state.
    pub status: ProfileStatus,
}

impl VoiceProfile {
    /// Creates a pending profile.
    pub fn pending(id: ProfileId, display_name: String, source_sample: VoiceSample) -> Self {
        Self {
            id,
            display_name,
            source_sample,
            embedding: None,
            created_at: Utc::now(),
            status: ProfileStatus::Pending,
        }
    }

    /// True once usable for cloning synthesis.
    pub fn is_ready(&self) -> bool {
        self.status == ProfileStatus::Ready
    }
}
