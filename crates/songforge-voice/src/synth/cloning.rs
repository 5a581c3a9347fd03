//! Cloning backend: vocal timbre conditioned on a profile's embedding.

use std::sync::Arc;

use songforge_core::arrangement::SymbolicArrangement;
use songforge_core::version::EXTRACTOR_VERSION;
use songforge_core::{ProfileId, Stem};

use crate::bank::VoiceBank;
use crate::embedding::{VoiceEmbedding, EMBEDDING_DIM};
use crate::error::VoiceError;
use crate::profile::ProfileStatus;

use super::{render_vocal_stem, VocalSynthesizer, VoiceTimbre};

/// Embedding slots holding summary statistics (after the band energies).
const CENTROID_MEAN: usize = EMBEDDING_DIM - 6;
const ZERO_CROSSING: usize = EMBEDDING_DIM - 3;
const PITCH: usize = EMBEDDING_DIM - 2;
const RMS: usize = EMBEDDING_DIM - 1;

/// Voice-cloning vocal synthesizer.
///
/// Holds the live bank, not a profile snapshot: readiness is re-checked
/// when synthesis actually runs, so a profile deleted or failed between
/// job submission and execution surfaces as `VoiceNotReady` rather than
/// singing with stale data.
pub struct CloningVocalSynthesizer {
    bank: Arc<VoiceBank>,
    profile: ProfileId,
}

impl CloningVocalSynthesizer {
    pub fn new(bank: Arc<VoiceBank>, profile: ProfileId) -> Self {
        Self { bank, profile }
    }

    fn embedding(&self) -> Result<VoiceEmbedding, VoiceError> {
        let profile = self.bank.get_profile(&self.profile).ok_or_else(|| {
            VoiceError::VoiceNotReady {
                message: format!("profile {} was deleted", self.profile),
            }
        })?;
        match profile.status {
            ProfileStatus::Pending => Err(VoiceError::VoiceNotReady {
                message: format!("profile {} is still processing", self.profile),
            }),
            ProfileStatus::Failed { reason } => Err(VoiceError::VoiceNotReady {
                message: format!("profile {} failed extraction: {}", self.profile, reason),
            }),
            ProfileStatus::Ready => profile.embedding.ok_or_else(|| {
                VoiceError::synthesis(format!(
                    "profile {} is ready but carries no embedding",
                    self.profile
                ))
            }),
        }
    }

    /// Maps the embedding onto glottal and formant parameters.
    fn timbre_from(embedding: &VoiceEmbedding) -> VoiceTimbre {
        let at = |i: usize| embedding.values.get(i).copied().unwrap_or(0.0);

        let pitch_hz = at(PITCH) * 100.0;
        let formant_scale = if pitch_hz > 0.0 {
            (pitch_hz / 220.0).clamp(0.75, 1.3)
        } else {
            (at(CENTROID_MEAN) / 2.0).clamp(0.75, 1.3)
        };

        VoiceTimbre {
            formant_scale,
            breathiness: (at(ZERO_CROSSING) * 2.0).clamp(0.05, 0.35),
            vibrato_rate: 4.5 + at(RMS).clamp(0.0, 0.5),
            vibrato_depth: 0.008,
            gain: 0.8,
        }
    }
}

impl VocalSynthesizer for CloningVocalSynthesizer {
    fn synthesize_vocal(&self, arrangement: &SymbolicArrangement) -> Result<Stem, VoiceError> {
        let embedding = self.embedding()?;
        if embedding.version != EXTRACTOR_VERSION {
            return Err(VoiceError::synthesis(format!(
                "embedding version '{}' does not match extractor '{}'; re-register the voice",
                embedding.version, EXTRACTOR_VERSION
            )));
        }

        let timbre = Self::timbre_from(&embedding);
        let tag = format!("vocal:cloned:{}", self.profile);
        render_vocal_stem(arrangement, &timbre, &tag)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::sung_arrangement;
    use super::*;
    use crate::embedding::EmbeddingExtractor;
    use crate::sample::test_support::sine_wav;
    use crate::sample::VoiceSample;

    fn bank_with_profile(frequency: f64) -> (Arc<VoiceBank>, ProfileId) {
        let bank = Arc::new(VoiceBank::new());
        let sample = VoiceSample::from_wav_bytes(&sine_wav(frequency, 4.0, 44100, 0.5)).unwrap();
        let profile = bank.register_voice(sample, "clone-me").unwrap();
        (bank, profile.id)
    }

    fn make_ready(bank: &VoiceBank, id: &ProfileId) {
        let profile = bank.get_profile(id).unwrap();
        let embedding = EmbeddingExtractor::new()
            .extract(&profile.source_sample)
            .unwrap();
        bank.mark_ready(id, embedding).unwrap();
    }

    #[test]
    fn pending_profile_is_not_ready() {
        let (bank, id) = bank_with_profile(200.0);
        let err = CloningVocalSynthesizer::new(bank, id)
            .synthesize_vocal(&sung_arrangement())
            .unwrap_err();
        assert!(matches!(err, VoiceError::VoiceNotReady { .. }));
    }

    #[test]
    fn deleted_profile_surfaces_not_ready_at_execution() {
        let (bank, id) = bank_with_profile(200.0);
        make_ready(&bank, &id);
        let synth = CloningVocalSynthesizer::new(Arc::clone(&bank), id.clone());
        bank.delete_profile(&id).unwrap();

        let err = synth.synthesize_vocal(&sung_arrangement()).unwrap_err();
        assert!(matches!(err, VoiceError::VoiceNotReady { .. }));
    }

    #[test]
    fn ready_profile_sings() {
        let (bank, id) = bank_with_profile(200.0);
        make_ready(&bank, &id);
        let stem = CloningVocalSynthesizer::new(bank, id)
            .synthesize_vocal(&sung_arrangement())
            .unwrap();
        assert!(stem.rms() > 0.0);
    }

    #[test]
    fn stale_embedding_version_is_rejected() {
        let (bank, id) = bank_with_profile(200.0);
        let profile = bank.get_profile(&id).unwrap();
        let mut embedding = EmbeddingExtractor::new()
            .extract(&profile.source_sample)
            .unwrap();
        embedding.version = "embed-v0".to_string();
        bank.mark_ready(&id, embedding).unwrap();

        let err = CloningVocalSynthesizer::new(bank, id)
            .synthesize_vocal(&sung_arrangement())
            .unwrap_err();
        assert!(matches!(err, VoiceError::Synthesis { .. }));
    }

    #[test]
    fn different_source_voices_color_the_timbre() {
        let low = EmbeddingExtractor::new()
            .extract(&VoiceSample::from_wav_bytes(&sine_wav(110.0, 4.0, 44100, 0.5)).unwrap())
            .unwrap();
        let high = EmbeddingExtractor::new()
            .extract(&VoiceSample::from_wav_bytes(&sine_wav(330.0, 4.0, 44100, 0.5)).unwrap())
            .unwrap();
        let a = CloningVocalSynthesizer::timbre_from(&low);
        let b = CloningVocalSynthesizer::timbre_from(&high);
        assert!(a.formant_scale < b.formant_scale);
    }
}
