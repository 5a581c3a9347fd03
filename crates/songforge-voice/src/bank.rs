//! The voice bank: the single owned store of voice profiles.

use std::sync::RwLock;

use songforge_core::hash::blake3_hex;
use songforge_core::ProfileId;

use crate::embedding::VoiceEmbedding;
use crate::error::VoiceError;
use crate::profile::{ProfileStatus, VoiceProfile};
use crate::sample::VoiceSample;

/// Thread-safe registry of voice profiles.
///
/// Profiles keep insertion order. Status transitions
/// (`Pending -> Ready | Failed`) happen only through [`mark_ready`] and
/// [`mark_failed`]; everything handed out is a snapshot, so concurrent
/// readers during synthesis never observe a half-applied transition.
///
/// [`mark_ready`]: VoiceBank::mark_ready
/// [`mark_failed`]: VoiceBank::mark_failed
#[derive(Debug, Default)]
pub struct VoiceBank {
    profiles: RwLock<Vec<VoiceProfile>>,
}

impl VoiceBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a validated sample as a pending profile and returns a
    /// snapshot of it. The caller is responsible for scheduling embedding
    /// extraction and completing the transition.
    pub fn register_voice(
        &self,
        sample: VoiceSample,
        display_name: &str,
    ) -> Result<VoiceProfile, VoiceError> {
        sample.validate_for_registration()?;

        let id = derive_profile_id(&sample, display_name);
        let profile = VoiceProfile::pending(id, display_name.to_string(), sample);

        let mut profiles = self.write();
        if profiles.iter().any(|p| p.id == profile.id) {
            return Err(VoiceError::invalid_sample(format!(
                "voice '{}' is already registered as {}",
                display_name, profile.id
            )));
        }
        profiles.push(profile.clone());
        Ok(profile)
    }

    /// Snapshot of one profile.
    pub fn get_profile(&self, id: &ProfileId) -> Option<VoiceProfile> {
        self.read().iter().find(|p| &p.id == id).cloned()
    }

    /// Snapshots of all profiles in insertion order.
    pub fn list_profiles(&self) -> Vec<VoiceProfile> {
        self.read().clone()
    }

    /// Removes a profile, its sample, and its embedding in one step.
    pub fn delete_profile(&self, id: &ProfileId) -> Result<(), VoiceError> {
        let mut profiles = self.write();
        let at = profiles
            .iter()
            .position(|p| &p.id == id)
            .ok_or_else(|| VoiceError::NotFound { id: id.to_string() })?;
        profiles.remove(at);
        Ok(())
    }

    /// Completes extraction: `Pending -> Ready`, attaching the embedding.
    pub fn mark_ready(&self, id: &ProfileId, embedding: VoiceEmbedding) -> Result<(), VoiceError> {
        self.transition(id, |profile| {
            profile.embedding = Some(embedding);
            profile.status = ProfileStatus::Ready;
        })
    }

    /// Fails extraction: `Pending -> Failed`.
    pub fn mark_failed(&self, id: &ProfileId, reason: &str) -> Result<(), VoiceError> {
        self.transition(id, |profile| {
            profile.embedding = None;
            profile.status = ProfileStatus::Failed {
                reason: reason.to_string(),
            };
        })
    }

    fn transition(
        &self,
        id: &ProfileId,
        apply: impl FnOnce(&mut VoiceProfile),
    ) -> Result<(), VoiceError> {
        let mut profiles = self.write();
        let profile = profiles
            .iter_mut()
            .find(|p| &p.id == id)
            .ok_or_else(|| VoiceError::NotFound { id: id.to_string() })?;
        if profile.status != ProfileStatus::Pending {
            return Err(VoiceError::invalid_sample(format!(
                "profile {} already left the pending state",
                id
            )));
        }
        apply(profile);
        Ok(())
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Vec<VoiceProfile>> {
        self.profiles.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Vec<VoiceProfile>> {
        self.profiles.write().unwrap_or_else(|e| e.into_inner())
    }
}

/// Content-derived profile id: BLAKE3 of the sample and name, truncated.
fn derive_profile_id(sample: &VoiceSample, display_name: &str) -> ProfileId {
    let mut input = Vec::with_capacity(sample.samples.len() * 8 + display_name.len());
    for value in &sample.samples {
        input.extend_from_slice(&value.to_le_bytes());
    }
    input.extend_from_slice(&sample.sample_rate.to_le_bytes());
    input.extend_from_slice(display_name.as_bytes());
    ProfileId::new(&blake3_hex(&input)[..16])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::test_support::sine_wav;
    use songforge_core::version::EXTRACTOR_VERSION;

    fn sample(frequency: f64) -> VoiceSample {
        VoiceSample::from_wav_bytes(&sine_wav(frequency, 4.0, 44100, 0.5)).unwrap()
    }

    fn embedding() -> VoiceEmbedding {
        VoiceEmbedding {
            version: EXTRACTOR_VERSION.to_string(),
            values: vec![0.0; crate::embedding::EMBEDDING_DIM],
        }
    }

    #[test]
    fn register_then_lookup() {
        let bank = VoiceBank::new();
        let profile = bank.register_voice(sample(200.0), "alto").unwrap();
        assert_eq!(profile.status, ProfileStatus::Pending);

        let found = bank.get_profile(&profile.id).unwrap();
        assert_eq!(found.display_name, "alto");
        assert!(found.embedding.is_none());
    }

    #[test]
    fn list_keeps_insertion_order() {
        let bank = VoiceBank::new();
        bank.register_voice(sample(180.0), "first").unwrap();
        bank.register_voice(sample(260.0), "second").unwrap();
        bank.register_voice(sample(320.0), "third").unwrap();

        let names: Vec<String> = bank
            .list_profiles()
            .into_iter()
            .map(|p| p.display_name)
            .collect();
        assert_eq!(names, vec!["first", "second", "third"]);
    }

    #[test]
    fn mark_ready_attaches_embedding() {
        let bank = VoiceBank::new();
        let profile = bank.register_voice(sample(200.0), "alto").unwrap();
        bank.mark_ready(&profile.id, embedding()).unwrap();

        let ready = bank.get_profile(&profile.id).unwrap();
        assert!(ready.is_ready());
        assert!(ready.embedding.is_some());
    }

    #[test]
    fn mark_failed_keeps_no_embedding() {
        let bank = VoiceBank::new();
        let profile = bank.register_voice(sample(200.0), "alto").unwrap();
        bank.mark_failed(&profile.id, "fft exploded").unwrap();

        let failed = bank.get_profile(&profile.id).unwrap();
        assert!(failed.embedding.is_none());
        assert!(matches!(failed.status, ProfileStatus::Failed { .. }));
    }

    #[test]
    fn transitions_only_leave_pending_once() {
        let bank = VoiceBank::new();
        let profile = bank.register_voice(sample(200.0), "alto").unwrap();
        bank.mark_ready(&profile.id, embedding()).unwrap();
        assert!(bank.mark_failed(&profile.id, "too late").is_err());
    }

    #[test]
    fn delete_is_atomic_and_not_found_after() {
        let bank = VoiceBank::new();
        let profile = bank.register_voice(sample(200.0), "alto").unwrap();
        bank.delete_profile(&profile.id).unwrap();
        assert!(bank.get_profile(&profile.id).is_none());
        assert!(matches!(
            bank.delete_profile(&profile.id),
            Err(VoiceError::NotFound { .. })
        ));
    }

    #[test]
    fn rejects_invalid_sample_at_registration() {
        let bank = VoiceBank::new();
        let short = VoiceSample::from_wav_bytes(&sine_wav(200.0, 1.0, 44100, 0.5)).unwrap();
        assert!(bank.register_voice(short, "nope").is_err());
        assert!(bank.list_profiles().is_empty());
    }
}
