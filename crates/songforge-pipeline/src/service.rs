//! The song service: the public face of the pipeline.
//!
//! A cheap-to-clone handle over shared state (voice bank, job store,
//! render cache, object store). Each song job runs on a spawned tokio
//! task, so all methods must be called from within a tokio runtime.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use songforge_core::error::SongError;
use songforge_core::genre::Genre;
use songforge_core::hash::{canonical_value_hash, render_key};
use songforge_core::master::{Master, Tier};
use songforge_core::stem::{Stem, StemKind};
use songforge_core::version::{INSTRUMENT_RENDER_VERSION, VOCAL_SYNTH_VERSION};
use songforge_core::voice::{ProfileId, VoiceSpec};
use songforge_voice::{EmbeddingExtractor, VoiceBank, VoiceProfile, VoiceSample};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::cache::{RenderCache, RenderComponent};
use crate::config::PipelineConfig;
use crate::job::{JobId, JobRecord, JobStage, JobStatus, JobStore, MasterRecord};
use crate::notify::{ChannelNotifier, StageEvent, StageOutcome, StatusNotifier};
use crate::pipeline::{RenderPipeline, StageError};
use crate::store::{FsStore, MemoryStore, ObjectStore};

/// End-to-end song synthesis service.
#[derive(Clone)]
pub struct SongService {
    inner: Arc<ServiceInner>,
}

struct ServiceInner {
    config: PipelineConfig,
    bank: Arc<VoiceBank>,
    pipeline: RenderPipeline,
    jobs: JobStore,
    store: Arc<dyn ObjectStore>,
    cache: Arc<RenderCache>,
    notifier: Arc<ChannelNotifier>,
    handles: Mutex<HashMap<JobId, JoinHandle<()>>>,
}

impl SongService {
    /// Builds a service from a config. With a data directory set, all
    /// state (objects, cache manifests, job records) persists across
    /// restarts; without one everything lives in memory.
    pub fn new(config: PipelineConfig) -> Result<Self, SongError> {
        let (store, cache, jobs): (Arc<dyn ObjectStore>, Arc<RenderCache>, JobStore) =
            match &config.data_dir {
                Some(dir) => {
                    let store: Arc<dyn ObjectStore> =
                        Arc::new(FsStore::new(dir.join("objects"))?);
                    let cache = Arc::new(RenderCache::persistent(
                        Arc::clone(&store),
                        dir.join("cache"),
                    )?);
                    let jobs = JobStore::open(dir.join("jobs"))?;
                    (store, cache, jobs)
                }
                None => {
                    let store: Arc<dyn ObjectStore> = Arc::new(MemoryStore::new());
                    let cache = Arc::new(RenderCache::ephemeral(Arc::clone(&store)));
                    (store, cache, JobStore::in_memory())
                }
            };

        let bank = Arc::new(VoiceBank::new());
        let notifier = Arc::new(ChannelNotifier::new(256));
        let pipeline = RenderPipeline::new(
            &config,
            Arc::clone(&bank),
            Arc::clone(&cache),
            Arc::clone(&notifier) as Arc<dyn StatusNotifier>,
        );
        Ok(Self {
            inner: Arc::new(ServiceInner {
                config,
                bank,
                pipeline,
                jobs,
                store,
                cache,
                notifier,
                handles: Mutex::new(HashMap::new()),
            }),
        })
    }

    /// Stream of stage events across all jobs.
    pub fn subscribe_events(&self) -> broadcast::Receiver<StageEvent> {
        self.inner.notifier.subscribe()
    }

    /// Submits a song request and returns its job id immediately. The
    /// job runs on a background task; poll [`job_status`](Self::job_status)
    /// or subscribe to events to follow it.
    pub fn create_song(
        &self,
        lyrics: &str,
        genre_tag: &str,
        voice_spec: VoiceSpec,
        tempo_bpm: Option<f64>,
    ) -> Result<JobId, SongError> {
        if lyrics.trim().is_empty() {
            return Err(SongError::invalid_input("lyrics are empty"));
        }
        let genre = Genre::from_str(genre_tag)?;
        if let VoiceSpec::Cloned(id) = &voice_spec {
            if self.inner.bank.get_profile(id).is_none() {
                return Err(SongError::not_found(format!("voice profile {}", id)));
            }
        }

        let request_hash =
            canonical_value_hash(&(lyrics, genre.as_str(), voice_spec.cache_tag(), tempo_bpm))?;
        let id = self.inner.jobs.next_id(&request_hash);
        let record = JobRecord::new(
            id.clone(),
            lyrics.to_string(),
            genre,
            voice_spec,
            tempo_bpm,
        );
        self.inner.jobs.create(record)?;
        info!(job = %id, genre = genre.as_str(), "song job accepted");

        let inner = Arc::clone(&self.inner);
        let job_id = id.clone();
        let handle = tokio::spawn(async move {
            inner.run_job(job_id).await;
        });
        let mut handles = self
            .inner
            .handles
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        handles.insert(id.clone(), handle);
        Ok(id)
    }

    /// Current status of a job.
    pub fn job_status(&self, id: &JobId) -> Result<JobStatus, SongError> {
        Ok(self.inner.jobs.get(id)?.status)
    }

    /// Full record of a job.
    pub fn job(&self, id: &JobId) -> Result<JobRecord, SongError> {
        self.inner.jobs.get(id)
    }

    /// All jobs, newest first.
    pub fn list_jobs(&self) -> Vec<JobRecord> {
        self.inner.jobs.list()
    }

    /// Aborts a running job. Stems already rendered stay cached; the
    /// job is marked failed with kind `cancelled`.
    pub fn cancel_job(&self, id: &JobId) -> Result<(), SongError> {
        let record = self.inner.jobs.get(id)?;
        if record.status.is_terminal() {
            return Ok(());
        }
        let handle = {
            let mut handles = self
                .inner
                .handles
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            handles.remove(id)
        };
        if let Some(handle) = handle {
            handle.abort();
        }
        self.inner.jobs.update(id, |record| {
            record.status = JobStatus::Failed {
                stage: "pipeline".into(),
                kind: "cancelled".into(),
            };
        })?;
        info!(job = %id, "job cancelled");
        Ok(())
    }

    /// Fetches a tier's master for a completed job: its metadata plus
    /// the encoded WAV bytes.
    ///
    /// Tiers outside the eager set are mastered on demand from the
    /// cached stems.
    pub async fn master(
        &self,
        id: &JobId,
        tier: Tier,
    ) -> Result<(MasterRecord, Vec<u8>), SongError> {
        let record = self.inner.jobs.get(id)?;
        if let Some(master) = record.master_for(tier) {
            let bytes = self.inner.store.get(&master.object)?.ok_or_else(|| {
                SongError::synthesis(format!("master object {} is missing", master.object))
            })?;
            return Ok((master.clone(), bytes));
        }

        match record.status {
            JobStatus::Completed => {
                let stems = self.inner.cached_stems(&record)?;
                let master = self.inner.pipeline.master_tier(id, stems, tier).await?;
                let stored = self.inner.store_master(id, &master)?;
                let bytes = master.audio;
                Ok((stored, bytes))
            }
            status => Err(SongError::invalid_input(format!(
                "job {} has no {} master (status: {:?})",
                id,
                tier.as_str(),
                status
            ))),
        }
    }

    /// Fetches the encoded per-stem WAVs for a stored master. Empty
    /// outside the studio tier.
    pub fn master_stems(
        &self,
        record: &MasterRecord,
    ) -> Result<Vec<(StemKind, Vec<u8>)>, SongError> {
        let mut stems = Vec::with_capacity(record.stem_objects.len());
        for (kind, key) in &record.stem_objects {
            let bytes = self.inner.store.get(key)?.ok_or_else(|| {
                SongError::synthesis(format!("stem object {} is missing", key))
            })?;
            stems.push((*kind, bytes));
        }
        Ok(stems)
    }

    /// Registers a voice from uploaded WAV bytes. The profile starts
    /// pending; embedding extraction runs on a background task and moves
    /// it to ready or failed.
    pub fn register_voice(
        &self,
        wav_bytes: &[u8],
        display_name: &str,
    ) -> Result<ProfileId, SongError> {
        let sample = VoiceSample::from_wav_bytes(wav_bytes)?;
        let profile = self.inner.bank.register_voice(sample, display_name)?;
        let id = profile.id.clone();
        info!(profile = %id, name = display_name, "voice registered, extraction queued");

        let bank = Arc::clone(&self.inner.bank);
        let task_id = id.clone();
        tokio::spawn(async move {
            let sample = profile.source_sample.clone();
            let extracted = tokio::task::spawn_blocking(move || {
                EmbeddingExtractor::new().extract(&sample)
            })
            .await;
            let outcome = match extracted {
                Ok(Ok(embedding)) => bank.mark_ready(&task_id, embedding),
                Ok(Err(e)) => {
                    warn!(profile = %task_id, error = %e, "embedding extraction failed");
                    bank.mark_failed(&task_id, &e.to_string())
                }
                Err(join_err) => {
                    warn!(profile = %task_id, error = %join_err, "extraction worker panicked");
                    bank.mark_failed(&task_id, "extraction worker panicked")
                }
            };
            if let Err(e) = outcome {
                // The profile was deleted mid-extraction.
                warn!(profile = %task_id, error = %e, "could not record extraction outcome");
            }
        });
        Ok(id)
    }

    /// Snapshot of all registered voice profiles.
    pub fn list_voices(&self) -> Vec<VoiceProfile> {
        self.inner.bank.list_profiles()
    }

    /// Deletes a voice profile. Jobs already holding a synthesizer for
    /// it fail their vocal stage with `voice_not_ready`.
    pub fn delete_voice(&self, id: &ProfileId) -> Result<(), SongError> {
        self.inner.bank.delete_profile(id)?;
        info!(profile = %id, "voice deleted");
        Ok(())
    }
}

impl ServiceInner {
    async fn run_job(&self, id: JobId) {
        if let Err(err) = self.drive(&id).await {
            warn!(job = %id, stage = err.stage.as_str(), error = %err.error, "job failed");
            let failed = self.jobs.update(&id, |record| {
                record.status = JobStatus::Failed {
                    stage: err.stage.as_str().to_string(),
                    kind: err.error.kind().to_string(),
                };
            });
            if let Err(e) = failed {
                warn!(job = %id, error = %e, "could not persist failure");
            }
        }
        let mut handles = self
            .handles
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        handles.remove(&id);
    }

    async fn drive(&self, id: &JobId) -> Result<(), StageError> {
        let staged = |stage: JobStage| move |e: SongError| StageError::new(stage, e);

        let record = self
            .jobs
            .update(id, |record| record.status = JobStatus::Running)
            .map_err(staged(JobStage::Compose))?;

        self.notifier.notify(StageEvent {
            job: id.clone(),
            stage: JobStage::Compose,
            outcome: StageOutcome::Started,
        });
        let arrangement = songforge_compose::compose(
            &record.lyrics,
            record.genre,
            record.tempo_bpm,
            None,
        )
        .map_err(|e| StageError::new(JobStage::Compose, SongError::from(e)))?;
        self.notifier.notify(StageEvent {
            job: id.clone(),
            stage: JobStage::Compose,
            outcome: StageOutcome::Completed,
        });
        let key = render_key(
            &arrangement,
            &record.voice_spec,
            &[VOCAL_SYNTH_VERSION, INSTRUMENT_RENDER_VERSION],
        )
        .map_err(staged(JobStage::Compose))?;
        self.jobs
            .update(id, |r| {
                r.arrangement = Some(arrangement.clone());
                r.render_key = Some(key.clone());
            })
            .map_err(staged(JobStage::Compose))?;

        let stems = self
            .pipeline
            .produce_stems(id, &arrangement, &record.voice_spec)
            .await?;

        for tier in self.config.tiers.clone() {
            let master = self.pipeline.master_tier(id, stems.clone(), tier).await?;
            self.store_master(id, &master)
                .map_err(staged(JobStage::Mix))?;
        }

        self.jobs
            .update(id, |r| r.status = JobStatus::Completed)
            .map_err(staged(JobStage::Mix))?;
        info!(job = %id, "song job completed");
        Ok(())
    }

    /// Writes a master's audio and stems to the object store and appends
    /// its record to the job.
    fn store_master(&self, id: &JobId, master: &Master) -> Result<MasterRecord, SongError> {
        let object = self.store.put(&master.audio)?;
        let mut stem_objects = Vec::with_capacity(master.stem_audio.len());
        for (kind, bytes) in &master.stem_audio {
            stem_objects.push((*kind, self.store.put(bytes)?));
        }
        let stored = MasterRecord {
            tier: master.tier,
            format: master.format,
            watermarked: master.watermarked,
            stems_included: master.stems_included,
            pcm_hash: master.pcm_hash.clone(),
            object,
            stem_objects,
        };
        self.jobs.update(id, |record| {
            record.masters.retain(|m| m.tier != stored.tier);
            record.masters.push(stored.clone());
        })?;
        Ok(stored)
    }

    /// Reassembles the full stem set for a completed job from the render
    /// cache.
    fn cached_stems(&self, record: &JobRecord) -> Result<Vec<Stem>, SongError> {
        let key = record.render_key.as_ref().ok_or_else(|| {
            SongError::synthesis(format!("job {} has no render key", record.id))
        })?;
        let vocal = self
            .cache
            .lookup(key, RenderComponent::Vocal)?
            .ok_or_else(|| SongError::synthesis("vocal stems evicted from cache"))?;
        let instrumental = self
            .cache
            .lookup(key, RenderComponent::Instrumental)?
            .ok_or_else(|| SongError::synthesis("instrumental stems evicted from cache"))?;
        let mut stems = vocal;
        stems.extend(instrumental);
        Ok(stems)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use songforge_core::voice::StockVoice;
    use songforge_voice::ProfileStatus;

    const LYRICS: &str = "shine on through the night\nwe sing until the light";

    /// Builds a mono PCM16 WAV of a sine tone, the minimal valid upload.
    fn sine_wav(frequency: f64, seconds: f64, sample_rate: u32) -> Vec<u8> {
        let count = (seconds * sample_rate as f64) as usize;
        let mut data = Vec::with_capacity(count * 2);
        for i in 0..count {
            let t = i as f64 / sample_rate as f64;
            let sample = (0.4 * (std::f64::consts::TAU * frequency * t).sin() * 32767.0) as i16;
            data.extend_from_slice(&sample.to_le_bytes());
        }
        let byte_rate = sample_rate * 2;
        let mut wav = Vec::with_capacity(44 + data.len());
        wav.extend_from_slice(b"RIFF");
        wav.extend_from_slice(&(36 + data.len() as u32).to_le_bytes());
        wav.extend_from_slice(b"WAVE");
        wav.extend_from_slice(b"fmt ");
        wav.extend_from_slice(&16u32.to_le_bytes());
        wav.extend_from_slice(&1u16.to_le_bytes());
        wav.extend_from_slice(&1u16.to_le_bytes());
        wav.extend_from_slice(&sample_rate.to_le_bytes());
        wav.extend_from_slice(&byte_rate.to_le_bytes());
        wav.extend_from_slice(&2u16.to_le_bytes());
        wav.extend_from_slice(&16u16.to_le_bytes());
        wav.extend_from_slice(b"data");
        wav.extend_from_slice(&(data.len() as u32).to_le_bytes());
        wav.extend_from_slice(&data);
        wav
    }

    fn tiny_service() -> SongService {
        SongService::new(
            PipelineConfig::default()
                .with_tiers(vec![Tier::Preview])
                .with_stage_timeout(Duration::from_secs(120)),
        )
        .unwrap()
    }

    async fn wait_terminal(service: &SongService, id: &JobId) -> JobStatus {
        for _ in 0..600 {
            let status = service.job_status(id).unwrap();
            if status.is_terminal() {
                return status;
            }
            tokio::time::sleep(Duration::from_millis(200)).await;
        }
        panic!("job never reached a terminal status");
    }

    #[tokio::test]
    async fn create_song_completes_and_masters() {
        let service = tiny_service();
        let id = service
            .create_song(LYRICS, "pop", VoiceSpec::Stock(StockVoice::Nova), None)
            .unwrap();
        assert_eq!(wait_terminal(&service, &id).await, JobStatus::Completed);

        let (record, bytes) = service.master(&id, Tier::Preview).await.unwrap();
        assert!(record.watermarked);
        assert_eq!(&bytes[..4], b"RIFF");
    }

    #[tokio::test]
    async fn on_demand_master_for_non_eager_tier() {
        let service = tiny_service();
        let id = service
            .create_song(LYRICS, "electronic", VoiceSpec::Stock(StockVoice::Ember), None)
            .unwrap();
        assert_eq!(wait_terminal(&service, &id).await, JobStatus::Completed);

        // Studio was not in the eager tier set.
        let (record, bytes) = service.master(&id, Tier::Studio).await.unwrap();
        assert!(record.stems_included);
        assert_eq!(record.stem_objects.len(), 5);
        assert!(!bytes.is_empty());
    }

    #[tokio::test]
    async fn unknown_genre_is_rejected_at_submission() {
        let service = tiny_service();
        let err = service
            .create_song(LYRICS, "polka", VoiceSpec::Stock(StockVoice::Nova), None)
            .unwrap_err();
        assert_eq!(err.kind(), "invalid_input");
    }

    #[tokio::test]
    async fn unknown_voice_is_rejected_at_submission() {
        let service = tiny_service();
        let err = service
            .create_song(
                LYRICS,
                "pop",
                VoiceSpec::Cloned(ProfileId::new("nope")),
                None,
            )
            .unwrap_err();
        assert_eq!(err.kind(), "not_found");
    }

    #[tokio::test]
    async fn master_of_missing_job_is_not_found() {
        let service = tiny_service();
        let err = service
            .master(&JobId::new("beef", 9), Tier::Clean)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "not_found");
    }

    #[tokio::test]
    async fn voice_registration_extracts_in_background() {
        let service = tiny_service();
        let wav = sine_wav(220.0, 4.0, 44_100);
        let id = service.register_voice(&wav, "tenor").unwrap();

        let mut status = ProfileStatus::Pending;
        for _ in 0..600 {
            status = service
                .list_voices()
                .into_iter()
                .find(|p| p.id == id)
                .map(|p| p.status)
                .unwrap();
            if status != ProfileStatus::Pending {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(status, ProfileStatus::Ready);
    }

    #[tokio::test]
    async fn cloned_voice_sings_once_ready() {
        let service = tiny_service();
        let wav = sine_wav(196.0, 4.0, 44_100);
        let profile = service.register_voice(&wav, "baritone").unwrap();

        for _ in 0..600 {
            let ready = service
                .list_voices()
                .iter()
                .any(|p| p.id == profile && p.is_ready());
            if ready {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        let id = service
            .create_song(LYRICS, "ballad", VoiceSpec::Cloned(profile), None)
            .unwrap();
        assert_eq!(wait_terminal(&service, &id).await, JobStatus::Completed);
    }

    #[tokio::test]
    async fn deleted_voice_fails_the_vocal_stage() {
        let service = tiny_service();
        let wav = sine_wav(330.0, 4.0, 44_100);
        let profile = service.register_voice(&wav, "alto").unwrap();

        // Delete before the job's vocal stage can run.
        let id = service
            .create_song(LYRICS, "pop", VoiceSpec::Cloned(profile.clone()), None)
            .unwrap();
        service.delete_voice(&profile).unwrap();

        match wait_terminal(&service, &id).await {
            JobStatus::Failed { stage, kind } => {
                assert_eq!(stage, "vocal_synthesis");
                assert_eq!(kind, "voice_not_ready");
            }
            // The vocal stage can win the race when the scheduler runs it
            // before the deletion.
            JobStatus::Completed => {}
            other => panic!("unexpected status: {:?}", other),
        }
    }
}
