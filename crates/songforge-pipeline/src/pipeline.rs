//! Stage orchestration: cached dual-path rendering and tier mastering.
//!
//! Vocal and instrumental synthesis run as independent blocking tasks
//! gated by a shared worker pool, each under its own wall-clock timeout.
//! Results land in the [`RenderCache`] keyed by the canonical render key
//! as soon as each path completes, so a failure on one path never costs
//! the stems the other path already produced.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use songforge_core::arrangement::SymbolicArrangement;
use songforge_core::error::SongError;
use songforge_core::hash::render_key;
use songforge_core::master::{Master, Tier};
use songforge_core::stem::Stem;
use songforge_core::version::{INSTRUMENT_RENDER_VERSION, VOCAL_SYNTH_VERSION};
use songforge_core::voice::VoiceSpec;
use songforge_mix::mix;
use songforge_render::render_instrumental;
use songforge_voice::{synthesizer_for, VoiceBank};
use thiserror::Error;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::cache::{RenderCache, RenderComponent};
use crate::config::PipelineConfig;
use crate::job::{JobId, JobStage};
use crate::notify::{StageEvent, StageOutcome, StatusNotifier};

/// A [`SongError`] tagged with the pipeline stage it arose in, so job
/// records can name the failing stage.
#[derive(Debug, Error)]
#[error("{stage}: {error}")]
pub struct StageError {
    pub stage: JobStage,
    #[source]
    pub error: SongError,
}

impl StageError {
    pub fn new(stage: JobStage, error: impl Into<SongError>) -> Self {
        Self {
            stage,
            error: error.into(),
        }
    }
}

impl From<StageError> for SongError {
    fn from(err: StageError) -> Self {
        err.error
    }
}

/// Renders stems and masters for song jobs.
pub struct RenderPipeline {
    bank: Arc<VoiceBank>,
    cache: Arc<RenderCache>,
    notifier: Arc<dyn StatusNotifier>,
    workers: Arc<Semaphore>,
    stage_timeout: Duration,
    renders_started: AtomicU64,
}

impl RenderPipeline {
    pub fn new(
        config: &PipelineConfig,
        bank: Arc<VoiceBank>,
        cache: Arc<RenderCache>,
        notifier: Arc<dyn StatusNotifier>,
    ) -> Self {
        Self {
            bank,
            cache,
            notifier,
            workers: Arc::new(Semaphore::new(config.worker_slots.max(1))),
            stage_timeout: config.stage_timeout,
            renders_started: AtomicU64::new(0),
        }
    }

    /// Number of render stages that actually ran, as opposed to being
    /// served from cache.
    pub fn renders_started(&self) -> u64 {
        self.renders_started.load(Ordering::Relaxed)
    }

    /// Produces the full stem set for an arrangement: vocal first, then
    /// the instrumental stems in mixing order.
    ///
    /// Both paths run concurrently. The returned error is the vocal
    /// path's when both fail.
    pub async fn produce_stems(
        &self,
        job: &JobId,
        arrangement: &SymbolicArrangement,
        voice_spec: &VoiceSpec,
    ) -> Result<Vec<Stem>, StageError> {
        let key = render_key(
            arrangement,
            voice_spec,
            &[VOCAL_SYNTH_VERSION, INSTRUMENT_RENDER_VERSION],
        )
        .map_err(|e| StageError::new(JobStage::Compose, e))?;

        let vocal_path = self.render_component(job, &key, RenderComponent::Vocal, {
            let synth = synthesizer_for(voice_spec, Arc::clone(&self.bank));
            let arrangement = arrangement.clone();
            move || {
                let stem = synth.synthesize_vocal(&arrangement)?;
                Ok(vec![stem])
            }
        });
        let instrumental_path =
            self.render_component(job, &key, RenderComponent::Instrumental, {
                let arrangement = arrangement.clone();
                move || Ok(render_instrumental(&arrangement)?)
            });

        let (vocal, instrumental) = tokio::join!(vocal_path, instrumental_path);
        let mut stems = vocal?;
        stems.extend(instrumental?);
        Ok(stems)
    }

    /// Mixes a stem set down to one tier's master under the stage timeout.
    pub async fn master_tier(
        &self,
        job: &JobId,
        stems: Vec<Stem>,
        tier: Tier,
    ) -> Result<Master, StageError> {
        let master = self
            .run_stage(job, JobStage::Mix, move || Ok(mix(&stems, tier)?))
            .await
            .map_err(|e| StageError::new(JobStage::Mix, e))?;
        info!(job = %job, tier = tier.as_str(), hash = %master.pcm_hash, "mastered tier");
        Ok(master)
    }

    async fn render_component<F>(
        &self,
        job: &JobId,
        key: &str,
        component: RenderComponent,
        work: F,
    ) -> Result<Vec<Stem>, StageError>
    where
        F: FnOnce() -> Result<Vec<Stem>, SongError> + Send + 'static,
    {
        let stage = match component {
            RenderComponent::Vocal => JobStage::VocalSynthesis,
            RenderComponent::Instrumental => JobStage::InstrumentalRender,
        };
        let staged = |e: SongError| StageError::new(stage, e);

        if let Some(stems) = self.cache.lookup(key, component).map_err(staged)? {
            debug!(job = %job, key, component = component.as_str(), "render cache hit");
            return Ok(stems);
        }

        self.renders_started.fetch_add(1, Ordering::Relaxed);
        let stems = self.run_stage(job, stage, work).await.map_err(staged)?;
        self.cache.insert(key, component, &stems).map_err(staged)?;
        Ok(stems)
    }

    /// Runs blocking stage work on the worker pool under the stage
    /// timeout, emitting start and outcome events.
    ///
    /// On timeout the worker thread is left to finish on its own and its
    /// result is discarded; only the stage's budget is reclaimed.
    async fn run_stage<T, F>(&self, job: &JobId, stage: JobStage, work: F) -> Result<T, SongError>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T, SongError> + Send + 'static,
    {
        let _permit = self
            .workers
            .acquire()
            .await
            .map_err(|_| SongError::synthesis("worker pool closed"))?;
        self.notifier.notify(StageEvent {
            job: job.clone(),
            stage,
            outcome: StageOutcome::Started,
        });

        let handle = tokio::task::spawn_blocking(work);
        let result = match tokio::time::timeout(self.stage_timeout, handle).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_err)) => Err(SongError::synthesis(format!(
                "{} worker panicked: {}",
                stage, join_err
            ))),
            Err(_elapsed) => Err(SongError::stage_timeout(stage.as_str())),
        };

        match &result {
            Ok(_) => {
                self.notifier.notify(StageEvent {
                    job: job.clone(),
                    stage,
                    outcome: StageOutcome::Completed,
                });
            }
            Err(e) => {
                warn!(job = %job, stage = stage.as_str(), error = %e, "stage failed");
                self.notifier.notify(StageEvent {
                    job: job.clone(),
                    stage,
                    outcome: StageOutcome::Failed {
                        kind: e.kind().to_string(),
                    },
                });
            }
        }
        result
    }
}
