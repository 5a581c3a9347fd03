//! Pipeline tuning knobs.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use songforge_core::master::Tier;

/// Configuration shared by the pipeline and the service facade.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Upper bound on concurrently running render stages across all jobs.
    pub worker_slots: usize,
    /// Wall-clock budget for each render or mix stage.
    pub stage_timeout: Duration,
    /// Root directory for objects, cache manifests and job records.
    /// `None` keeps everything in memory.
    pub data_dir: Option<PathBuf>,
    /// Tiers mastered eagerly when a job completes.
    pub tiers: Vec<Tier>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            worker_slots: 4,
            stage_timeout: Duration::from_secs(60),
            data_dir: None,
            tiers: Tier::all().to_vec(),
        }
    }
}

impl PipelineConfig {
    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(dir.into());
        self
    }

    pub fn with_stage_timeout(mut self, timeout: Duration) -> Self {
        self.stage_timeout = timeout;
        self
    }

    pub fn with_worker_slots(mut self, slots: usize) -> Self {
        self.worker_slots = slots.max(1);
        self
    }

    pub fn with_tiers(mut self, tiers: Vec<Tier>) -> Self {
        self.tiers = tiers;
        self
    }
}
