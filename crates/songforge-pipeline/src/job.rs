//! Job records and their persistence.
//!
//! A job covers one song request from submission to mastered output.
//! Records are serialized as JSON, one file per job, so a restarted
//! service can still answer status queries for past jobs.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use songforge_core::arrangement::SymbolicArrangement;
use songforge_core::error::SongError;
use songforge_core::genre::Genre;
use songforge_core::master::{MasterFormat, Tier};
use songforge_core::stem::StemKind;
use songforge_core::voice::VoiceSpec;
use tracing::warn;

use crate::store::storage_error;

/// Pipeline stage a job can fail in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStage {
    Compose,
    VocalSynthesis,
    InstrumentalRender,
    Mix,
}

impl JobStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStage::Compose => "compose",
            JobStage::VocalSynthesis => "vocal_synthesis",
            JobStage::InstrumentalRender => "instrumental_render",
            JobStage::Mix => "mix",
        }
    }
}

impl fmt::Display for JobStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state of a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed { stage: String, kind: String },
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed { .. })
    }
}

/// Unique job identifier: a request-hash prefix plus a per-process
/// counter, so resubmitting the same request yields distinct jobs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn new(request_hash: &str, sequence: u64) -> Self {
        let prefix = &request_hash[..request_hash.len().min(16)];
        JobId(format!("{}-{:04}", prefix, sequence))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        JobId(s.to_string())
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Location and format of one finished master.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MasterRecord {
    pub tier: Tier,
    pub format: MasterFormat,
    pub watermarked: bool,
    pub stems_included: bool,
    pub pcm_hash: String,
    /// Object store key of the encoded WAV.
    pub object: String,
    /// Object store keys of the per-stem WAVs, studio tier only.
    pub stem_objects: Vec<(StemKind, String)>,
}

/// Full persisted state of one song job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    pub id: JobId,
    pub created_at: DateTime<Utc>,
    pub status: JobStatus,
    pub lyrics: String,
    pub genre: Genre,
    pub voice_spec: VoiceSpec,
    pub tempo_bpm: Option<f64>,
    /// Set once the compose stage succeeds.
    pub arrangement: Option<SymbolicArrangement>,
    pub render_key: Option<String>,
    pub masters: Vec<MasterRecord>,
}

impl JobRecord {
    pub fn new(
        id: JobId,
        lyrics: String,
        genre: Genre,
        voice_spec: VoiceSpec,
        tempo_bpm: Option<f64>,
    ) -> Self {
        Self {
            id,
            created_at: Utc::now(),
            status: JobStatus::Pending,
            lyrics,
            genre,
            voice_spec,
            tempo_bpm,
            arrangement: None,
            render_key: None,
            masters: Vec::new(),
        }
    }

    pub fn master_for(&self, tier: Tier) -> Option<&MasterRecord> {
        self.masters.iter().find(|m| m.tier == tier)
    }
}

/// Job registry with optional JSON-file persistence.
pub struct JobStore {
    dir: Option<PathBuf>,
    jobs: RwLock<HashMap<JobId, JobRecord>>,
    sequence: AtomicU64,
}

impl JobStore {
    pub fn in_memory() -> Self {
        Self {
            dir: None,
            jobs: RwLock::new(HashMap::new()),
            sequence: AtomicU64::new(0),
        }
    }

    /// Opens a store backed by `dir`, loading any job files found there.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, SongError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| storage_error("create job dir", &dir, e))?;
        let mut jobs = HashMap::new();
        let entries = fs::read_dir(&dir).map_err(|e| storage_error("scan job dir", &dir, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| storage_error("scan job dir", &dir, e))?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match fs::read(&path).map_err(|e| e.to_string()).and_then(|bytes| {
                serde_json::from_slice::<JobRecord>(&bytes).map_err(|e| e.to_string())
            }) {
                Ok(record) => {
                    jobs.insert(record.id.clone(), record);
                }
                Err(reason) => {
                    warn!(path = %path.display(), %reason, "skipping unreadable job record");
                }
            }
        }
        Ok(Self {
            dir: Some(dir),
            jobs: RwLock::new(jobs),
            sequence: AtomicU64::new(0),
        })
    }

    /// Allocates the next job id for a request hash.
    pub fn next_id(&self, request_hash: &str) -> JobId {
        let seq = self.sequence.fetch_add(1, Ordering::Relaxed);
        JobId::new(request_hash, seq)
    }

    pub fn create(&self, record: JobRecord) -> Result<(), SongError> {
        self.persist(&record)?;
        let mut jobs = self
            .jobs
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        jobs.insert(record.id.clone(), record);
        Ok(())
    }

    pub fn get(&self, id: &JobId) -> Result<JobRecord, SongError> {
        let jobs = self
            .jobs
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        jobs.get(id)
            .cloned()
            .ok_or_else(|| SongError::not_found(format!("job {}", id)))
    }

    /// Applies `apply` to the record and persists the result.
    pub fn update<F>(&self, id: &JobId, apply: F) -> Result<JobRecord, SongError>
    where
        F: FnOnce(&mut JobRecord),
    {
        let updated = {
            let mut jobs = self
                .jobs
                .write()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            let record = jobs
                .get_mut(id)
                .ok_or_else(|| SongError::not_found(format!("job {}", id)))?;
            apply(record);
            record.clone()
        };
        self.persist(&updated)?;
        Ok(updated)
    }

    /// All jobs, newest first.
    pub fn list(&self) -> Vec<JobRecord> {
        let jobs = self
            .jobs
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut records: Vec<JobRecord> = jobs.values().cloned().collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        records
    }

    fn persist(&self, record: &JobRecord) -> Result<(), SongError> {
        let Some(dir) = &self.dir else {
            return Ok(());
        };
        let path = dir.join(format!("{}.json", record.id));
        let json = serde_json::to_vec_pretty(record)
            .map_err(|e| SongError::synthesis(format!("encode job record: {}", e)))?;
        fs::write(&path, json).map_err(|e| storage_error("write job record", &path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use songforge_core::voice::StockVoice;

    fn request(id: JobId) -> JobRecord {
        JobRecord::new(
            id,
            "la la la".into(),
            Genre::Pop,
            VoiceSpec::Stock(StockVoice::Nova),
            None,
        )
    }

    #[test]
    fn ids_are_unique_per_request() {
        let store = JobStore::in_memory();
        let hash = "0123456789abcdef0123456789abcdef";
        let a = store.next_id(hash);
        let b = store.next_id(hash);
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("0123456789abcdef-"));
    }

    #[test]
    fn missing_job_is_not_found() {
        let store = JobStore::in_memory();
        let err = store.get(&JobId::new("ff", 0)).unwrap_err();
        assert_eq!(err.kind(), "not_found");
    }

    #[test]
    fn update_persists_status() {
        let store = JobStore::in_memory();
        let id = store.next_id("abcd");
        store.create(request(id.clone())).unwrap();
        store
            .update(&id, |record| record.status = JobStatus::Running)
            .unwrap();
        assert_eq!(store.get(&id).unwrap().status, JobStatus::Running);
    }

    #[test]
    fn open_reloads_job_files() {
        let dir = tempfile::tempdir().unwrap();
        let id = {
            let store = JobStore::open(dir.path()).unwrap();
            let id = store.next_id("feedface");
            store.create(request(id.clone())).unwrap();
            store
                .update(&id, |record| {
                    record.status = JobStatus::Failed {
                        stage: "mix".into(),
                        kind: "encoding".into(),
                    }
                })
                .unwrap();
            id
        };
        let reopened = JobStore::open(dir.path()).unwrap();
        let record = reopened.get(&id).unwrap();
        assert!(record.status.is_terminal());
    }
}
