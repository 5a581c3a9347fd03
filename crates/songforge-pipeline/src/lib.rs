//! Songforge Pipeline
//!
//! Async orchestration of the song synthesis pipeline. One submitted
//! request becomes a job that moves through four stages:
//!
//! 1. **compose** — lyrics to a symbolic arrangement, inline (cheap).
//! 2. **vocal synthesis** and **instrumental render** — concurrent
//!    blocking tasks on a bounded worker pool, each under its own
//!    timeout, with results cached by canonical render key.
//! 3. **mix** — stems to tiered masters, only once every stem exists.
//!
//! [`SongService`] is the entry point; everything else supports it.

pub mod cache;
pub mod config;
pub mod job;
pub mod notify;
pub mod pipeline;
pub mod service;
pub mod store;

pub use cache::{RenderCache, RenderComponent};
pub use config::PipelineConfig;
pub use job::{JobId, JobRecord, JobStage, JobStatus, JobStore, MasterRecord};
pub use notify::{ChannelNotifier, NullNotifier, StageEvent, StageOutcome, StatusNotifier};
pub use pipeline::{RenderPipeline, StageError};
pub use service::SongService;
pub use store::{FsStore, MemoryStore, ObjectStore};
