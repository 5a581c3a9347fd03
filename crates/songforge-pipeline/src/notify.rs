//! Stage completion notifications.

use tokio::sync::broadcast;

use crate::job::{JobId, JobStage};

/// Outcome of one pipeline stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome {
    Started,
    Completed,
    Failed { kind: String },
}

/// Event emitted whenever a job stage starts or finishes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageEvent {
    pub job: JobId,
    pub stage: JobStage,
    pub outcome: StageOutcome,
}

/// Sink for stage events. Implementations must not block.
pub trait StatusNotifier: Send + Sync {
    fn notify(&self, event: StageEvent);
}

/// Notifier that drops every event.
pub struct NullNotifier;

impl StatusNotifier for NullNotifier {
    fn notify(&self, _event: StageEvent) {}
}

/// Fan-out notifier over a tokio broadcast channel. Slow subscribers
/// lag and lose events rather than backpressuring the pipeline.
pub struct ChannelNotifier {
    tx: broadcast::Sender<StageEvent>,
}

impl ChannelNotifier {
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StageEvent> {
        self.tx.subscribe()
    }
}

impl StatusNotifier for ChannelNotifier {
    fn notify(&self, event: StageEvent) {
        // Send fails only when no subscriber is listening.
        let _ = self.tx.send(event);
    }
}
