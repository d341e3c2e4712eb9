//! Typed progress events fanned out to observers.
//!
//! The bus wraps a `tokio::sync::broadcast` channel so any number of
//! observers (a UI, a logger, a test harness) can independently follow a
//! run. Publishing never blocks; with no subscribers an event is dropped.

use crate::pipeline::run::{RunId, Stage, StageOutcome, StageSummary};
use serde::Serialize;
use tokio::sync::broadcast;

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 256;

/// Lifecycle event of one pipeline run.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PipelineEvent {
    StageStarted {
        run_id: RunId,
        stage: Stage,
    },
    StageProgress {
        run_id: RunId,
        stage: Stage,
        percent: u8,
        message: String,
    },
    StageFinished {
        run_id: RunId,
        stage: Stage,
        outcome: StageOutcome,
    },
    RunCompleted {
        run_id: RunId,
        summary: Vec<StageSummary>,
    },
    RunCancelled {
        run_id: RunId,
    },
    RunFailed {
        run_id: RunId,
        cause: String,
    },
}

/// In-process fan-out bus for [`PipelineEvent`]s.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<PipelineEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity. Slow receivers that
    /// fall more than `capacity` events behind observe a lagged error.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    pub fn publish(&self, event: PipelineEvent) {
        // SendError only means there are zero receivers right now.
        let _ = self.sender.send(event);
    }

    /// Subscribe to all events published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<PipelineEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
