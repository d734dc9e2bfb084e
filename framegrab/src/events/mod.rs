//! Lifecycle events for pipeline runs.
//!
//! The orchestrator reports every state change and stage outcome as a
//! [`PipelineEvent`] through an [`EventSink`]. Sinks never fail a run.

mod sink;

pub use sink::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Event emitted when a run starts.
pub const PIPELINE_STARTED: &str = "pipeline.started";
/// Event emitted on every state transition.
pub const STATE_CHANGED: &str = "pipeline.state_changed";
/// Event emitted before a stage executes.
pub const STAGE_STARTED: &str = "stage.started";
/// Event emitted after a stage succeeds.
pub const STAGE_COMPLETED: &str = "stage.completed";
/// Event emitted when a stage fails.
pub const STAGE_FAILED: &str = "stage.failed";
/// Event emitted for each non-fatal stage warning.
pub const STAGE_WARNING: &str = "stage.warning";
/// Event emitted when a run reaches `Done`.
pub const PIPELINE_COMPLETED: &str = "pipeline.completed";
/// Event emitted when a run reaches `Failed`.
pub const PIPELINE_FAILED: &str = "pipeline.failed";

/// One lifecycle event.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineEvent {
    /// Event name, e.g. `stage.started`.
    pub event_type: &'static str,
    /// The run that emitted the event.
    pub run_id: Uuid,
    /// When the event was emitted.
    pub timestamp: DateTime<Utc>,
    /// Event payload.
    pub data: serde_json::Value,
}

impl PipelineEvent {
    /// Creates an event timestamped now.
    #[must_use]
    pub fn new(event_type: &'static str, run_id: Uuid, data: serde_json::Value) -> Self {
        Self {
            event_type,
            run_id,
            timestamp: Utc::now(),
            data,
        }
    }

    /// Returns a payload field, if present.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.data.get(key)
    }
}
