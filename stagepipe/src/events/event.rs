//! Typed lifecycle events emitted while a pipeline runs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// The kind of a [`PipelineEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A pipeline began running its stages.
    PipelineStarted,
    /// A stage was handed the payload.
    StageStarted,
    /// A stage returned successfully.
    StageCompleted,
    /// A stage returned an error.
    StageFailed,
    /// The pipeline reached its terminal.
    PipelineCompleted,
    /// A stage returned without continuing the chain.
    PipelineShortCircuited,
    /// The pipeline aborted with an error.
    PipelineFailed,
}

impl EventKind {
    /// Returns the dotted event type name (e.g. `stage.started`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PipelineStarted => "pipeline.started",
            Self::StageStarted => "stage.started",
            Self::StageCompleted => "stage.completed",
            Self::StageFailed => "stage.failed",
            Self::PipelineCompleted => "pipeline.completed",
            Self::PipelineShortCircuited => "pipeline.short_circuited",
            Self::PipelineFailed => "pipeline.failed",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single observation of pipeline execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineEvent {
    /// What happened.
    pub kind: EventKind,
    /// Name of the pipeline the event belongs to.
    pub pipeline: String,
    /// Identifier of the run, unique per `process` call or nested invocation.
    pub run_id: Uuid,
    /// Run id of the enclosing pipeline when nested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_run_id: Option<Uuid>,
    /// Stage name, for stage events.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    /// Zero-based stage position, for stage events.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
    /// Elapsed wall time, for completion events.
    ///
    /// Stages and nested pipelines hand the payload on to the rest of the
    /// chain, so this includes every stage that ran after them, and a nested
    /// pipeline's finish event arrives after the enclosing stages that follow it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<f64>,
    /// When the event was created.
    pub timestamp: DateTime<Utc>,
}

impl PipelineEvent {
    /// Creates a new event for `pipeline`.
    #[must_use]
    pub fn new(kind: EventKind, pipeline: impl Into<String>, run_id: Uuid) -> Self {
        Self {
            kind,
            pipeline: pipeline.into(),
            run_id,
            parent_run_id: None,
            stage: None,
            index: None,
            duration_ms: None,
            timestamp: Utc::now(),
        }
    }

    /// Sets the parent run id.
    #[must_use]
    pub fn with_parent(mut self, parent_run_id: Option<Uuid>) -> Self {
        self.parent_run_id = parent_run_id;
        self
    }

    /// Sets the stage name and position.
    #[must_use]
    pub fn with_stage(mut self, name: impl Into<String>, index: usize) -> Self {
        self.stage = Some(name.into());
        self.index = Some(index);
        self
    }

    /// Sets the elapsed duration.
    #[must_use]
    pub fn with_duration(mut self, elapsed: Duration) -> Self {
        self.duration_ms = Some(elapsed.as_secs_f64() * 1000.0);
        self
    }

    /// Returns the dotted event type name.
    #[must_use]
    pub const fn event_type(&self) -> &'static str {
        self.kind.as_str()
    }

    /// Converts the event to a JSON value.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}
