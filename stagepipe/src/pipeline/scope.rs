//! Per-run bookkeeping: run ids, logging and event emission.

use crate::events::{EventKind, EventSink, PipelineEvent};
use std::time::{Duration, Instant};
use tracing::{debug, trace};
use uuid::Uuid;

/// Identity and reporting for one traversal of one pipeline.
///
/// Nested pipelines get their own scope linked to the enclosing run.
pub(crate) struct RunScope<'a> {
    pipeline: &'a str,
    sink: &'a dyn EventSink,
    run_id: Uuid,
    parent_run_id: Option<Uuid>,
    started: Instant,
}

impl<'a> RunScope<'a> {
    pub(crate) fn begin(
        pipeline: &'a str,
        sink: &'a dyn EventSink,
        parent_run_id: Option<Uuid>,
        stage_count: usize,
    ) -> Self {
        let scope = Self {
            pipeline,
            sink,
            run_id: Uuid::new_v4(),
            parent_run_id,
            started: Instant::now(),
        };
        debug!(
            pipeline = pipeline,
            run_id = %scope.run_id,
            parent_run_id = ?parent_run_id,
            stages = stage_count,
            "Pipeline started"
        );
        scope.emit(EventKind::PipelineStarted, |e| e);
        scope
    }

    pub(crate) const fn pipeline(&self) -> &'a str {
        self.pipeline
    }

    pub(crate) const fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub(crate) fn stage_started(&self, index: usize, stage: &str) {
        trace!(stage = stage, index = index, "Stage started");
        self.emit(EventKind::StageStarted, |e| e.with_stage(stage, index));
    }

    pub(crate) fn stage_finished(&self, index: usize, stage: &str, elapsed: Duration, ok: bool) {
        let kind = if ok {
            trace!(stage = stage, index = index, "Stage returned");
            EventKind::StageCompleted
        } else {
            debug!(stage = stage, index = index, "Stage failed");
            EventKind::StageFailed
        };
        self.emit(kind, |e| e.with_stage(stage, index).with_duration(elapsed));
    }

    pub(crate) fn finish(&self, reached_end: bool, ok: bool) {
        let kind = match (reached_end, ok) {
            (_, false) => EventKind::PipelineFailed,
            (true, true) => EventKind::PipelineCompleted,
            (false, true) => EventKind::PipelineShortCircuited,
        };
        let elapsed = self.started.elapsed();
        debug!(
            pipeline = self.pipeline,
            run_id = %self.run_id,
            outcome = %kind,
            duration_ms = elapsed.as_secs_f64() * 1000.0,
            "Pipeline finished"
        );
        self.emit(kind, |e| e.with_duration(elapsed));
    }

    fn emit(&self, kind: EventKind, build: impl FnOnce(PipelineEvent) -> PipelineEvent) {
        if !self.sink.is_enabled() {
            return;
        }
        let event = PipelineEvent::new(kind, self.pipeline, self.run_id).with_parent(self.parent_run_id);
        self.sink.emit(&build(event));
    }
}
