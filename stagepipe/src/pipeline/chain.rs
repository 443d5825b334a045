//! The linear pipeline engine.

use super::scope::RunScope;
use super::{Next, Outcome};
use crate::errors::StageError;
use crate::events::{EventSink, NoOpEventSink};
use crate::stages::{FnStage, MapStage, Stage};
use std::cell::Cell;
use std::fmt::Debug;
use std::sync::Arc;
use uuid::Uuid;

const DEFAULT_NAME: &str = "pipeline";

/// An ordered chain of stages executed against a single payload.
///
/// Stages run in the order they were piped. Each receives the payload and a
/// [`Next`] continuation; the chain ends when the last stage forwards (the
/// payload is returned unchanged from there), when a stage returns without
/// forwarding, or when a stage fails.
///
/// A `Pipeline` is itself a [`Stage`], so it can be piped into another
/// pipeline. Cloning is cheap: clones share their stages.
///
/// # Examples
///
/// ```
/// use stagepipe::prelude::*;
///
/// let pipeline = Pipeline::<i32>::named("arithmetic")
///     .pipe_map("double", |n| Ok(n * 2))
///     .pipe_map("increment", |n| Ok(n + 1));
///
/// assert_eq!(pipeline.process(5).unwrap(), 11);
/// ```
pub struct Pipeline<P, E = StageError> {
    name: String,
    stages: Vec<Arc<dyn Stage<P, E>>>,
    sink: Arc<dyn EventSink>,
}

impl<P, E> Pipeline<P, E> {
    /// Creates an empty pipeline.
    #[must_use]
    pub fn new() -> Self {
        Self::named(DEFAULT_NAME)
    }

    /// Creates an empty pipeline with a name used in logs and events.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stages: Vec::new(),
            sink: Arc::new(NoOpEventSink),
        }
    }

    /// Sets the sink receiving this pipeline's events.
    ///
    /// Nested pipelines report to their own sink.
    #[must_use]
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Appends a stage that may already be referenced elsewhere.
    #[must_use]
    pub fn pipe_shared(mut self, stage: Arc<dyn Stage<P, E>>) -> Self {
        self.stages.push(stage);
        self
    }

    /// Returns the pipeline name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the number of stages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Returns true if the pipeline has no stages.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Returns the stage names in execution order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Runs the chain against `payload`.
    ///
    /// An empty pipeline returns the payload unchanged. A stage failure is
    /// returned exactly as the stage produced it.
    pub fn process(&self, payload: P) -> Result<P, E> {
        self.run(payload).map(Outcome::into_inner)
    }

    /// Runs the chain and reports whether it completed or was short-circuited.
    pub fn run(&self, payload: P) -> Result<Outcome<P>, E> {
        let (result, reached_end) = self.drive(payload, None, None);
        result.map(|value| Outcome::new(reached_end, value))
    }

    fn drive(
        &self,
        payload: P,
        parent_run_id: Option<Uuid>,
        resume: Option<Next<'_, P, E>>,
    ) -> (Result<P, E>, bool) {
        let scope = RunScope::begin(&self.name, self.sink.as_ref(), parent_run_id, self.stages.len());
        let reached = Cell::new(false);
        let result = Next::start(&self.stages, &scope, &reached, resume).run(payload);
        scope.finish(reached.get(), result.is_ok());
        (result, reached.get())
    }
}

impl<P: 'static, E: 'static> Pipeline<P, E> {
    /// Appends a stage.
    #[must_use]
    pub fn pipe(self, stage: impl Stage<P, E> + 'static) -> Self {
        self.pipe_shared(Arc::new(stage))
    }

    /// Appends a stage built from a closure receiving the payload and the
    /// continuation.
    #[must_use]
    pub fn pipe_fn<F>(self, name: impl Into<String>, func: F) -> Self
    where
        F: Fn(P, Next<'_, P, E>) -> Result<P, E> + Send + Sync + 'static,
    {
        self.pipe(FnStage::new(name, func))
    }

    /// Appends a stage that transforms the payload and always forwards it.
    #[must_use]
    pub fn pipe_map<F>(self, name: impl Into<String>, func: F) -> Self
    where
        F: Fn(P) -> Result<P, E> + Send + Sync + 'static,
    {
        self.pipe(MapStage::new(name, func))
    }
}

impl<P, E> Stage<P, E> for Pipeline<P, E> {
    fn name(&self) -> &str {
        &self.name
    }

    /// Runs this pipeline's stages, then hands the payload to the outer
    /// continuation. If an inner stage short-circuits, the outer chain stops
    /// there as well.
    fn handle(&self, payload: P, next: Next<'_, P, E>) -> Result<P, E> {
        let parent_run_id = next.run_id();
        self.drive(payload, Some(parent_run_id), Some(next)).0
    }
}

impl<P, E> Default for Pipeline<P, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P, E> Clone for Pipeline<P, E> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            stages: self.stages.clone(),
            sink: Arc::clone(&self.sink),
        }
    }
}

impl<P, E> Debug for Pipeline<P, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("name", &self.name)
            .field("stages", &self.stage_names())
            .finish()
    }
}
