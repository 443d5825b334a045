//! Mock stages for testing.

use parking_lot::Mutex;
use uuid::Uuid;

use crate::errors::StageError;
use crate::pipeline::Next;
use crate::stages::Stage;

/// A stage that records each call and forwards the payload unchanged.
#[derive(Debug)]
pub struct RecordingStage {
    name: String,
    run_ids: Mutex<Vec<Uuid>>,
}

impl RecordingStage {
    /// Creates a new recording stage.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            run_ids: Mutex::new(Vec::new()),
        }
    }

    /// Returns the number of times the stage was called.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.run_ids.lock().len()
    }

    /// Returns the run id seen on each call, in call order.
    #[must_use]
    pub fn run_ids(&self) -> Vec<Uuid> {
        self.run_ids.lock().clone()
    }

    /// Resets call tracking.
    pub fn reset(&self) {
        self.run_ids.lock().clear();
    }
}

impl<P, E> Stage<P, E> for RecordingStage {
    fn name(&self) -> &str {
        &self.name
    }

    fn handle(&self, payload: P, next: Next<'_, P, E>) -> Result<P, E> {
        self.run_ids.lock().push(next.run_id());
        next.run(payload)
    }
}

/// A stage that always fails with a [`StageError`].
#[derive(Debug, Clone)]
pub struct FailingStage {
    name: String,
    message: String,
    retryable: bool,
}

impl FailingStage {
    /// Creates a new failing stage.
    #[must_use]
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
            retryable: false,
        }
    }

    /// Creates a stage failing with a retryable error.
    #[must_use]
    pub fn retryable(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            retryable: true,
            ..Self::new(name, message)
        }
    }
}

impl<P> Stage<P> for FailingStage {
    fn name(&self) -> &str {
        &self.name
    }

    fn handle(&self, _payload: P, _next: Next<'_, P>) -> Result<P, StageError> {
        Err(if self.retryable {
            StageError::retryable(&self.name, &self.message)
        } else {
            StageError::failed(&self.name, &self.message)
        })
    }
}

/// A stage that returns the payload without continuing the chain.
#[derive(Debug, Clone)]
pub struct ShortCircuitStage {
    name: String,
}

impl ShortCircuitStage {
    /// Creates a new short-circuiting stage.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl<P, E> Stage<P, E> for ShortCircuitStage {
    fn name(&self) -> &str {
        &self.name
    }

    fn handle(&self, payload: P, _next: Next<'_, P, E>) -> Result<P, E> {
        Ok(payload)
    }
}
