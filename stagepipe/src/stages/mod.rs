//! Stage trait and implementations.
//!
//! Stages are the units of work in a pipeline. Each one receives the payload
//! and a [`Next`] continuation, and decides whether to forward the payload,
//! return early, or fail.

mod fn_stage;
mod halt;
mod retry;

pub use fn_stage::{FnStage, MapStage};
pub use halt::Halt;
pub use retry::{BackoffStrategy, JitterStrategy, RetryConfig, RetryStage};

use crate::errors::StageError;
use crate::pipeline::Next;
use std::sync::Arc;

/// Trait for pipeline stages.
///
/// A stage owns the payload from the moment `handle` is called until it
/// either forwards it with [`Next::run`] or returns. Stages mutate the payload
/// in place while they own it.
///
/// - Forward: `next.run(payload)`, returning what the rest of the chain returns.
/// - Short-circuit: `Ok(value)` without touching `next`; later stages never run.
/// - Fail: `Err(e)`; the error reaches the caller of `process` unchanged.
///
/// Stages may be shared between pipelines and threads, so any internal state
/// must be synchronised.
pub trait Stage<P, E = StageError>: Send + Sync {
    /// Returns the name of the stage, used in logs and events.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Handles the payload.
    fn handle(&self, payload: P, next: Next<'_, P, E>) -> Result<P, E>;
}

impl<P, E, S> Stage<P, E> for Arc<S>
where
    S: Stage<P, E> + ?Sized,
{
    fn name(&self) -> &str {
        (**self).name()
    }

    fn handle(&self, payload: P, next: Next<'_, P, E>) -> Result<P, E> {
        (**self).handle(payload, next)
    }
}

impl<P, E, S> Stage<P, E> for Box<S>
where
    S: Stage<P, E> + ?Sized,
{
    fn name(&self) -> &str {
        (**self).name()
    }

    fn handle(&self, payload: P, next: Next<'_, P, E>) -> Result<P, E> {
        (**self).handle(payload, next)
    }
}

/// A stage that forwards the payload untouched.
#[derive(Debug, Clone)]
pub struct NoOpStage {
    name: String,
}

impl NoOpStage {
    /// Creates a new no-op stage.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl<P, E> Stage<P, E> for NoOpStage {
    fn name(&self) -> &str {
        &self.name
    }

    fn handle(&self, payload: P, next: Next<'_, P, E>) -> Result<P, E> {
        next.run(payload)
    }
}
