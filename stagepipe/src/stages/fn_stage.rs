//! Closure-backed stages.

use super::Stage;
use crate::pipeline::Next;
use std::fmt::Debug;

/// A stage backed by a closure that receives the payload and the continuation.
pub struct FnStage<F> {
    name: String,
    func: F,
}

impl<F> FnStage<F> {
    /// Creates a new function-based stage.
    pub fn new<P, E>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(P, Next<'_, P, E>) -> Result<P, E>,
    {
        Self {
            name: name.into(),
            func,
        }
    }
}

impl<F> Debug for FnStage<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnStage").field("name", &self.name).finish()
    }
}

impl<P, E, F> Stage<P, E> for FnStage<F>
where
    F: Fn(P, Next<'_, P, E>) -> Result<P, E> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn handle(&self, payload: P, next: Next<'_, P, E>) -> Result<P, E> {
        (self.func)(payload, next)
    }
}

/// A stage that transforms the payload and always forwards the result.
///
/// A failing transform aborts the chain like any other stage failure.
pub struct MapStage<F> {
    name: String,
    func: F,
}

impl<F> MapStage<F> {
    /// Creates a new mapping stage.
    pub fn new<P, E>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(P) -> Result<P, E>,
    {
        Self {
            name: name.into(),
            func,
        }
    }
}

impl<F> Debug for MapStage<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapStage").field("name", &self.name).finish()
    }
}

impl<P, E, F> Stage<P, E> for MapStage<F>
where
    F: Fn(P) -> Result<P, E> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn handle(&self, payload: P, next: Next<'_, P, E>) -> Result<P, E> {
        let payload = (self.func)(payload)?;
        next.run(payload)
    }
}
