//! The continuation handed to every stage.

use super::scope::RunScope;
use super::Outcome;
use crate::errors::StageError;
use crate::stages::Stage;
use std::cell::Cell;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug_span;

/// The remainder of the chain after the current stage.
///
/// `Next` is a cursor into the stage list of the running pipeline. Calling
/// [`Next::run`] hands the payload to the stage under the cursor together with
/// a cursor advanced by one. Past the last stage the payload is returned as-is,
/// or, when the pipeline is nested, handed to the enclosing pipeline's cursor.
///
/// `run` consumes the cursor, so a stage can continue the chain at most once,
/// and the borrow ties it to the duration of the stage's `handle` call.
pub struct Next<'a, P, E = StageError> {
    stages: &'a [Arc<dyn Stage<P, E>>],
    index: usize,
    scope: &'a RunScope<'a>,
    end: End<'a, P, E>,
}

/// What happens once the cursor runs off the end of its stage list.
struct End<'a, P, E> {
    reached: &'a Cell<bool>,
    resume: Option<Box<Next<'a, P, E>>>,
}

impl<'a, P, E> End<'a, P, E> {
    fn finish(self, payload: P) -> Result<P, E> {
        self.reached.set(true);
        match self.resume {
            Some(outer) => outer.run(payload),
            None => Ok(payload),
        }
    }
}

impl<'a, P, E> Next<'a, P, E> {
    pub(crate) fn start(
        stages: &'a [Arc<dyn Stage<P, E>>],
        scope: &'a RunScope<'a>,
        reached: &'a Cell<bool>,
        resume: Option<Next<'a, P, E>>,
    ) -> Self {
        Self {
            stages,
            index: 0,
            scope,
            end: End {
                reached,
                resume: resume.map(Box::new),
            },
        }
    }

    /// Continues the chain with `payload`.
    ///
    /// Returns whatever the downstream stages return: the final payload, a
    /// short-circuit value, or a failure.
    pub fn run(self, payload: P) -> Result<P, E> {
        let Self {
            stages,
            index,
            scope,
            end,
        } = self;
        let Some((stage, rest)) = stages.split_first() else {
            return end.finish(payload);
        };

        let name = stage.name();
        let span = debug_span!("stage", pipeline = scope.pipeline(), stage = name, index = index);
        let _entered = span.enter();

        scope.stage_started(index, name);
        let started = Instant::now();
        let next = Self {
            stages: rest,
            index: index + 1,
            scope,
            end,
        };
        let result = stage.handle(payload, next);
        scope.stage_finished(index, name, started.elapsed(), result.is_ok());
        result
    }

    /// Runs `stage` on its own, with a continuation that ends immediately.
    ///
    /// This continuation is left untouched, so a decorator can inspect the
    /// result, run the stage again, and only then decide whether to continue.
    pub fn run_detached(&self, stage: &dyn Stage<P, E>, payload: P) -> Result<Outcome<P>, E> {
        let reached = Cell::new(false);
        let detached = Next {
            stages: &[],
            index: self.index,
            scope: self.scope,
            end: End {
                reached: &reached,
                resume: None,
            },
        };
        let value = stage.handle(payload, detached)?;
        Ok(Outcome::new(reached.get(), value))
    }

    /// Returns the number of stages left in the current pipeline.
    ///
    /// Stages of enclosing pipelines are not counted.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.stages.len()
    }

    /// Returns the name of the pipeline this cursor walks.
    #[must_use]
    pub const fn pipeline(&self) -> &str {
        self.scope.pipeline()
    }

    /// Returns the id of the current run.
    #[must_use]
    pub const fn run_id(&self) -> uuid::Uuid {
        self.scope.run_id()
    }
}

impl<P, E> std::fmt::Debug for Next<'_, P, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Next")
            .field("pipeline", &self.scope.pipeline())
            .field("index", &self.index)
            .field("remaining", &self.stages.len())
            .field("nested", &self.end.resume.is_some())
            .finish()
    }
}
