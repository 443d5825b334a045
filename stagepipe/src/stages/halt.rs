//! Early-exit stage.

use super::Stage;
use crate::pipeline::Next;
use std::fmt::Debug;
use tracing::debug;

/// Ends the chain with the payload unchanged when a predicate holds.
///
/// Typical use is skipping the remaining work when there is nothing to
/// process. When the predicate is false the payload is forwarded.
pub struct Halt<F> {
    name: String,
    predicate: F,
}

impl<F> Halt<F> {
    /// Creates a stage that short-circuits whenever `predicate` returns true.
    pub fn when<P>(name: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&P) -> bool,
    {
        Self {
            name: name.into(),
            predicate,
        }
    }
}

impl<F> Debug for Halt<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Halt").field("name", &self.name).finish()
    }
}

impl<P, E, F> Stage<P, E> for Halt<F>
where
    F: Fn(&P) -> bool + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn handle(&self, payload: P, next: Next<'_, P, E>) -> Result<P, E> {
        if (self.predicate)(&payload) {
            debug!(stage = %self.name, skipped = next.remaining(), "Halting pipeline");
            return Ok(payload);
        }
        next.run(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{Outcome, Pipeline};

    fn pipeline() -> Pipeline<Vec<u32>> {
        Pipeline::<Vec<u32>>::new()
            .pipe(Halt::when("empty", |items: &Vec<u32>| items.is_empty()))
            .pipe_map("sum", |items| Ok(vec![items.iter().sum()]))
    }

    #[test]
    fn test_halt_short_circuits_when_predicate_holds() {
        assert_eq!(pipeline().run(Vec::new()).unwrap(), Outcome::ShortCircuited(Vec::new()));
    }

    #[test]
    fn test_halt_forwards_otherwise() {
        assert_eq!(pipeline().run(vec![1, 2, 3]).unwrap(), Outcome::Completed(vec![6]));
    }
}
