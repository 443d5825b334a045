//! Test fixtures for pipeline testing.

use crate::errors::StageError;
use crate::pipeline::Next;
use crate::stages::Stage;

/// A payload that records which stages touched it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Trail {
    /// Stage tags in the order they were appended.
    pub tags: Vec<String>,
    /// Set by [`SentinelStage`].
    pub sentinel: Option<String>,
}

impl Trail {
    /// Creates an empty trail.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the tags as string slices.
    #[must_use]
    pub fn tags(&self) -> Vec<&str> {
        self.tags.iter().map(String::as_str).collect()
    }
}

/// Appends its tag to a [`Trail`] and forwards it.
#[derive(Debug, Clone)]
pub struct TagStage {
    tag: String,
}

impl TagStage {
    /// Creates a stage appending `tag`.
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self { tag: tag.into() }
    }
}

impl Stage<Trail> for TagStage {
    fn name(&self) -> &str {
        &self.tag
    }

    fn handle(&self, mut payload: Trail, next: Next<'_, Trail>) -> Result<Trail, StageError> {
        payload.tags.push(self.tag.clone());
        next.run(payload)
    }
}

/// Sets the sentinel field of a [`Trail`] and forwards it.
///
/// Useful as the last stage to prove the chain reached the end.
#[derive(Debug, Clone)]
pub struct SentinelStage {
    value: String,
}

impl SentinelStage {
    /// Creates a stage setting the sentinel to `value`.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }
}

impl Stage<Trail> for SentinelStage {
    fn name(&self) -> &str {
        "sentinel"
    }

    fn handle(&self, mut payload: Trail, next: Next<'_, Trail>) -> Result<Trail, StageError> {
        payload.sentinel = Some(self.value.clone());
        next.run(payload)
    }
}
