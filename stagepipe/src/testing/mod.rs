//! Testing utilities for stagepipe pipelines.
//!
//! This module provides:
//! - Mock stages that record, fail or short-circuit
//! - A [`Trail`] payload with stages that tag it
//! - Assertions on outcomes and failures

mod assertions;
mod fixtures;
mod mocks;

pub use assertions::{assert_completed, assert_failed_at, assert_short_circuited};
pub use fixtures::{SentinelStage, TagStage, Trail};
pub use mocks::{FailingStage, RecordingStage, ShortCircuitStage};
