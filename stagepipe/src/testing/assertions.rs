//! Test assertions for pipeline results.

use crate::errors::StageError;
use crate::pipeline::Outcome;
use std::fmt::Debug;

/// Asserts that the run reached the end of the chain.
pub fn assert_completed<P: Debug>(outcome: &Outcome<P>) {
    assert!(
        outcome.is_completed(),
        "Expected completed run, got {outcome:?}"
    );
}

/// Asserts that a stage stopped the chain early.
pub fn assert_short_circuited<P: Debug>(outcome: &Outcome<P>) {
    assert!(
        outcome.is_short_circuited(),
        "Expected short-circuited run, got {outcome:?}"
    );
}

/// Asserts that the result is a failure raised by `stage`.
pub fn assert_failed_at<P: Debug>(result: &Result<P, StageError>, stage: &str) {
    match result {
        Err(err) => assert_eq!(
            err.stage(),
            Some(stage),
            "Expected failure from stage '{stage}', got: {err}"
        ),
        Ok(value) => panic!("Expected failure from stage '{stage}', got Ok({value:?})"),
    }
}
