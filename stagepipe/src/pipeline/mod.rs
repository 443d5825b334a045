//! Pipeline building and execution.
//!
//! This module provides:
//! - [`Pipeline`], the ordered chain of stages
//! - [`Next`], the continuation handed to each stage
//! - [`Outcome`], telling completed runs from short-circuited ones

mod chain;
mod next;
mod outcome;
mod scope;

pub use chain::Pipeline;
pub use next::Next;
pub use outcome::Outcome;
