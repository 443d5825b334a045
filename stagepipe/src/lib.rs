//! # Stagepipe
//!
//! Composable sequential pipelines built from continuation-passing stages.
//!
//! Stagepipe passes a single payload through an ordered chain of stages:
//!
//! - **Continuation-passing stages**: each stage receives the payload and a
//!   [`Next`](pipeline::Next) handle, and decides whether to continue the chain
//! - **Short-circuiting**: a stage that returns without continuing ends the run
//!   successfully, reported through [`Outcome`](pipeline::Outcome)
//! - **Nesting**: a [`Pipeline`](pipeline::Pipeline) is itself a stage
//! - **Transparent failures**: stage errors reach the caller unchanged
//! - **Event-driven observability**: typed run events and tracing spans
//! - **Configuration**: pipelines assembled by name from JSON
//!
//! ## Quick Start
//!
//! ```rust
//! use stagepipe::prelude::*;
//!
//! // Totals in cents.
//! let pricing = Pipeline::<u64>::named("pricing")
//!     .pipe_map("apply_coupons", |total| Ok(total.saturating_sub(500)))
//!     .pipe_map("apply_taxes", |total| Ok(total * 120 / 100));
//!
//! let checkout = Pipeline::<u64>::named("checkout")
//!     .pipe(Halt::when("empty_cart", |total: &u64| *total == 0))
//!     .pipe(pricing)
//!     .pipe_map("add_shipping", |total| Ok(total + 400));
//!
//! assert_eq!(checkout.process(10_500).unwrap(), 12_400);
//! assert!(checkout.run(0).unwrap().is_short_circuited());
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod config;
pub mod errors;
pub mod events;
pub mod observability;
pub mod pipeline;
pub mod stages;
pub mod testing;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{PipelineConfig, PipelineDefinition, StageRegistry};
    pub use crate::errors::{ConfigError, ConstructionError, ContractErrorInfo, StageError};
    pub use crate::events::{
        CollectingEventSink, EventKind, EventSink, LoggingEventSink, NoOpEventSink, PipelineEvent,
    };
    pub use crate::observability::{init_tracing, LogFormat, LoggingConfig};
    pub use crate::pipeline::{Next, Outcome, Pipeline};
    pub use crate::stages::{
        BackoffStrategy, FnStage, Halt, JitterStrategy, MapStage, NoOpStage, RetryConfig,
        RetryStage, Stage,
    };
}
