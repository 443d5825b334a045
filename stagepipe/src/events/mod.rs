//! Event sink system for observability.
//!
//! Pipelines report their lifecycle to an [`EventSink`]. The default sink
//! discards everything; [`LoggingEventSink`] forwards to `tracing` and
//! [`CollectingEventSink`] keeps events in memory for assertions.

mod event;
mod sink;

pub use event::{EventKind, PipelineEvent};
pub use sink::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};

#[cfg(test)]
pub use sink::MockEventSink;
