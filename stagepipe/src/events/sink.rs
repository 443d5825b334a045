//! Event sink trait and implementations.

use super::PipelineEvent;
use parking_lot::RwLock;
use tracing::{debug, info, Level};

/// Trait for event sinks that receive pipeline events.
///
/// Sinks are called synchronously on the thread running the pipeline and
/// must not fail; errors inside a sink are the sink's own business.
#[cfg_attr(test, mockall::automock)]
pub trait EventSink: Send + Sync {
    /// Receives an event.
    fn emit(&self, event: &PipelineEvent);

    /// Returns false when events would be discarded, letting the engine skip
    /// building them.
    fn is_enabled(&self) -> bool {
        true
    }
}

/// A no-op event sink that discards all events.
///
/// Used as the default when no sink is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpEventSink;

impl EventSink for NoOpEventSink {
    fn emit(&self, _event: &PipelineEvent) {}

    fn is_enabled(&self) -> bool {
        false
    }
}

/// An event sink that logs events using the tracing framework.
#[derive(Debug, Clone)]
pub struct LoggingEventSink {
    /// The log level to use.
    level: Level,
}

impl Default for LoggingEventSink {
    fn default() -> Self {
        Self { level: Level::INFO }
    }
}

impl LoggingEventSink {
    /// Creates a new logging event sink with the specified level.
    #[must_use]
    pub const fn new(level: Level) -> Self {
        Self { level }
    }

    /// Creates a debug-level logging sink.
    #[must_use]
    pub const fn debug() -> Self {
        Self::new(Level::DEBUG)
    }

    /// Creates an info-level logging sink.
    #[must_use]
    pub const fn info() -> Self {
        Self::new(Level::INFO)
    }
}

impl EventSink for LoggingEventSink {
    fn emit(&self, event: &PipelineEvent) {
        if self.level == Level::DEBUG {
            debug!(
                event_type = %event.kind,
                pipeline = %event.pipeline,
                run_id = %event.run_id,
                stage = ?event.stage,
                duration_ms = ?event.duration_ms,
                "Event: {}", event.kind
            );
        } else {
            info!(
                event_type = %event.kind,
                pipeline = %event.pipeline,
                run_id = %event.run_id,
                stage = ?event.stage,
                duration_ms = ?event.duration_ms,
                "Event: {}", event.kind
            );
        }
    }
}

/// A collecting event sink for testing purposes.
#[derive(Debug, Default)]
pub struct CollectingEventSink {
    events: RwLock<Vec<PipelineEvent>>,
}

impl CollectingEventSink {
    /// Creates a new collecting sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all collected events.
    #[must_use]
    pub fn events(&self) -> Vec<PipelineEvent> {
        self.events.read().clone()
    }

    /// Returns the dotted type names of all collected events, in order.
    #[must_use]
    pub fn event_types(&self) -> Vec<&'static str> {
        self.events.read().iter().map(PipelineEvent::event_type).collect()
    }

    /// Returns the number of collected events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    /// Returns true if no events have been collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }

    /// Clears all collected events.
    pub fn clear(&self) {
        self.events.write().clear();
    }

    /// Returns events matching a type prefix.
    #[must_use]
    pub fn events_of_type(&self, type_prefix: &str) -> Vec<PipelineEvent> {
        self.events
            .read()
            .iter()
            .filter(|e| e.event_type().starts_with(type_prefix))
            .cloned()
            .collect()
    }
}

impl EventSink for CollectingEventSink {
    fn emit(&self, event: &PipelineEvent) {
        self.events.write().push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;
    use uuid::Uuid;

    fn event(kind: EventKind) -> PipelineEvent {
        PipelineEvent::new(kind, "test", Uuid::new_v4())
    }

    #[test]
    fn test_noop_sink() {
        let sink = NoOpEventSink;
        assert!(!sink.is_enabled());
        sink.emit(&event(EventKind::PipelineStarted));
    }

    #[test]
    fn test_logging_sink() {
        let sink = LoggingEventSink::debug();
        assert!(sink.is_enabled());
        sink.emit(&event(EventKind::StageStarted));
        LoggingEventSink::default().emit(&event(EventKind::StageCompleted));
    }

    #[test]
    fn test_collecting_sink() {
        let sink = CollectingEventSink::new();
        assert!(sink.is_empty());

        sink.emit(&event(EventKind::PipelineStarted));
        sink.emit(&event(EventKind::StageStarted));

        assert_eq!(sink.len(), 2);
        assert_eq!(sink.event_types(), vec!["pipeline.started", "stage.started"]);
    }

    #[test]
    fn test_collecting_sink_filter() {
        let sink = CollectingEventSink::new();
        sink.emit(&event(EventKind::StageStarted));
        sink.emit(&event(EventKind::StageCompleted));
        sink.emit(&event(EventKind::PipelineCompleted));

        assert_eq!(sink.events_of_type("stage.").len(), 2);
        assert_eq!(sink.events_of_type("pipeline.").len(), 1);
    }

    #[test]
    fn test_collecting_sink_clear() {
        let sink = CollectingEventSink::new();
        sink.emit(&event(EventKind::StageFailed));
        assert_eq!(sink.len(), 1);

        sink.clear();
        assert!(sink.is_empty());
    }
}
