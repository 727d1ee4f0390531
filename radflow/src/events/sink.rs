//! Event sink trait and implementations.

use crate::core::PipelineEvent;
use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{debug, info, warn, Level};

/// Trait for observers of pipeline events.
///
/// The runner publishes synchronously through [`EventSink::try_emit`] from
/// the run task, so implementations must not block. Events of one run arrive
/// one at a time and in order; a sink may read the stage states back or
/// reset the runner while handling one.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Emits an event asynchronously.
    async fn emit(&self, event: PipelineEvent) {
        self.try_emit(&event);
    }

    /// Emits an event without blocking.
    ///
    /// This method should never panic. Errors are logged but suppressed.
    fn try_emit(&self, event: &PipelineEvent);
}

/// A no-op event sink that discards all events.
///
/// Used as the default when no sink is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpEventSink;

impl EventSink for NoOpEventSink {
    fn try_emit(&self, _event: &PipelineEvent) {}
}

/// An event sink that logs events using the tracing framework.
///
/// Stage ticks are logged at `DEBUG`; every other event at the configured level.
#[derive(Debug, Clone)]
pub struct LoggingEventSink {
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
    pub fn new(level: Level) -> Self {
        Self { level }
    }

    /// Creates a debug-level logging sink.
    #[must_use]
    pub fn debug() -> Self {
        Self::new(Level::DEBUG)
    }

    fn log_event(&self, event: &PipelineEvent) {
        if let PipelineEvent::StageUpdated { run_id, stage_id, state } = event {
            debug!(
                run_id = %run_id,
                stage_id = %stage_id,
                status = %state.status,
                progress = state.progress,
                "Event: stage.updated"
            );
            return;
        }

        match self.level {
            Level::DEBUG => debug!(
                event_type = event.event_type(),
                run_id = %event.run_id(),
                "Event: {}", event.event_type()
            ),
            _ => info!(
                event_type = event.event_type(),
                run_id = %event.run_id(),
                "Event: {}", event.event_type()
            ),
        }
    }
}

impl EventSink for LoggingEventSink {
    fn try_emit(&self, event: &PipelineEvent) {
        self.log_event(event);
    }
}

/// Forwards events into an unbounded channel: the subscription side of the runner.
#[derive(Debug, Clone)]
pub struct ChannelEventSink {
    tx: mpsc::UnboundedSender<PipelineEvent>,
}

impl ChannelEventSink {
    /// Creates a sink and the receiver observers read from.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<PipelineEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl EventSink for ChannelEventSink {
    fn try_emit(&self, event: &PipelineEvent) {
        if self.tx.send(event.clone()).is_err() {
            debug!(event_type = event.event_type(), "Event receiver dropped");
        }
    }
}

/// Delivers each event to several sinks in registration order.
#[derive(Default)]
pub struct FanoutEventSink {
    sinks: Vec<std::sync::Arc<dyn EventSink>>,
}

impl FanoutEventSink {
    /// Creates an empty fan-out.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a sink.
    #[must_use]
    pub fn with(mut self, sink: std::sync::Arc<dyn EventSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Returns the number of sinks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    /// Returns true if no sinks are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl std::fmt::Debug for FanoutEventSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FanoutEventSink")
            .field("sinks", &self.sinks.len())
            .finish()
    }
}

impl EventSink for FanoutEventSink {
    fn try_emit(&self, event: &PipelineEvent) {
        for sink in &self.sinks {
            if let Err(e) = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                sink.try_emit(event);
            })) {
                warn!("Event sink panicked: {:?}", e);
            }
        }
    }
}

/// A collecting event sink for testing purposes.
#[derive(Debug, Default)]
pub struct CollectingEventSink {
    events: parking_lot::RwLock<Vec<PipelineEvent>>,
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

    /// Returns events matching a type prefix (e.g. "stage.").
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
    fn try_emit(&self, event: &PipelineEvent) {
        self.events.write().push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{StageId, StageRuntimeState};
    use std::sync::Arc;
    use uuid::Uuid;

    fn update(progress: u8) -> PipelineEvent {
        PipelineEvent::stage_updated(
            Uuid::nil(),
            StageRuntimeState::processing(StageId::new(2), progress),
        )
    }

    #[tokio::test]
    async fn test_noop_and_logging_sinks() {
        NoOpEventSink.emit(update(1)).await;
        let sink = LoggingEventSink::default();
        sink.emit(PipelineEvent::started(Uuid::nil(), "unet-chest")).await;
        sink.try_emit(&update(5));
        LoggingEventSink::debug().try_emit(&update(6));
    }

    #[tokio::test]
    async fn test_collecting_sink() {
        let sink = CollectingEventSink::new();
        assert!(sink.is_empty());

        sink.emit(PipelineEvent::started(Uuid::nil(), "unet-chest")).await;
        sink.try_emit(&update(10));

        assert_eq!(sink.len(), 2);
        assert_eq!(sink.events_of_type("stage.").len(), 1);
        assert_eq!(sink.events_of_type("run.").len(), 1);

        sink.clear();
        assert!(sink.is_empty());
    }

    #[tokio::test]
    async fn test_channel_sink_delivers_in_order() {
        let (sink, mut rx) = ChannelEventSink::new();
        for p in [0, 30, 60] {
            sink.try_emit(&update(p));
        }
        drop(sink);

        let mut seen = Vec::new();
        while let Some(event) = rx.recv().await {
            seen.push(event.stage_state().unwrap().progress);
        }
        assert_eq!(seen, vec![0, 30, 60]);
    }

    #[test]
    fn test_channel_sink_tolerates_dropped_receiver() {
        let (sink, rx) = ChannelEventSink::new();
        drop(rx);
        sink.try_emit(&update(1));
    }

    #[test]
    fn test_fanout_reaches_every_sink() {
        struct Panicking;
        impl EventSink for Panicking {
            fn try_emit(&self, _event: &PipelineEvent) {
                panic!("broken sink");
            }
        }

        let a = Arc::new(CollectingEventSink::new());
        let b = Arc::new(CollectingEventSink::new());
        let fanout = FanoutEventSink::new()
            .with(a.clone())
            .with(Arc::new(Panicking))
            .with(b.clone());

        fanout.try_emit(&update(3));
        assert_eq!(fanout.len(), 3);
        assert_eq!(a.len(), 1);
        assert_eq!(b.len(), 1);
    }
}
