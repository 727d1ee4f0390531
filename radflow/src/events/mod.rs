//! Event sink system for pipeline observers.
//!
//! The runner publishes every stage tick, status transition and terminal
//! outcome as a [`PipelineEvent`](crate::core::PipelineEvent) to one sink.
//! Use [`FanoutEventSink`] to deliver to several observers.

mod sink;

pub use sink::{
    ChannelEventSink, CollectingEventSink, EventSink, FanoutEventSink, LoggingEventSink,
    NoOpEventSink,
};
