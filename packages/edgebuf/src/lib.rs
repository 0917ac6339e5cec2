//! Buffered channels for asynchronously-arriving hardware events.
//!
//! An external interrupt layer (the [`EventSource`]) delivers discrete
//! events — e.g. GPIO edge timestamps — on threads this crate does not
//! control and which cannot tolerate blocking. Each monitored line gets a
//! [`BufferedChannel`]: a bounded FIFO with a configurable overflow policy
//! whose capacity and policy can be changed *while producers are actively
//! delivering*, without losing in-capacity events or exposing a torn queue
//! to the consumer.
//!
//! The heart of the crate is the writer-preference reader/writer lock in
//! [`sync`], built from a fairness turnstile plus an occupancy switch:
//! delivery and consumption share it as readers, and reconfiguration takes
//! it exclusively to swap the buffer wholesale.

#[macro_use]
extern crate tracing;

mod channel;
mod config;
mod monitor;
mod queue;
mod source;

pub mod sync;

pub use crate::{
    channel::{BufferedChannel, Event},
    config::{ChannelConfig, EdgeType, LineId, ProducerWait, PullMode, TriggerConfig},
    monitor::LineMonitor,
    queue::{EventQueue, OverflowPolicy},
    source::{EventSource, ManualSource, NotifyHook, SourceError},
};

/// Error types
pub mod error {
    pub use crate::channel::error::{ConfigError, LifecycleError, TakeError};
    pub use crate::source::SourceError;
}
