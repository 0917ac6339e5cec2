// registry of buffered channels, keyed by hardware line.
//
// builds channels from per-line configuration, owns the shared event source,
// and routes centrally-delivered notifications to the right channel.

use crate::{
    channel::{
        error::{ConfigError, LifecycleError},
        BufferedChannel, Event,
    },
    config::{ChannelConfig, LineId},
    source::EventSource,
};
use dashmap::{mapref::entry::Entry, DashMap};
use std::sync::Arc;


/// A set of buffered channels over one event source
///
/// The monitor is the composition root: it creates channels from
/// [`ChannelConfig`]s, starts and stops them together, and exposes the
/// [`LineMonitor::notify`] hook for sources that deliver centrally rather
/// than per armed line.
pub struct LineMonitor<T> {
    source: Arc<dyn EventSource<T>>,
    channels: DashMap<LineId, Arc<BufferedChannel<T>>>,
}

impl<T: Send + 'static> LineMonitor<T> {
    pub fn new(source: Arc<dyn EventSource<T>>) -> Self {
        LineMonitor {
            source,
            channels: DashMap::new(),
        }
    }

    /// Create a channel for `line` with the given configuration
    ///
    /// The channel starts stopped; arm it with [`BufferedChannel::start`] or
    /// [`LineMonitor::start_all`].
    pub fn add_line(
        &self,
        line: LineId,
        config: ChannelConfig,
    ) -> Result<Arc<BufferedChannel<T>>, ConfigError> {
        match self.channels.entry(line) {
            Entry::Occupied(_) => Err(ConfigError::DuplicateLine(line)),
            Entry::Vacant(slot) => {
                let channel =
                    Arc::new(BufferedChannel::new(line, config, Arc::clone(&self.source))?);
                slot.insert(Arc::clone(&channel));
                Ok(channel)
            }
        }
    }

    /// The channel monitoring `line`, if any
    pub fn channel(&self, line: LineId) -> Option<Arc<BufferedChannel<T>>> {
        self.channels.get(&line).map(|entry| Arc::clone(entry.value()))
    }

    /// Stop (if started) and forget the channel for `line`
    ///
    /// Returns whether a channel was removed.
    pub fn remove_line(&self, line: LineId) -> Result<bool, LifecycleError> {
        let Some((_, channel)) = self.channels.remove(&line) else {
            return Ok(false);
        };
        if channel.is_started() {
            channel.stop()?;
        }
        Ok(true)
    }

    /// Start every stopped channel; already-started ones are left alone
    pub fn start_all(&self) -> Result<(), LifecycleError> {
        for entry in self.channels.iter() {
            let channel = entry.value();
            if !channel.is_started() {
                channel.start()?;
            }
        }
        Ok(())
    }

    /// Stop every started channel; already-stopped ones are left alone
    pub fn stop_all(&self) -> Result<(), LifecycleError> {
        for entry in self.channels.iter() {
            let channel = entry.value();
            if channel.is_started() {
                channel.stop()?;
            }
        }
        Ok(())
    }

    /// Deliver one event for `line`, stamped on arrival
    ///
    /// The central delivery hook: invoked by event sources that route all
    /// lines through one callback. Never blocks beyond the channel's
    /// configured producer wait, and never fails; events for unmonitored
    /// lines are ignored.
    pub fn notify(&self, line: LineId, payload: T) {
        match self.channels.get(&line) {
            Some(entry) => entry.value().deliver(Event::now(payload)),
            None => trace!(%line, "event for unmonitored line, ignoring"),
        }
    }
}
