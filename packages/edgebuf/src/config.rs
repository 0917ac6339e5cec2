// per-line channel configuration.
//
// option names and defaults follow the hardware layer's conventions: edge
// defaults to both, pull to none, buffering to unbounded discard-oldest with
// a non-waiting producer.

use crate::{
    channel::error::ConfigError,
    queue::OverflowPolicy,
    sync::Timeout,
};
use std::{fmt, time::Duration};


/// Identifier of a monitored hardware line
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct LineId(pub u32);

impl fmt::Display for LineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}", self.0)
    }
}

/// Signal edge(s) that produce an event
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum EdgeType {
    Rising,
    Falling,
    Both,
}

/// Internal pull resistor mode for a line
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum PullMode {
    None,
    Up,
    Down,
}

/// The parameters the event source needs when arming a line
///
/// Changing any of these on a started channel requires disarming and
/// re-arming the line, which the channel does transparently.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct TriggerConfig {
    pub edge: EdgeType,
    pub pull: PullMode,
    pub debounce: Duration,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        TriggerConfig {
            edge: EdgeType::Both,
            pull: PullMode::None,
            debounce: Duration::ZERO,
        }
    }
}

/// How long the producer path may wait for the channel lock before counting
/// the event as dropped
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ProducerWait {
    /// Never wait; an unavailable lock drops the event immediately
    NoWait,
    /// Wait up to the given bound
    Wait(Duration),
}

impl ProducerWait {
    pub(crate) fn timeout(self) -> Timeout {
        match self {
            ProducerWait::NoWait => Timeout::NonBlocking,
            ProducerWait::Wait(bound) => Timeout::after(bound),
        }
    }
}

impl Default for ProducerWait {
    fn default() -> Self {
        ProducerWait::NoWait
    }
}

/// Full configuration of one buffered channel
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub struct ChannelConfig {
    pub trigger: TriggerConfig,
    /// Buffer capacity; 0 = unbounded
    pub capacity: usize,
    pub policy: OverflowPolicy,
    pub producer_wait: ProducerWait,
}

impl ChannelConfig {
    /// Reject invalid combinations before any lock is taken
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.producer_wait == ProducerWait::Wait(Duration::ZERO) {
            // a zero bound is an ambiguous spelling of NoWait
            return Err(ConfigError::Conflict(
                "producer wait bound of zero; use NoWait instead",
            ));
        }
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_hardware_layer_conventions() {
        let config = ChannelConfig::default();
        assert_eq!(config.trigger.edge, EdgeType::Both);
        assert_eq!(config.trigger.pull, PullMode::None);
        assert_eq!(config.trigger.debounce, Duration::ZERO);
        assert_eq!(config.capacity, 0);
        assert_eq!(config.policy, OverflowPolicy::DiscardOldest);
        assert_eq!(config.producer_wait, ProducerWait::NoWait);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_wait_bound_is_a_conflict() {
        let config = ChannelConfig {
            producer_wait: ProducerWait::Wait(Duration::ZERO),
            ..ChannelConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Conflict(_))));
    }
}
