// channel error types.
//
// Empty and LockTimeout occur on every idle poll and every contended
// delivery; they are ordinary result variants, not exceptional conditions.

use crate::{config::LineId, source::SourceError};
use thiserror::Error;


/// Result of a `take` that did not yield an event
#[derive(Error, Debug, Copy, Clone, Eq, PartialEq)]
pub enum TakeError {
    /// No event was buffered at consumption time; expected, non-fatal
    #[error("no event buffered")]
    Empty,
    /// The channel lock could not be acquired within the deadline
    #[error("timed out acquiring the channel lock")]
    LockTimeout,
}

/// Caller-usage error on the lifecycle API
#[derive(Error, Debug)]
pub enum LifecycleError {
    /// `start` was called on a channel that is already started
    #[error("channel already started")]
    AlreadyStarted,
    /// `stop` was called on a channel that is already stopped
    #[error("channel already stopped")]
    AlreadyStopped,
    /// The event source failed to arm or disarm the line
    #[error(transparent)]
    Source(#[from] SourceError),
}

/// Invalid configuration, rejected before any lock is taken
#[derive(Error, Debug, Copy, Clone, Eq, PartialEq)]
pub enum ConfigError {
    /// Conflicting combination of configuration values
    #[error("conflicting channel configuration: {0}")]
    Conflict(&'static str),
    /// The line is already monitored by another channel
    #[error("{0} already monitored")]
    DuplicateLine(LineId),
}
