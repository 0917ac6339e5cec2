// the seam to the external hardware layer.
//
// the core never configures pins or registers interrupts itself; it hands an
// EventSource a line, a trigger configuration, and a notify hook, and the
// source invokes the hook on whatever thread the hardware delivers on. the
// hook must return without blocking, which the channel's delivery path
// guarantees.

use crate::config::{LineId, TriggerConfig};
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering::Relaxed},
        Arc, Mutex,
    },
};
use thiserror::Error;


/// Delivery hook handed to an [`EventSource`] when a line is armed
///
/// Invoked once per hardware event with the source's payload for it. Must be
/// callable from an arbitrary thread and returns without blocking.
pub type NotifyHook<T> = Arc<dyn Fn(T) + Send + Sync>;

/// Error reported by an event source while arming or disarming a line
#[derive(Error, Debug, Clone, Eq, PartialEq)]
#[error("event source: {message}")]
pub struct SourceError {
    message: String,
}

impl SourceError {
    pub fn new(message: impl Into<String>) -> Self {
        SourceError { message: message.into() }
    }
}

/// External interrupt layer that can arm and disarm hardware lines
pub trait EventSource<T>: Send + Sync {
    /// Configure the line per `trigger` and begin invoking `hook` on events
    fn arm(
        &self,
        line: LineId,
        trigger: &TriggerConfig,
        hook: NotifyHook<T>,
    ) -> Result<(), SourceError>;

    /// Stop invoking the line's hook and release the line
    fn disarm(&self, line: LineId) -> Result<(), SourceError>;
}

/// An [`EventSource`] fired by hand
///
/// The in-tree reference implementation of the source seam: it records which
/// lines are armed with which trigger and lets the owner fire events
/// explicitly. Used by the test suite and useful for simulations.
pub struct ManualSource<T> {
    lines: Mutex<HashMap<LineId, Armed<T>>>,
    arms: AtomicU64,
    disarms: AtomicU64,
}

struct Armed<T> {
    trigger: TriggerConfig,
    hook: NotifyHook<T>,
}

impl<T> ManualSource<T> {
    pub fn new() -> Self {
        ManualSource {
            lines: Mutex::new(HashMap::new()),
            arms: AtomicU64::new(0),
            disarms: AtomicU64::new(0),
        }
    }

    /// Fire one event on the line; returns whether the line was armed
    pub fn fire(&self, line: LineId, payload: T) -> bool {
        // clone the hook out so it runs without the map lock held; hooks call
        // back into channel code
        let hook = {
            let lines = self.lines.lock().unwrap();
            match lines.get(&line) {
                Some(armed) => Arc::clone(&armed.hook),
                None => return false,
            }
        };
        hook(payload);
        true
    }

    /// The trigger the line is currently armed with, if any
    pub fn trigger_of(&self, line: LineId) -> Option<TriggerConfig> {
        self.lines.lock().unwrap().get(&line).map(|armed| armed.trigger)
    }

    pub fn is_armed(&self, line: LineId) -> bool {
        self.lines.lock().unwrap().contains_key(&line)
    }

    /// Total arm calls observed
    pub fn arm_count(&self) -> u64 {
        self.arms.load(Relaxed)
    }

    /// Total disarm calls observed
    pub fn disarm_count(&self) -> u64 {
        self.disarms.load(Relaxed)
    }
}

impl<T> Default for ManualSource<T> {
    fn default() -> Self {
        ManualSource::new()
    }
}

impl<T> EventSource<T> for ManualSource<T> {
    fn arm(
        &self,
        line: LineId,
        trigger: &TriggerConfig,
        hook: NotifyHook<T>,
    ) -> Result<(), SourceError> {
        let mut lines = self.lines.lock().unwrap();
        if lines.contains_key(&line) {
            return Err(SourceError::new(format!("{line} already armed")));
        }
        lines.insert(line, Armed { trigger: *trigger, hook });
        self.arms.fetch_add(1, Relaxed);
        Ok(())
    }

    fn disarm(&self, line: LineId) -> Result<(), SourceError> {
        let mut lines = self.lines.lock().unwrap();
        if lines.remove(&line).is_none() {
            return Err(SourceError::new(format!("{line} not armed")));
        }
        self.disarms.fetch_add(1, Relaxed);
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fire_reaches_armed_hook_only() {
        let source = ManualSource::<u32>::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen2 = Arc::clone(&seen);
        let hook: NotifyHook<u32> = Arc::new(move |payload| {
            seen2.lock().unwrap().push(payload);
        });

        let line = LineId(4);
        assert!(!source.fire(line, 1));
        source.arm(line, &TriggerConfig::default(), hook).unwrap();
        assert!(source.fire(line, 2));
        source.disarm(line).unwrap();
        assert!(!source.fire(line, 3));

        assert_eq!(*seen.lock().unwrap(), vec![2]);
        assert_eq!(source.arm_count(), 1);
        assert_eq!(source.disarm_count(), 1);
    }

    #[test]
    fn double_arm_is_an_error() {
        let source = ManualSource::<()>::new();
        let hook: NotifyHook<()> = Arc::new(|_| {});
        let line = LineId(7);
        source.arm(line, &TriggerConfig::default(), Arc::clone(&hook)).unwrap();
        assert!(source.arm(line, &TriggerConfig::default(), hook).is_err());
        source.disarm(line).unwrap();
        assert!(source.disarm(line).is_err());
    }
}
