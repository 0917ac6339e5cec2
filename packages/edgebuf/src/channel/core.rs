// the buffered channel: one event queue guarded by one reader/writer lock.
//
// producers and the consumer are both "readers" of the lock: many of them
// proceed concurrently, each holding it only across a single queue push or
// pop. reconfiguration is the lone "writer": it excludes everyone, swaps the
// queue wholesale, and drains the survivors into the replacement, so no
// caller ever observes a half-swapped buffer.
//
// the queue cell itself is a short Mutex held for one push/pop/swap. it is
// only ever taken inside a read or write hold of the channel lock, never the
// other way around, so the channel lock remains the single ordering
// authority between delivery/consumption and reconfiguration.

use super::error::{ConfigError, LifecycleError, TakeError};
use crate::{
    config::{ChannelConfig, LineId, ProducerWait, TriggerConfig},
    queue::{EventQueue, OverflowPolicy},
    source::{EventSource, NotifyHook},
    sync::{RwLock, Timeout},
};
use std::{
    mem,
    sync::{
        atomic::{AtomicU64, Ordering::Relaxed},
        Arc, Mutex,
    },
    time::Instant,
};


/// One buffered occurrence: an opaque payload plus its arrival timestamp
///
/// Timestamps come from one monotonic clock per process, so events within a
/// channel are ordered by arrival. Immutable once created.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Event<T> {
    pub at: Instant,
    pub payload: T,
}

impl<T> Event<T> {
    /// Stamp a payload with the current time
    pub fn now(payload: T) -> Self {
        Event { at: Instant::now(), payload }
    }
}

// lifecycle state: stopped <-> started, plus the trigger the source is (or
// will next be) armed with.
struct Lifecycle {
    started: bool,
    trigger: TriggerConfig,
}

/// A bounded, overflow-policy-controlled event buffer for one hardware line
///
/// Delivery happens on threads the channel does not control and never blocks
/// beyond the configured producer wait; consumption and reconfiguration are
/// caller-driven. Capacity and policy can be changed while producers are
/// actively delivering, without losing in-capacity events or exposing a torn
/// queue.
pub struct BufferedChannel<T> {
    line: LineId,
    source: Arc<dyn EventSource<T>>,
    // each channel owns its own lock instance; lock state is never shared
    // between channels
    lock: RwLock,
    queue: Mutex<EventQueue<Event<T>>>,
    // events lost to producer-side lock timeouts
    dropped: AtomicU64,
    producer_wait: ProducerWait,
    lifecycle: Mutex<Lifecycle>,
}

impl<T> BufferedChannel<T> {
    /// Construct a stopped channel for `line` from a validated configuration
    pub fn new(
        line: LineId,
        config: ChannelConfig,
        source: Arc<dyn EventSource<T>>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(BufferedChannel {
            line,
            source,
            lock: RwLock::new(),
            queue: Mutex::new(EventQueue::new(config.capacity, config.policy)),
            dropped: AtomicU64::new(0),
            producer_wait: config.producer_wait,
            lifecycle: Mutex::new(Lifecycle { started: false, trigger: config.trigger }),
        })
    }

    pub fn line(&self) -> LineId {
        self.line
    }

    /// Events currently buffered
    pub fn len(&self) -> usize {
        self.queue.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.lock().unwrap().is_empty()
    }

    /// Current buffer capacity (0 = unbounded)
    pub fn capacity(&self) -> usize {
        self.queue.lock().unwrap().capacity()
    }

    /// Current overflow policy
    pub fn policy(&self) -> OverflowPolicy {
        self.queue.lock().unwrap().policy()
    }

    /// Events lost because the producer path could not acquire the lock
    /// within its configured wait
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Relaxed)
    }

    /// The trigger the event source is (or will next be) armed with
    pub fn trigger(&self) -> TriggerConfig {
        self.lifecycle.lock().unwrap().trigger
    }

    pub fn is_started(&self) -> bool {
        self.lifecycle.lock().unwrap().started
    }

    /// Buffer an event (producer path)
    ///
    /// Called from the event source's delivery thread. Never propagates a
    /// failure: if the channel lock is unavailable within the configured
    /// producer wait, the event is counted as dropped and the call returns.
    pub fn deliver(&self, event: Event<T>) {
        let Some(_read) = self.lock.read(self.producer_wait.timeout()) else {
            self.dropped.fetch_add(1, Relaxed);
            trace!(line = %self.line, "event dropped: channel lock unavailable");
            return;
        };
        self.queue.lock().unwrap().push(event);
    }

    /// Take the oldest buffered event (consumer path)
    ///
    /// The timeout bounds only the wait for the channel lock; an empty
    /// buffer returns [`TakeError::Empty`] immediately.
    pub fn take(&self, timeout: Timeout) -> Result<Event<T>, TakeError> {
        let Some(_read) = self.lock.read(timeout) else {
            return Err(TakeError::LockTimeout);
        };
        self.queue.lock().unwrap().pop().ok_or(TakeError::Empty)
    }

    /// Replace the buffer with one of the given capacity and/or policy
    ///
    /// Linearizable with respect to delivery and consumption: the swap and
    /// the drain of surviving events both happen inside one exclusive hold,
    /// with the new policy governing any overflow during the drain. Passing
    /// `None` for both fields is a no-op.
    pub fn reconfigure(
        &self,
        capacity: Option<usize>,
        policy: Option<OverflowPolicy>,
    ) -> Result<(), ConfigError> {
        if capacity.is_none() && policy.is_none() {
            return Ok(());
        }

        // exclusive hold: new deliver/take calls are blocked from starting
        // and in-flight ones drain first. bounded by their single-push/pop
        // critical sections, so Never cannot wait long.
        let _write = self
            .lock
            .write(Timeout::Never)
            .expect("unbounded write acquire cannot time out");

        let mut queue = self.queue.lock().unwrap();
        let capacity = capacity.unwrap_or_else(|| queue.capacity());
        let policy = policy.unwrap_or_else(|| queue.policy());
        let old = mem::replace(&mut *queue, EventQueue::new(capacity, policy));
        // survivors move over in arrival order; shrinking deterministically
        // keeps the newest or oldest per the new policy
        for event in old {
            queue.push(event);
        }
        debug!(line = %self.line, capacity, ?policy, len = queue.len(), "buffer swapped");
        Ok(())
    }
}

impl<T: Send + 'static> BufferedChannel<T> {
    // delivery hook handed to the event source: stamp and deliver. holds a
    // weak reference so an armed source cannot keep a closed channel alive.
    fn hook(self: &Arc<Self>) -> NotifyHook<T> {
        let weak = Arc::downgrade(self);
        Arc::new(move |payload| {
            if let Some(channel) = weak.upgrade() {
                channel.deliver(Event::now(payload));
            }
        })
    }

    /// Arm the event source for this line and transition to started
    pub fn start(self: &Arc<Self>) -> Result<(), LifecycleError> {
        let mut lifecycle = self.lifecycle.lock().unwrap();
        if lifecycle.started {
            return Err(LifecycleError::AlreadyStarted);
        }
        self.source.arm(self.line, &lifecycle.trigger, self.hook())?;
        lifecycle.started = true;
        debug!(line = %self.line, "channel started");
        Ok(())
    }

    /// Disarm the event source and transition to stopped
    pub fn stop(&self) -> Result<(), LifecycleError> {
        let mut lifecycle = self.lifecycle.lock().unwrap();
        if !lifecycle.started {
            return Err(LifecycleError::AlreadyStopped);
        }
        self.source.disarm(self.line)?;
        lifecycle.started = false;
        debug!(line = %self.line, "channel stopped");
        Ok(())
    }

    /// Change the trigger parameters (edge, pull, debounce)
    ///
    /// If the channel is started, the line is disarmed and re-armed so the
    /// source picks up the new trigger; if stopped, the value is recorded
    /// for the next [`BufferedChannel::start`]. Setting the current value
    /// is a no-op.
    pub fn set_trigger(self: &Arc<Self>, trigger: TriggerConfig) -> Result<(), LifecycleError> {
        let mut lifecycle = self.lifecycle.lock().unwrap();
        if lifecycle.trigger == trigger {
            return Ok(());
        }
        lifecycle.trigger = trigger;
        if !lifecycle.started {
            return Ok(());
        }

        // restart. if re-arming fails the channel is left cleanly stopped
        // rather than half-armed.
        self.source.disarm(self.line)?;
        lifecycle.started = false;
        self.source.arm(self.line, &trigger, self.hook())?;
        lifecycle.started = true;
        debug!(line = %self.line, "channel restarted with new trigger");
        Ok(())
    }
}
