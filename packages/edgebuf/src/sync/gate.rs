// deadline-aware binary gate. the base primitive both the turnstile and the
// occupancy switch are built on.
//
// std's Mutex has no timed acquire, so this is a mutex re-expressed as a
// held/free flag plus a condvar, which makes every blocking path accept a
// deadline.

use std::{
    sync::{Condvar, Mutex},
    time::{Duration, Instant},
};


/// Timeout for a blocking lock acquisition
#[derive(Debug, Copy, Clone)]
pub enum Timeout {
    /// Never time out.
    Never,
    /// Time out at the given deadline.
    At(Instant),
    /// Time out if the acquisition cannot be resolved without blocking.
    NonBlocking,
}

impl Timeout {
    /// Timeout at the given duration from now
    pub fn after(duration: Duration) -> Self {
        Timeout::At(Instant::now() + duration)
    }
}

// binary gate with timed acquisition.
//
// release wakes all waiters rather than one: a waiter woken by notify_one may
// have just passed its deadline and walk away without taking the gate, which
// would strand the remaining waiters if the notification were consumed.
pub(crate) struct Gate {
    held: Mutex<bool>,
    freed: Condvar,
}

impl Gate {
    pub(crate) fn new() -> Self {
        Gate {
            held: Mutex::new(false),
            freed: Condvar::new(),
        }
    }

    // acquire the gate, blocking per timeout. returns whether acquired.
    pub(crate) fn acquire(&self, timeout: Timeout) -> bool {
        let mut held = self.held.lock().unwrap();
        while *held {
            match timeout {
                // block on the condvar indefinitely
                Timeout::Never => held = self.freed.wait(held).unwrap(),

                // block on the condvar until the deadline, at which point return false
                Timeout::At(deadline) => {
                    let Some(remaining) = deadline.checked_duration_since(Instant::now())
                        else { return false };
                    let (guard, wait_result) =
                        self.freed.wait_timeout(held, remaining).unwrap();
                    held = guard;
                    if wait_result.timed_out() && *held {
                        return false;
                    }
                }

                // dont block on the condvar, return false instead
                Timeout::NonBlocking => return false,
            }
        }
        *held = true;
        true
    }

    // release the gate. caller must have acquired it.
    pub(crate) fn release(&self) {
        let mut held = self.held.lock().unwrap();
        debug_assert!(*held, "gate released while not held");
        *held = false;
        self.freed.notify_all();
    }
}
