// reader/writer lock with writer preference, composed from a turnstile and an
// occupancy switch.
//
// the protocol:
//
// - readers cross the turnstile (acquire, immediately release) and then enter
//   the occupancy switch, which takes its gate exclusively only on the 0->1
//   transition and frees it on 1->0.
//
// - a writer acquires the turnstile and HOLDS it, so no new reader can even
//   begin admission; it then acquires the occupancy gate, which drains once
//   the in-flight readers have exited; then it releases the turnstile.
//
// net effect: once a writer has requested the lock, no new reader starts
// until the writer has run, while readers already inside are allowed to
// finish. every blocking step honors its deadline, and a failed acquisition
// leaves nothing held.

use super::gate::{Gate, Timeout};
use std::sync::Mutex;


/// Admission gate every reader must pass through, giving a pending writer a
/// point at which to block new readers
pub struct Turnstile {
    gate: Gate,
}

impl Turnstile {
    pub fn new() -> Self {
        Turnstile { gate: Gate::new() }
    }

    /// Pass through the turnstile: acquire and immediately release
    ///
    /// Returns whether the crossing happened within the timeout. Blocks
    /// exactly when a writer is holding the turnstile.
    pub fn cross(&self, timeout: Timeout) -> bool {
        if !self.gate.acquire(timeout) {
            return false;
        }
        self.gate.release();
        true
    }

    /// Acquire the turnstile and keep holding it (writer side)
    pub fn acquire(&self, timeout: Timeout) -> bool {
        self.gate.acquire(timeout)
    }

    /// Release a held turnstile (writer side)
    pub fn release(&self) {
        self.gate.release();
    }
}

/// Reference-counted gate, held exclusively only while occupied
///
/// The underlying gate is acquired on the 0→1 holder transition and released
/// on 1→0, so any number of holders share it while an outside party (the
/// writer) can claim the gate only when occupancy is zero.
pub struct Occupancy {
    // holder count. held across the 0->1 gate acquire, which matches the
    // admission protocol: during a write, at most one reader can be past the
    // turnstile waiting here, so the counter is never held long by a blocked
    // entrant while another holder needs it to exit.
    count: Mutex<usize>,
    gate: Gate,
}

impl Occupancy {
    pub fn new() -> Self {
        Occupancy {
            count: Mutex::new(0),
            gate: Gate::new(),
        }
    }

    /// Become a holder, acquiring the gate if occupancy was zero
    ///
    /// Returns whether entered. On failure the count is unchanged and the
    /// gate is not held.
    pub fn enter(&self, timeout: Timeout) -> bool {
        let mut count = self.count.lock().unwrap();
        if *count == 0 && !self.gate.acquire(timeout) {
            return false;
        }
        *count += 1;
        true
    }

    /// Stop being a holder, releasing the gate if occupancy drops to zero
    pub fn exit(&self) {
        let mut count = self.count.lock().unwrap();
        debug_assert!(*count > 0, "occupancy exited while empty");
        *count -= 1;
        if *count == 0 {
            self.gate.release();
        }
    }

    /// Claim the underlying gate directly, waiting for occupancy to drain
    /// (writer side)
    pub fn close(&self, timeout: Timeout) -> bool {
        self.gate.acquire(timeout)
    }

    /// Release a gate claimed via [`Occupancy::close`] (writer side)
    pub fn open(&self) {
        self.gate.release();
    }
}

/// Reader/writer lock with writer preference and deadline support
///
/// Many readers hold the lock concurrently; a writer excludes everything and
/// blocks new readers from starting the moment it begins waiting. Both
/// acquisitions take a [`Timeout`], and a failed acquisition is a normal
/// `None` return that leaves no partial hold behind.
///
/// Each protected resource owns its own `RwLock` instance; lock state is
/// never shared between unrelated resources.
pub struct RwLock {
    turnstile: Turnstile,
    occupancy: Occupancy,
}

impl RwLock {
    pub fn new() -> Self {
        RwLock {
            turnstile: Turnstile::new(),
            occupancy: Occupancy::new(),
        }
    }

    /// Acquire shared access within the timeout
    pub fn read(&self, timeout: Timeout) -> Option<ReadGuard<'_>> {
        // the crossing already released the turnstile, so failing to enter
        // the occupancy switch leaves nothing to clean up
        if !self.turnstile.cross(timeout) {
            return None;
        }
        if !self.occupancy.enter(timeout) {
            return None;
        }
        Some(ReadGuard { lock: self })
    }

    /// Acquire exclusive access within the timeout
    pub fn write(&self, timeout: Timeout) -> Option<WriteGuard<'_>> {
        if !self.turnstile.acquire(timeout) {
            return None;
        }
        // holding the turnstile stops new readers from beginning admission
        // while we wait for the in-flight ones to drain out of the switch.
        // the turnstile is released whether or not the gate was claimed, so a
        // timed-out write leaves the lock fully usable.
        let closed = self.occupancy.close(timeout);
        self.turnstile.release();
        if closed { Some(WriteGuard { lock: self }) } else { None }
    }
}

impl Default for RwLock {
    fn default() -> Self {
        RwLock::new()
    }
}

/// Shared hold on an [`RwLock`], released on drop
pub struct ReadGuard<'a> {
    lock: &'a RwLock,
}

impl<'a> Drop for ReadGuard<'a> {
    fn drop(&mut self) {
        self.lock.occupancy.exit();
    }
}

/// Exclusive hold on an [`RwLock`], released on drop
pub struct WriteGuard<'a> {
    lock: &'a RwLock,
}

impl<'a> Drop for WriteGuard<'a> {
    fn drop(&mut self) {
        self.lock.occupancy.open();
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::{
        sync::{
            atomic::{AtomicUsize, Ordering::SeqCst},
            Arc, Barrier,
        },
        thread,
        time::{Duration, Instant},
    };

    #[test]
    fn readers_are_concurrent() {
        let lock = Arc::new(RwLock::new());
        let inside = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let barrier = Arc::new(Barrier::new(4));

        let threads = (0..4)
            .map(|_| {
                let lock = Arc::clone(&lock);
                let inside = Arc::clone(&inside);
                let peak = Arc::clone(&peak);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    let guard = lock.read(Timeout::Never).unwrap();
                    let now = inside.fetch_add(1, SeqCst) + 1;
                    peak.fetch_max(now, SeqCst);
                    // linger so the holds overlap
                    thread::sleep(Duration::from_millis(50));
                    inside.fetch_sub(1, SeqCst);
                    drop(guard);
                })
            })
            .collect::<Vec<_>>();

        for t in threads {
            t.join().unwrap();
        }
        assert_eq!(peak.load(SeqCst), 4);
    }

    #[test]
    fn writer_excludes_readers_and_writers() {
        let lock = RwLock::new();
        let guard = lock.write(Timeout::Never).unwrap();
        assert!(lock.read(Timeout::NonBlocking).is_none());
        assert!(lock.write(Timeout::NonBlocking).is_none());
        drop(guard);
        assert!(lock.read(Timeout::NonBlocking).is_some());
    }

    #[test]
    fn reader_excludes_writer_but_not_readers() {
        let lock = RwLock::new();
        let r1 = lock.read(Timeout::NonBlocking).unwrap();
        let r2 = lock.read(Timeout::NonBlocking).unwrap();
        assert!(lock.write(Timeout::NonBlocking).is_none());
        drop(r1);
        assert!(lock.write(Timeout::NonBlocking).is_none());
        drop(r2);
        assert!(lock.write(Timeout::NonBlocking).is_some());
    }

    #[test]
    fn timed_out_write_leaves_lock_usable() {
        let lock = RwLock::new();
        let reader = lock.read(Timeout::Never).unwrap();

        // the writer gives up while the reader is inside
        let start = Instant::now();
        assert!(lock.write(Timeout::after(Duration::from_millis(30))).is_none());
        assert!(start.elapsed() >= Duration::from_millis(30));

        // no partial hold survived: new readers and, once the reader leaves,
        // writers still get in
        assert!(lock.read(Timeout::NonBlocking).is_some());
        drop(reader);
        assert!(lock.write(Timeout::NonBlocking).is_some());
    }

    #[test]
    fn waiting_writer_blocks_new_readers() {
        let lock = Arc::new(RwLock::new());
        let reader = lock.read(Timeout::Never).unwrap();

        let lock2 = Arc::clone(&lock);
        let writer = thread::spawn(move || {
            let guard = lock2.write(Timeout::Never).unwrap();
            thread::sleep(Duration::from_millis(20));
            drop(guard);
        });

        // give the writer time to park on the turnstile
        thread::sleep(Duration::from_millis(30));

        // new reader admission is now blocked even though a reader is inside
        assert!(lock.read(Timeout::NonBlocking).is_none());

        drop(reader);
        writer.join().unwrap();

        // after the writer has run, readers flow again
        assert!(lock.read(Timeout::NonBlocking).is_some());
    }

    #[test]
    fn writer_waits_for_inflight_reader() {
        let lock = Arc::new(RwLock::new());
        let finished = Arc::new(AtomicUsize::new(0));

        let reader = lock.read(Timeout::Never).unwrap();

        let lock2 = Arc::clone(&lock);
        let finished2 = Arc::clone(&finished);
        let writer = thread::spawn(move || {
            let _guard = lock2.write(Timeout::Never).unwrap();
            finished2.store(1, SeqCst);
        });

        thread::sleep(Duration::from_millis(30));
        assert_eq!(finished.load(SeqCst), 0);
        drop(reader);
        writer.join().unwrap();
        assert_eq!(finished.load(SeqCst), 1);
    }
}
