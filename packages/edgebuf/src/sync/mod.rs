// synchronization primitives for the channel core.
//
// the organization of these modules is as such:
//
//      gate: a binary gate with deadline-aware acquisition, built from a
//            Mutex + Condvar pair because std's Mutex has no timed lock.
//            also home of the Timeout type used by every blocking operation
//            in this crate.
//
//      rwlock: the turnstile / occupancy-switch composition that gives the
//              buffered channel its writer-preference reader/writer lock.

mod gate;
mod rwlock;

pub use self::{
    gate::Timeout,
    rwlock::{Occupancy, ReadGuard, RwLock, Turnstile, WriteGuard},
};
