// implementation of the buffered channel.
//
// the basic architecture is as such:
//
// BufferedChannel wraps one EventQueue behind one custom reader/writer lock
//                                              |
//          /-----------------------------------/
//          v
//       sync::RwLock (turnstile + occupancy switch, writer preference)
//          |
//          |------ "read" side: producers delivering events and the consumer
//          |       taking them. many proceed concurrently, each holding the
//          |       lock across a single queue push or pop.
//          |
//          \------ "write" side: reconfiguration. excludes everyone, swaps
//                  the queue wholesale, drains survivors under the same
//                  exclusive hold.
//
// the channel also carries the stopped/started lifecycle, which arms and
// disarms the external event source. error types live in the error module
// and are re-exported at the crate root.

pub(crate) mod error;

mod core;

pub use self::core::{BufferedChannel, Event};
