//! Go-style channels for OS threads: rendezvous and bounded-buffer
//! flavours plus a multi-way `select`, built entirely on mutexes,
//! condition variables and counting semaphores.
//!
//! # Channel flavours
//!
//! - [`rendezvous()`]: no buffer. A blocking send completes only once a
//!   receiver has taken the value; a non-blocking send succeeds only if a
//!   receiver is already waiting.
//! - [`bounded()`]: a fixed-capacity FIFO. Sends block while full,
//!   receives block while empty. A capacity of zero yields a rendezvous
//!   channel.
//!
//! A [`Channel`] is a single cloneable handle: any clone may send,
//! receive, close or iterate. Closing wakes everything; buffered values
//! remain receivable after close, and closing a rendezvous channel waits
//! for an in-flight hand-off to complete.
//!
//! # Select
//!
//! [`select`] waits on any number of candidate operations (sends with a
//! captured value, or receives) and completes exactly one. Candidates
//! that are ready simultaneously are picked uniformly at random, and
//! channels hand notifications to parked select callers round-robin, so
//! no channel or caller is starved. [`try_select`] and [`select_timeout`]
//! bound the wait.
//!
//! # Example
//!
//! ```
//! use std::thread;
//! use sluice::bounded;
//!
//! let ch = bounded(2);
//! let tx = ch.clone();
//!
//! thread::spawn(move || {
//!     tx.send(1).unwrap();
//!     tx.send(2).unwrap();
//!     tx.close();
//! });
//!
//! let mut sum = 0;
//! ch.for_each(|v| sum += v);
//! assert_eq!(sum, 3);
//! ```
//!
//! # Design
//!
//! Every channel pairs one mutex with two condition variables, one per
//! side, so closing can wake senders and receivers independently and a
//! notification never lands on the wrong side. Select callers park on a
//! counting-semaphore token registered with every candidate channel; the
//! count makes a notification that races with registration impossible to
//! lose. The library spawns no threads of its own.

#![warn(missing_docs)]

mod channel;
mod deadline;
mod error;
mod flavors;
mod select;
mod signal;
mod waiters;

pub use channel::{Channel, Iter};
pub use error::{
    RecvError, RecvTimeoutError, SendError, SendTimeoutError, TryRecvError, TrySendError,
};
pub use select::{select, select_timeout, try_select, Selector};

use channel::{Flavor, Store};
use std::collections::VecDeque;

/// Creates a rendezvous channel: no buffer, sender and receiver meet in
/// time and the value is handed off directly.
///
/// # Example
///
/// ```
/// use std::thread;
/// use sluice::rendezvous;
///
/// let ch = rendezvous();
/// let rx = ch.clone();
///
/// let t = thread::spawn(move || rx.recv().unwrap());
/// ch.send(42).unwrap();
///
/// assert_eq!(t.join().unwrap(), 42);
/// ```
pub fn rendezvous<T>() -> Channel<T> {
    Channel::with_store(Flavor::Rendezvous, Store::Slot(None))
}

/// Creates a buffered channel holding up to `capacity` values.
///
/// A capacity of zero yields a [`rendezvous`] channel, mirroring the
/// convention that an unbuffered channel is the zero-capacity case.
///
/// # Example
///
/// ```
/// use sluice::bounded;
///
/// let ch = bounded(2);
/// ch.send(1).unwrap();
/// ch.send(2).unwrap();
/// assert!(ch.try_send(3).is_err());
/// assert_eq!(ch.recv(), Ok(1));
/// ```
pub fn bounded<T>(capacity: usize) -> Channel<T> {
    if capacity == 0 {
        return rendezvous();
    }
    Channel::with_store(
        Flavor::Buffered,
        Store::Queue {
            items: VecDeque::with_capacity(capacity),
            capacity,
        },
    )
}
