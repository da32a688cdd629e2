use std::sync::Arc;
use std::time::Duration;

use rand::seq::SliceRandom;

use crate::channel::{Availability, Channel};
use crate::deadline::Deadline;
use crate::signal::Signal;

/// One candidate operation for a select: either a send of a captured value
/// or a receive, bound to a channel and an after-action.
///
/// Built with [`Channel::sender`] or [`Channel::receiver`] and consumed by
/// [`select`], [`try_select`] or [`select_timeout`]. The after-action of
/// the one candidate that completes is run before select returns.
///
/// Candidates over channels of different element types mix freely in a
/// single select.
pub struct Selector<'a> {
    case: Box<dyn SelectCase + 'a>,
}

/// What the engine needs from a candidate; hides whether it sends or
/// receives, and on which side of its channel its token belongs.
trait SelectCase {
    /// Parks the token on the channel. False means the channel is already
    /// satisfiable or closed and the caller should attempt instead.
    fn register(&self, token: &Arc<Signal>) -> bool;
    /// Removes the token; idempotent, no-op when it was never parked.
    fn unregister(&self, token: &Arc<Signal>);
    fn status(&self) -> Availability;
    /// Non-blocking attempt. A failed send attempt keeps its value for
    /// the next try.
    fn attempt(&mut self) -> bool;
    /// Runs the after-action; called at most once, after `attempt`
    /// succeeded, with no channel lock held.
    fn finish(&mut self);
}

struct SendCase<'a, T> {
    channel: Channel<T>,
    value: Option<T>,
    action: Option<Box<dyn FnOnce() + 'a>>,
}

impl<T> SelectCase for SendCase<'_, T> {
    fn register(&self, token: &Arc<Signal>) -> bool {
        self.channel.register_writer_waiter(token)
    }

    fn unregister(&self, token: &Arc<Signal>) {
        self.channel.unregister_writer_waiter(token);
    }

    fn status(&self) -> Availability {
        self.channel.capacity_status()
    }

    fn attempt(&mut self) -> bool {
        match self.value.take() {
            Some(value) => match self.channel.try_send(value) {
                Ok(()) => true,
                Err(err) => {
                    self.value = Some(err.into_inner());
                    false
                }
            },
            None => false,
        }
    }

    fn finish(&mut self) {
        if let Some(action) = self.action.take() {
            action();
        }
    }
}

struct RecvCase<'a, T> {
    channel: Channel<T>,
    received: Option<T>,
    action: Option<Box<dyn FnOnce(T) + 'a>>,
}

impl<T> SelectCase for RecvCase<'_, T> {
    fn register(&self, token: &Arc<Signal>) -> bool {
        self.channel.register_reader_waiter(token)
    }

    fn unregister(&self, token: &Arc<Signal>) {
        self.channel.unregister_reader_waiter(token);
    }

    fn status(&self) -> Availability {
        self.channel.messages_status()
    }

    fn attempt(&mut self) -> bool {
        match self.channel.try_recv() {
            Ok(value) => {
                self.received = Some(value);
                true
            }
            Err(_) => false,
        }
    }

    fn finish(&mut self) {
        if let (Some(value), Some(action)) = (self.received.take(), self.action.take()) {
            action(value);
        }
    }
}

impl<T> Channel<T> {
    /// A select candidate that sends `value` into this channel and runs
    /// `action` if the send is the operation that completes.
    pub fn sender<'a, F>(&self, value: T, action: F) -> Selector<'a>
    where
        F: FnOnce() + 'a,
        T: 'a,
    {
        Selector {
            case: Box::new(SendCase {
                channel: self.clone(),
                value: Some(value),
                action: Some(Box::new(action)),
            }),
        }
    }

    /// A select candidate that receives from this channel and passes the
    /// value to `action` if the receive is the operation that completes.
    pub fn receiver<'a, F>(&self, action: F) -> Selector<'a>
    where
        F: FnOnce(T) + 'a,
        T: 'a,
    {
        Selector {
            case: Box::new(RecvCase {
                channel: self.clone(),
                received: None,
                action: Some(Box::new(action)),
            }),
        }
    }
}

/// Waits on several candidate operations and completes exactly one.
///
/// Returns true when a candidate completed and its after-action ran;
/// false when one of the channels was observed closed without yielding an
/// operation. Callers commonly loop until false to drain a set of
/// channels. Candidates that are simultaneously ready are chosen
/// uniformly at random.
///
/// # Example
///
/// ```
/// use std::cell::Cell;
/// use sluice::{bounded, select};
///
/// let a = bounded(1);
/// let b = bounded::<i32>(1);
/// a.send(10).unwrap();
///
/// let got = Cell::new(0);
/// let fired = select(vec![
///     a.receiver(|v| got.set(v)),
///     b.receiver(|v| got.set(v)),
/// ]);
///
/// assert!(fired);
/// assert_eq!(got.get(), 10);
/// ```
pub fn select(selectors: Vec<Selector<'_>>) -> bool {
    run_select(Deadline::unlimited(), selectors)
}

/// Non-blocking [`select`]: completes an operation only if one is ready
/// right now, otherwise returns false immediately.
pub fn try_select(selectors: Vec<Selector<'_>>) -> bool {
    run_select(Deadline::after(Duration::ZERO), selectors)
}

/// [`select`] bounded by a timeout covering the whole call.
pub fn select_timeout(timeout: Duration, selectors: Vec<Selector<'_>>) -> bool {
    run_select(Deadline::after(timeout), selectors)
}

fn run_select(deadline: Deadline, mut selectors: Vec<Selector<'_>>) -> bool {
    if selectors.is_empty() {
        return false;
    }

    let token = Arc::new(Signal::new());

    // The shuffle is the sole source of fairness between candidates that
    // are ready at the same time.
    selectors.shuffle(&mut rand::thread_rng());

    // Registration pass with a fast path: a candidate that refuses
    // registration is satisfiable or closed, so attempt it on the spot.
    // The wait loop below relies on every remaining candidate holding the
    // token, so a candidate may only be left behind registered or closed.
    for visited in 0..selectors.len() {
        loop {
            if selectors[visited].case.register(&token) {
                break;
            }
            if selectors[visited].case.attempt() {
                selectors[visited].case.finish();
                for selector in &selectors[..=visited] {
                    selector.case.unregister(&token);
                }
                return true;
            }
            if selectors[visited].case.status() == Availability::Closed {
                // The wait loop reports the closure after cleanup.
                break;
            }
            // Registration was refused but the attempt lost the race: the
            // channel changed hands between the two. Start over.
        }
    }

    loop {
        // Re-scan every candidate; a notification only says that some
        // channel changed, not which one.
        for i in 0..selectors.len() {
            match selectors[i].case.status() {
                Availability::Available => {
                    // The attempt can still lose the race to another
                    // thread; keep scanning if it does.
                    if selectors[i].case.attempt() {
                        selectors[i].case.finish();
                        unregister_all(&selectors, &token);
                        return true;
                    }
                }
                Availability::Closed => {
                    unregister_all(&selectors, &token);
                    return false;
                }
                Availability::NotAvailable => {}
            }
        }

        if !token.wait_deadline(&deadline) {
            unregister_all(&selectors, &token);
            return false;
        }
    }
}

/// Every exit path runs this: each candidate removes the token from its
/// own channel, on its own side. Channels that never held the token
/// no-op.
fn unregister_all(selectors: &[Selector<'_>], token: &Arc<Signal>) {
    for selector in selectors {
        selector.case.unregister(token);
    }
}
