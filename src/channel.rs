use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

use crate::error::{
    RecvError, RecvTimeoutError, SendError, SendTimeoutError, TryRecvError, TrySendError,
};
use crate::flavors::{buffered, rendezvous};
use crate::signal::Signal;
use crate::waiters::WaiterQueue;

/// Which concrete implementation backs a channel.
#[derive(Clone, Copy, PartialEq, Eq)]
pub(crate) enum Flavor {
    /// No buffer; values are handed directly from sender to receiver.
    Rendezvous,
    /// Fixed-capacity FIFO buffer.
    Buffered,
}

/// Tri-state readiness answer used by the select engine's re-scan.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) enum Availability {
    NotAvailable,
    Available,
    Closed,
}

/// Value storage for one channel.
pub(crate) enum Store<T> {
    /// Rendezvous hand-off slot; at most one value in flight.
    Slot(Option<T>),
    /// Bounded FIFO for the buffered flavor.
    Queue {
        items: VecDeque<T>,
        capacity: usize,
    },
}

/// Everything a channel guards with its lock.
pub(crate) struct State<T> {
    pub(crate) store: Store<T>,
    pub(crate) closed: bool,
    /// Threads currently parked inside a direct recv on `cond_read`.
    pub(crate) readers: usize,
    /// Threads currently parked inside a direct send on `cond_write`.
    pub(crate) writers: usize,
    /// Select tokens waiting for a value to arrive.
    pub(crate) read_waiters: WaiterQueue,
    /// Select tokens waiting for capacity to free up.
    pub(crate) write_waiters: WaiterQueue,
}

impl<T> State<T> {
    pub(crate) fn has_messages(&self) -> bool {
        match &self.store {
            Store::Slot(slot) => slot.is_some(),
            Store::Queue { items, .. } => !items.is_empty(),
        }
    }

    /// Whether a send could be accepted right now.
    ///
    /// For a rendezvous channel, capacity exists only while a receiver is
    /// visibly present (parked in a direct recv, or registered through
    /// select). An empty slot alone is not capacity; that is what makes
    /// the hand-off a rendezvous rather than a one-slot buffer.
    pub(crate) fn has_capacity(&self) -> bool {
        match &self.store {
            Store::Slot(slot) => {
                slot.is_none() && (self.readers > 0 || !self.read_waiters.is_empty())
            }
            Store::Queue { items, capacity } => items.len() < *capacity,
        }
    }

    /// Stores a value. The caller has already established capacity for the
    /// slot case; a queue simply grows within its bound.
    pub(crate) fn accept(&mut self, value: T) {
        match &mut self.store {
            Store::Slot(slot) => *slot = Some(value),
            Store::Queue { items, .. } => items.push_back(value),
        }
    }

    /// Removes and returns the next value, if any.
    pub(crate) fn take(&mut self) -> Option<T> {
        match &mut self.store {
            Store::Slot(slot) => slot.take(),
            Store::Queue { items, .. } => items.pop_front(),
        }
    }

    /// Wakes one party interested in consuming a value: a directly parked
    /// receiver if there is one, otherwise the head select token, rotated
    /// to the tail so contending select callers take turns.
    pub(crate) fn notify_readers(&mut self, cond_read: &Condvar) {
        if self.readers > 0 {
            cond_read.notify_one();
        } else if let Some(token) = self.read_waiters.rotate_head() {
            token.notify();
        }
    }

    /// Mirror of [`notify_readers`](State::notify_readers) for the sending
    /// side.
    pub(crate) fn notify_writers(&mut self, cond_write: &Condvar) {
        if self.writers > 0 {
            cond_write.notify_one();
        } else if let Some(token) = self.write_waiters.rotate_head() {
            token.notify();
        }
    }

    /// Marks the channel closed and wakes everything: every registered
    /// select token is released and both condition variables broadcast.
    /// Spent tokens are dropped from the queues; their owners observe
    /// `Closed` on re-scan and their deregistration becomes a no-op.
    pub(crate) fn close_and_release(&mut self, cond_read: &Condvar, cond_write: &Condvar) {
        self.closed = true;
        for token in self.read_waiters.iter() {
            token.notify();
        }
        for token in self.write_waiters.iter() {
            token.notify();
        }
        self.read_waiters.clear();
        self.write_waiters.clear();
        cond_read.notify_all();
        cond_write.notify_all();
    }
}

pub(crate) struct Shared<T> {
    pub(crate) flavor: Flavor,
    pub(crate) state: Mutex<State<T>>,
    /// Direct receivers park here.
    pub(crate) cond_read: Condvar,
    /// Direct senders park here; rendezvous close drains through it too.
    pub(crate) cond_write: Condvar,
}

/// A channel handle. Cloning is cheap and every clone refers to the same
/// channel; any clone may send, receive or close.
///
/// Created by [`rendezvous`](crate::rendezvous) or
/// [`bounded`](crate::bounded).
pub struct Channel<T> {
    pub(crate) shared: Arc<Shared<T>>,
}

impl<T> Clone for Channel<T> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<T> Channel<T> {
    pub(crate) fn with_store(flavor: Flavor, store: Store<T>) -> Self {
        Self {
            shared: Arc::new(Shared {
                flavor,
                state: Mutex::new(State {
                    store,
                    closed: false,
                    readers: 0,
                    writers: 0,
                    read_waiters: WaiterQueue::new(),
                    write_waiters: WaiterQueue::new(),
                }),
                cond_read: Condvar::new(),
                cond_write: Condvar::new(),
            }),
        }
    }

    /// Sends a value, blocking until the channel accepts it.
    ///
    /// On a buffered channel this waits for free capacity; on a rendezvous
    /// channel it waits until a receiver has taken the value. Fails with
    /// the value handed back if the channel is closed before the value was
    /// accepted.
    pub fn send(&self, value: T) -> Result<(), SendError<T>> {
        match self.shared.flavor {
            Flavor::Rendezvous => rendezvous::send(&self.shared, value),
            Flavor::Buffered => buffered::send(&self.shared, value),
        }
    }

    /// Attempts to send without blocking.
    ///
    /// A rendezvous channel accepts only if a receiver is already waiting.
    pub fn try_send(&self, value: T) -> Result<(), TrySendError<T>> {
        match self.shared.flavor {
            Flavor::Rendezvous => rendezvous::try_send(&self.shared, value),
            Flavor::Buffered => buffered::try_send(&self.shared, value),
        }
    }

    /// Attempts to send, waiting at most `timeout`. A zero timeout is
    /// equivalent to [`try_send`](Channel::try_send).
    pub fn send_timeout(&self, value: T, timeout: Duration) -> Result<(), SendTimeoutError<T>> {
        match self.shared.flavor {
            Flavor::Rendezvous => rendezvous::send_timeout(&self.shared, value, timeout),
            Flavor::Buffered => buffered::send_timeout(&self.shared, value, timeout),
        }
    }

    /// Receives a value, blocking until one is available. Fails once the
    /// channel is closed and drained.
    pub fn recv(&self) -> Result<T, RecvError> {
        match self.shared.flavor {
            Flavor::Rendezvous => rendezvous::recv(&self.shared),
            Flavor::Buffered => buffered::recv(&self.shared),
        }
    }

    /// Attempts to receive without blocking.
    pub fn try_recv(&self) -> Result<T, TryRecvError> {
        match self.shared.flavor {
            Flavor::Rendezvous => rendezvous::try_recv(&self.shared),
            Flavor::Buffered => buffered::try_recv(&self.shared),
        }
    }

    /// Attempts to receive, waiting at most `timeout`. A zero timeout is
    /// equivalent to [`try_recv`](Channel::try_recv).
    pub fn recv_timeout(&self, timeout: Duration) -> Result<T, RecvTimeoutError> {
        match self.shared.flavor {
            Flavor::Rendezvous => rendezvous::recv_timeout(&self.shared, timeout),
            Flavor::Buffered => buffered::recv_timeout(&self.shared, timeout),
        }
    }

    /// Closes the channel. Idempotent.
    ///
    /// Every parked sender and receiver wakes, and every registered select
    /// token is released. Values already buffered remain receivable. On a
    /// rendezvous channel `close` additionally blocks until a value that
    /// was deposited before the close has been received, so a sender's
    /// hand-off is never silently discarded.
    pub fn close(&self) {
        match self.shared.flavor {
            Flavor::Rendezvous => rendezvous::close(&self.shared),
            Flavor::Buffered => buffered::close(&self.shared),
        }
    }

    /// True once the channel is closed and nothing more can be received.
    ///
    /// A closed channel still holding buffered values reports false until
    /// they are drained.
    pub fn is_closed(&self) -> bool {
        let state = self.shared.state.lock().unwrap();
        state.closed && !state.has_messages()
    }

    /// Receives values and applies `f` to each, returning once the channel
    /// is closed and drained.
    pub fn for_each<F>(&self, mut f: F)
    where
        F: FnMut(T),
    {
        while let Ok(value) = self.recv() {
            f(value);
        }
    }

    /// Applies `f` to a value only if one is immediately available.
    pub fn for_new<F>(&self, f: F)
    where
        F: FnOnce(T),
    {
        if let Ok(value) = self.try_recv() {
            f(value);
        }
    }

    /// A blocking iterator over received values, ending when the channel
    /// is closed and drained.
    ///
    /// # Example
    ///
    /// ```
    /// let ch = sluice::bounded(3);
    /// ch.send(1).unwrap();
    /// ch.send(2).unwrap();
    /// ch.close();
    ///
    /// let values: Vec<i32> = ch.iter().collect();
    /// assert_eq!(values, vec![1, 2]);
    /// ```
    pub fn iter(&self) -> Iter<'_, T> {
        Iter { channel: self }
    }

    /// Atomically registers a select token on the receiving side.
    ///
    /// Refuses (returning false) when the channel is closed or already has
    /// a message: in both cases the caller should attempt the operation
    /// instead of parking.
    pub(crate) fn register_reader_waiter(&self, token: &Arc<Signal>) -> bool {
        let mut state = self.shared.state.lock().unwrap();
        if state.closed || state.has_messages() {
            false
        } else {
            state.read_waiters.append(token.clone());
            true
        }
    }

    /// Mirror of [`register_reader_waiter`](Channel::register_reader_waiter)
    /// for the sending side; refuses when closed or capacity is available.
    pub(crate) fn register_writer_waiter(&self, token: &Arc<Signal>) -> bool {
        let mut state = self.shared.state.lock().unwrap();
        if state.closed || state.has_capacity() {
            false
        } else {
            state.write_waiters.append(token.clone());
            true
        }
    }

    /// Removes a select token from the receiving side. Idempotent; safe to
    /// call for tokens that were never registered here.
    pub(crate) fn unregister_reader_waiter(&self, token: &Arc<Signal>) {
        let mut state = self.shared.state.lock().unwrap();
        state.read_waiters.remove(token);
    }

    /// Removes a select token from the sending side. Idempotent.
    pub(crate) fn unregister_writer_waiter(&self, token: &Arc<Signal>) {
        let mut state = self.shared.state.lock().unwrap();
        state.write_waiters.remove(token);
    }

    /// Whether a receive could proceed right now.
    pub(crate) fn messages_status(&self) -> Availability {
        let state = self.shared.state.lock().unwrap();
        if state.has_messages() {
            Availability::Available
        } else if state.closed {
            Availability::Closed
        } else {
            Availability::NotAvailable
        }
    }

    /// Whether a send could proceed right now.
    pub(crate) fn capacity_status(&self) -> Availability {
        let state = self.shared.state.lock().unwrap();
        if state.has_capacity() {
            Availability::Available
        } else if state.closed {
            Availability::Closed
        } else {
            Availability::NotAvailable
        }
    }
}

/// Blocking iterator returned by [`Channel::iter`].
pub struct Iter<'a, T> {
    channel: &'a Channel<T>,
}

impl<T> Iterator for Iter<'_, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.channel.recv().ok()
    }
}

impl<'a, T> IntoIterator for &'a Channel<T> {
    type Item = T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}
