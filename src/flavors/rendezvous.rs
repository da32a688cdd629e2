//! Synchronous channel: a single-slot direct hand-off.
//!
//! A blocking send deposits its value and then waits until a receiver has
//! taken it, so sender and receiver meet in time. A non-blocking send goes
//! further: it succeeds only when a receiver is already visibly waiting,
//! which is what distinguishes a rendezvous from a one-slot buffer.

use std::time::Duration;

use crate::channel::Shared;
use crate::deadline::Deadline;
use crate::error::{
    RecvError, RecvTimeoutError, SendError, SendTimeoutError, TryRecvError, TrySendError,
};

pub(crate) fn send<T>(shared: &Shared<T>, value: T) -> Result<(), SendError<T>> {
    let mut state = shared.state.lock().unwrap();
    if state.closed {
        return Err(SendError(value));
    }

    state.writers += 1;

    // Wait for the hand-off slot to free up.
    while !state.closed && state.has_messages() {
        state = shared.cond_write.wait(state).unwrap();
    }
    if state.closed {
        state.writers -= 1;
        return Err(SendError(value));
    }

    state.accept(value);
    state.notify_readers(&shared.cond_read);

    // The rendezvous completes once a receiver empties the slot. If the
    // channel closes first, the value stays deposited: close itself waits
    // for it to be received, so the hand-off still succeeds.
    while !state.closed && state.has_messages() {
        state = shared.cond_write.wait(state).unwrap();
    }

    // Pass the wake-up along; the consumption signal may have landed on
    // this sender instead of one still waiting for the slot.
    state.notify_writers(&shared.cond_write);
    state.writers -= 1;
    Ok(())
}

pub(crate) fn try_send<T>(shared: &Shared<T>, value: T) -> Result<(), TrySendError<T>> {
    let mut state = shared.state.lock().unwrap();
    if state.closed {
        return Err(TrySendError::Closed(value));
    }
    if !state.has_capacity() {
        return Err(TrySendError::Full(value));
    }
    state.accept(value);
    state.notify_readers(&shared.cond_read);
    Ok(())
}

pub(crate) fn send_timeout<T>(
    shared: &Shared<T>,
    value: T,
    timeout: Duration,
) -> Result<(), SendTimeoutError<T>> {
    if timeout.is_zero() {
        return match try_send(shared, value) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(value)) => Err(SendTimeoutError::Timeout(value)),
            Err(TrySendError::Closed(value)) => Err(SendTimeoutError::Closed(value)),
        };
    }

    let deadline = Deadline::after(timeout);
    let mut state = shared.state.lock().unwrap();

    state.writers += 1;
    let mut expired = false;
    while !state.closed && !state.has_capacity() && !expired {
        let (guard, in_time) = deadline.wait(&shared.cond_write, state);
        state = guard;
        expired = !in_time;
    }
    state.writers -= 1;

    if state.closed {
        return Err(SendTimeoutError::Closed(value));
    }
    if !state.has_capacity() {
        return Err(SendTimeoutError::Timeout(value));
    }
    state.accept(value);
    state.notify_readers(&shared.cond_read);
    Ok(())
}

pub(crate) fn recv<T>(shared: &Shared<T>) -> Result<T, RecvError> {
    let mut state = shared.state.lock().unwrap();

    state.readers += 1;
    if !state.closed && !state.has_messages() {
        // Announce this receiver: a producer parked until a receiver shows
        // up re-checks its capacity once the reader count is visible.
        state.notify_writers(&shared.cond_write);
    }
    while !state.closed && !state.has_messages() {
        state = shared.cond_read.wait(state).unwrap();
    }
    state.readers -= 1;

    match state.take() {
        Some(value) => {
            state.notify_writers(&shared.cond_write);
            Ok(value)
        }
        None => Err(RecvError),
    }
}

pub(crate) fn try_recv<T>(shared: &Shared<T>) -> Result<T, TryRecvError> {
    let mut state = shared.state.lock().unwrap();
    match state.take() {
        Some(value) => {
            state.notify_writers(&shared.cond_write);
            Ok(value)
        }
        None if state.closed => Err(TryRecvError::Closed),
        None => Err(TryRecvError::Empty),
    }
}

pub(crate) fn recv_timeout<T>(shared: &Shared<T>, timeout: Duration) -> Result<T, RecvTimeoutError> {
    if timeout.is_zero() {
        return match try_recv(shared) {
            Ok(value) => Ok(value),
            Err(TryRecvError::Empty) => Err(RecvTimeoutError::Timeout),
            Err(TryRecvError::Closed) => Err(RecvTimeoutError::Closed),
        };
    }

    let deadline = Deadline::after(timeout);
    let mut state = shared.state.lock().unwrap();

    state.readers += 1;
    if !state.closed && !state.has_messages() {
        // Same announcement as in recv; a timed sender must be able to
        // observe this receiver or the two would wait out both timeouts.
        state.notify_writers(&shared.cond_write);
    }
    let mut expired = false;
    while !state.closed && !state.has_messages() && !expired {
        let (guard, in_time) = deadline.wait(&shared.cond_read, state);
        state = guard;
        expired = !in_time;
    }
    state.readers -= 1;

    match state.take() {
        Some(value) => {
            state.notify_writers(&shared.cond_write);
            Ok(value)
        }
        None if state.closed => Err(RecvTimeoutError::Closed),
        None => Err(RecvTimeoutError::Timeout),
    }
}

/// Close wakes everything like the buffered flavor, then blocks until a
/// value deposited before the close has been received. A hand-off that was
/// already in flight is therefore guaranteed to complete.
pub(crate) fn close<T>(shared: &Shared<T>) {
    let mut state = shared.state.lock().unwrap();
    if state.closed {
        return;
    }
    state.close_and_release(&shared.cond_read, &shared.cond_write);

    // Count ourselves as a writer so the receiver's consumption
    // notification signals the condition variable instead of trying to
    // release a select token.
    state.writers += 1;
    while state.has_messages() {
        state = shared.cond_write.wait(state).unwrap();
    }
    state.writers -= 1;
}
