//! Asynchronous channel: a bounded FIFO queue.
//!
//! Senders block only while the queue is full, receivers only while it is
//! empty. Close leaves queued values receivable; the channel reports itself
//! closed only once drained.

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
    while !state.closed && !state.has_capacity() {
        state = shared.cond_write.wait(state).unwrap();
    }
    state.writers -= 1;

    if state.closed {
        return Err(SendError(value));
    }
    state.accept(value);
    state.notify_readers(&shared.cond_read);
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
    while !state.closed && !state.has_messages() {
        state = shared.cond_read.wait(state).unwrap();
    }
    state.readers -= 1;

    match state.take() {
        Some(value) => {
            state.notify_writers(&shared.cond_write);
            Ok(value)
        }
        // Closed and drained; open channels only leave the wait loop with
        // a message present.
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

pub(crate) fn close<T>(shared: &Shared<T>) {
    let mut state = shared.state.lock().unwrap();
    if state.closed {
        return;
    }
    state.close_and_release(&shared.cond_read, &shared.cond_write);
}
