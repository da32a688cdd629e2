use std::sync::{Condvar, Mutex};

use crate::deadline::Deadline;

/// A counting-semaphore notification token.
///
/// Each `select` call owns one `Signal` and registers it with every channel
/// it waits on. A channel that becomes ready notifies the token; because
/// permits accumulate, a notification that lands between registration and
/// the wait is never lost.
///
/// Tokens are compared by identity (`Arc::ptr_eq`) when removed from a
/// channel's waiter queue.
pub(crate) struct Signal {
    permits: Mutex<usize>,
    cond: Condvar,
}

impl Signal {
    pub(crate) fn new() -> Self {
        Self {
            permits: Mutex::new(0),
            cond: Condvar::new(),
        }
    }

    /// Adds a permit and wakes one waiter.
    pub(crate) fn notify(&self) {
        let mut permits = self.permits.lock().unwrap();
        *permits += 1;
        self.cond.notify_one();
    }

    /// Acquires one permit, waiting no longer than the deadline allows.
    ///
    /// Returns true if a permit was acquired, false if the deadline elapsed
    /// first. An unlimited deadline waits indefinitely.
    pub(crate) fn wait_deadline(&self, deadline: &Deadline) -> bool {
        let mut permits = self.permits.lock().unwrap();
        while *permits == 0 {
            let (guard, in_time) = deadline.wait(&self.cond, permits);
            permits = guard;
            if !in_time {
                // A permit may have arrived in the same instant the
                // deadline elapsed; prefer consuming it.
                if *permits > 0 {
                    break;
                }
                return false;
            }
        }
        *permits -= 1;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_notify_before_wait_is_not_lost() {
        let signal = Signal::new();
        signal.notify();
        assert!(signal.wait_deadline(&Deadline::after(Duration::ZERO)));
    }

    #[test]
    fn test_permits_accumulate() {
        let signal = Signal::new();
        signal.notify();
        signal.notify();
        let zero = Deadline::after(Duration::ZERO);
        assert!(signal.wait_deadline(&zero));
        assert!(signal.wait_deadline(&zero));
        assert!(!signal.wait_deadline(&Deadline::after(Duration::ZERO)));
    }

    #[test]
    #[cfg_attr(miri, ignore)]
    fn test_bounded_wait_expires() {
        let signal = Signal::new();
        assert!(!signal.wait_deadline(&Deadline::after(Duration::from_millis(20))));
    }

    #[test]
    #[cfg_attr(miri, ignore)]
    fn test_wakes_parked_waiter() {
        let signal = Arc::new(Signal::new());
        let notifier = signal.clone();

        let t = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            notifier.notify();
        });

        assert!(signal.wait_deadline(&Deadline::unlimited()));
        t.join().unwrap();
    }
}
