use std::sync::{Condvar, MutexGuard};
use std::time::{Duration, Instant};

/// An optional absolute deadline measured from the moment of construction.
///
/// Encapsulates the arithmetic of repeated bounded condition waits: every
/// call to [`wait`](Deadline::wait) sleeps for whatever is left of the
/// original budget, so callers can loop around spurious wake-ups without
/// re-arming the timeout.
pub(crate) struct Deadline {
    start: Instant,
    budget: Option<Duration>,
}

impl Deadline {
    /// A deadline that never expires.
    pub(crate) fn unlimited() -> Self {
        Self {
            start: Instant::now(),
            budget: None,
        }
    }

    /// A deadline that expires `budget` from now. A zero budget is the
    /// non-blocking case: waits return immediately.
    pub(crate) fn after(budget: Duration) -> Self {
        Self {
            start: Instant::now(),
            budget: Some(budget),
        }
    }

    /// Performs a single condition wait bounded by the remaining budget.
    ///
    /// Returns the re-acquired guard and true if the deadline has not yet
    /// elapsed. Does not re-check any predicate; the caller loops.
    pub(crate) fn wait<'a, T>(
        &self,
        cond: &Condvar,
        guard: MutexGuard<'a, T>,
    ) -> (MutexGuard<'a, T>, bool) {
        match self.budget {
            None => (cond.wait(guard).unwrap(), true),
            Some(budget) if budget.is_zero() => (guard, false),
            Some(_) => {
                let (guard, _) = cond.wait_timeout(guard, self.remaining()).unwrap();
                (guard, !self.expired())
            }
        }
    }

    /// Time left before expiry. Unlimited deadlines report zero remaining
    /// and never expire; check [`wait`](Deadline::wait)'s return instead.
    fn remaining(&self) -> Duration {
        match self.budget {
            None => Duration::ZERO,
            Some(budget) => budget.saturating_sub(self.start.elapsed()),
        }
    }

    fn expired(&self) -> bool {
        match self.budget {
            None => false,
            Some(budget) => self.start.elapsed() >= budget,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_zero_budget_returns_immediately() {
        let mutex = Mutex::new(());
        let cond = Condvar::new();
        let deadline = Deadline::after(Duration::ZERO);

        let guard = mutex.lock().unwrap();
        let (_guard, in_time) = deadline.wait(&cond, guard);
        assert!(!in_time);
    }

    #[test]
    #[cfg_attr(miri, ignore)]
    fn test_finite_budget_expires() {
        let mutex = Mutex::new(());
        let cond = Condvar::new();
        let deadline = Deadline::after(Duration::from_millis(20));

        // Nothing signals the condition; loop around spurious wake-ups
        // until the budget runs out.
        let started = Instant::now();
        let mut guard = mutex.lock().unwrap();
        loop {
            let (reacquired, in_time) = deadline.wait(&cond, guard);
            guard = reacquired;
            if !in_time {
                break;
            }
        }
        assert!(started.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    #[cfg_attr(miri, ignore)]
    fn test_remaining_shrinks() {
        let deadline = Deadline::after(Duration::from_millis(200));
        std::thread::sleep(Duration::from_millis(20));
        assert!(deadline.remaining() < Duration::from_millis(200));
        assert!(!deadline.expired());
    }
}
