use parking_lot::{Condvar, Mutex};
use std::time::{Duration, Instant};

/// A monotonic counter that threads can block on until it reaches a threshold.
///
/// Increment and wake-up happen in one critical section under the same lock
/// the waiters check, so a waiter can never miss the increment that satisfies
/// it. Used as the supervisor's "all workers ready" and "all reports in"
/// barriers.
pub struct RoundCounter {
    value: Mutex<usize>,
    changed: Condvar,
}

impl RoundCounter {
    pub fn new() -> Self {
        Self {
            value: Mutex::new(0),
            changed: Condvar::new(),
        }
    }

    /// Add one and wake every waiter. Returns the new value.
    pub fn increment(&self) -> usize {
        let mut value = self.value.lock();
        *value += 1;
        self.changed.notify_all();
        *value
    }

    /// Set the counter back to zero.
    ///
    /// Must be called by the owner of the round before it triggers the
    /// increments the new round waits for.
    pub fn reset(&self) {
        *self.value.lock() = 0;
    }

    pub fn get(&self) -> usize {
        *self.value.lock()
    }

    /// Block until the counter is at least `threshold`.
    ///
    /// Returns immediately if it already is.
    pub fn await_at_least(&self, threshold: usize) {
        let mut value = self.value.lock();
        while *value < threshold {
            self.changed.wait(&mut value);
        }
    }

    /// Like [`await_at_least`](Self::await_at_least) but gives up after `timeout`.
    ///
    /// Returns `true` if the threshold was reached.
    pub fn await_at_least_for(&self, threshold: usize, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut value = self.value.lock();
        while *value < threshold {
            if self.changed.wait_until(&mut value, deadline).timed_out() {
                return *value >= threshold;
            }
        }
        true
    }
}

impl Default for RoundCounter {
    fn default() -> Self {
        Self::new()
    }
}
