use parking_lot::{Condvar, Mutex};
use std::time::Instant;

/// A latched stop request that sleeping threads can wait on.
///
/// Once triggered it stays triggered. Periodic loops sleep with
/// [`wait_until`](StopSignal::wait_until) instead of `thread::sleep` so a stop
/// request wakes them at once.
pub struct StopSignal {
    stopped: Mutex<bool>,
    changed: Condvar,
}

impl StopSignal {
    pub fn new() -> Self {
        Self {
            stopped: Mutex::new(false),
            changed: Condvar::new(),
        }
    }

    /// Request a stop and wake every waiter. Idempotent.
    pub fn trigger(&self) {
        let mut stopped = self.stopped.lock();
        *stopped = true;
        self.changed.notify_all();
    }

    pub fn is_triggered(&self) -> bool {
        *self.stopped.lock()
    }

    /// Block until a stop is requested.
    pub fn wait(&self) {
        let mut stopped = self.stopped.lock();
        while !*stopped {
            self.changed.wait(&mut stopped);
        }
    }

    /// Sleep until `deadline` or until a stop is requested, whichever is first.
    ///
    /// Returns `true` if a stop was requested.
    pub fn wait_until(&self, deadline: Instant) -> bool {
        let mut stopped = self.stopped.lock();
        while !*stopped {
            if self.changed.wait_until(&mut stopped, deadline).timed_out() {
                break;
            }
        }
        *stopped
    }
}

impl Default for StopSignal {
    fn default() -> Self {
        Self::new()
    }
}
