use parking_lot::Mutex;

/// A multi-producer, single-consumer queue drained in bulk.
///
/// Any number of threads may [`append`](FlushQueue::append) concurrently.
/// [`drain_all`](FlushQueue::drain_all) detaches everything appended so far
/// in one constant-time swap under the lock and hands the detached items back
/// oldest-first, so producers are never blocked for longer than the swap.
///
/// Order is preserved per producer; interleaving across producers is whatever
/// order the lock was acquired in.
///
/// Storage is a `Vec` swapped out whole rather than a linked list with a
/// sentinel node: the detach is the same single step under the lock, and the
/// drained batch is walked after the lock is released.
pub struct FlushQueue<T> {
    items: Mutex<Vec<T>>,
}

impl<T> FlushQueue<T> {
    pub fn new() -> Self {
        Self {
            items: Mutex::new(Vec::new()),
        }
    }

    /// Append one item at the tail.
    pub fn append(&self, value: T) {
        self.items.lock().push(value);
    }

    /// Detach every queued item and return them oldest-first.
    ///
    /// A fresh, empty storage is installed before the lock is released, so
    /// appends racing with the caller's processing of the result land in the
    /// next drain. Only one thread is expected to drain.
    pub fn drain_all(&self) -> Vec<T> {
        std::mem::take(&mut *self.items.lock())
    }

    /// Number of items currently queued.
    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Default for FlushQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
