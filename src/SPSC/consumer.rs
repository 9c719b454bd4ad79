// src/SPSC/consumer.rs
use crate::SPSC::Buffer::RingBuffer;
use std::sync::Arc;

/// The draining half of a bounded SPSC channel.
///
/// Like [`Producer`](crate::SPSC::Producer), a `Consumer` is unique per ring
/// and drains through `&mut self`.
pub struct Consumer<T> {
    ring: Arc<RingBuffer<T>>,
}

impl<T> Consumer<T> {
    pub(crate) fn new(ring: Arc<RingBuffer<T>>) -> Self {
        Self { ring }
    }

    /// Returns every value written since the last drain, oldest first.
    ///
    /// The set of values is fixed by a snapshot of the producer's cursor taken
    /// on entry; writes racing with the drain are left for the next call.
    /// Returns an empty vector if nothing is pending.
    pub fn drain_all(&mut self) -> Vec<T> {
        // Safety: `&mut self` on the only consumer handle.
        unsafe { self.ring.drain_all() }
    }

    /// Returns the capacity of the channel (a power of two).
    pub fn capacity(&self) -> usize {
        self.ring.capacity()
    }

    /// Returns the number of values waiting to be drained.
    pub fn pending(&self) -> usize {
        self.ring.pending()
    }

    /// Returns how many values the producer dropped because the channel was full.
    pub fn overflow_count(&self) -> u64 {
        self.ring.overflow_count()
    }

    pub(crate) fn ring(&self) -> &RingBuffer<T> {
        &self.ring
    }
}
