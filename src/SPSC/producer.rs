// src/SPSC/producer.rs
use crate::SPSC::Buffer::RingBuffer;
use std::sync::Arc;

/// The writing half of a bounded SPSC channel.
///
/// There is exactly one `Producer` per ring. It is `Send` but not `Clone`,
/// and [`try_write`](Producer::try_write) takes `&mut self`, so the
/// single-producer rule is checked by the compiler.
pub struct Producer<T> {
    ring: Arc<RingBuffer<T>>,
}

impl<T> Producer<T> {
    pub(crate) fn new(ring: Arc<RingBuffer<T>>) -> Self {
        Self { ring }
    }

    /// Writes a value into the channel.
    ///
    /// # Returns
    /// * `true` if the value was stored
    /// * `false` if the channel was full; the value is dropped and the
    ///   overflow counter is incremented. Already stored values are untouched.
    pub fn try_write(&mut self, value: T) -> bool {
        // Safety: `&mut self` on the only producer handle.
        unsafe { self.ring.try_write(value) }
    }

    /// Returns the capacity of the channel (a power of two).
    pub fn capacity(&self) -> usize {
        self.ring.capacity()
    }

    /// Returns the number of values not yet drained by the consumer.
    pub fn pending(&self) -> usize {
        self.ring.pending()
    }

    /// Returns how many values were dropped because the channel was full.
    pub fn overflow_count(&self) -> u64 {
        self.ring.overflow_count()
    }

    pub(crate) fn ring(&self) -> &RingBuffer<T> {
        &self.ring
    }
}
