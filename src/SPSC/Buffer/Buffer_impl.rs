use std::cell::UnsafeCell;
use std::mem::MaybeUninit;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering::{Acquire, Relaxed, Release};

use crossbeam_utils::CachePadded;

use super::Buffer::{RingBuffer, Slot};

impl<T> RingBuffer<T> {
    /// Create a ring with at least `requested` slots.
    ///
    /// The capacity is rounded up to the next power of two so indices can be
    /// wrapped with a mask. Returns `None` if `requested` is zero or the
    /// rounded capacity does not fit in `usize`.
    pub(crate) fn with_capacity(requested: usize) -> Option<Self> {
        if requested == 0 {
            return None;
        }
        let capacity = requested.checked_next_power_of_two()?;
        let slots: Box<[Slot<T>]> = (0..capacity)
            .map(|_| UnsafeCell::new(MaybeUninit::uninit()))
            .collect();

        Some(Self {
            slots,
            mask: capacity as u64 - 1,
            write_index: CachePadded::new(AtomicU64::new(0)),
            read_index: CachePadded::new(AtomicU64::new(0)),
            overflow: AtomicU64::new(0),
        })
    }

    /// Number of slots in the ring.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of values written but not yet drained.
    pub fn pending(&self) -> usize {
        let read = self.read_index.load(Acquire);
        let write = self.write_index.load(Acquire);
        write.saturating_sub(read) as usize
    }

    /// Number of values dropped because the ring was full.
    pub fn overflow_count(&self) -> u64 {
        self.overflow.load(Relaxed)
    }

    /// Store `value` unless the ring is full.
    ///
    /// # Safety
    /// Must only be called by the single producer of this ring.
    pub(crate) unsafe fn try_write(&self, value: T) -> bool {
        // Our own cursor: nobody else stores it.
        let write = self.write_index.load(Relaxed);
        let read = self.read_index.load(Acquire);

        if write - read >= self.capacity() as u64 {
            // full: drop the new value, never the unread ones
            self.overflow.fetch_add(1, Relaxed);
            return false;
        }

        let slot = &self.slots[(write & self.mask) as usize];
        (*slot.get()).write(value);

        // Publish
        self.write_index.store(write + 1, Release);
        true
    }

    /// Move every unread value out of the ring, oldest first.
    ///
    /// # Safety
    /// Must only be called by the single consumer of this ring.
    pub(crate) unsafe fn drain_all(&self) -> Vec<T> {
        let read = self.read_index.load(Relaxed);
        let write = self.write_index.load(Acquire);

        let available = write - read;
        if available == 0 {
            return Vec::new();
        }

        let mut values = Vec::with_capacity(available as usize);
        for index in read..write {
            let slot = &self.slots[(index & self.mask) as usize];
            values.push((*slot.get()).assume_init_read());
        }

        // free slots for the producer
        self.read_index.store(write, Release);
        values
    }
}

impl<T> Drop for RingBuffer<T> {
    fn drop(&mut self) {
        let read = *self.read_index.get_mut();
        let write = *self.write_index.get_mut();
        for index in read..write {
            let slot = &mut self.slots[(index & self.mask) as usize];
            // Safety: slots in [read, write) are initialised and owned by the ring.
            unsafe { slot.get_mut().assume_init_drop() };
        }
    }
}
