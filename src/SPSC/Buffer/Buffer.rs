// This is the bounded ring shared by exactly one producer and one consumer

use crossbeam_utils::CachePadded;
use std::cell::UnsafeCell;
use std::mem::MaybeUninit;
use std::sync::atomic::AtomicU64;

/// A single slot in the ring buffer.
///
/// A slot is initialised iff its logical index lies in `[read_index, write_index)`.
pub(crate) type Slot<T> = UnsafeCell<MaybeUninit<T>>;

/// A fixed-capacity, drop-on-full, single-producer single-consumer ring.
///
/// This struct is never handed out directly. It lives behind an `Arc` shared
/// by one [`Producer`](crate::SPSC::Producer) and one
/// [`Consumer`](crate::SPSC::Consumer); the handles are the only way to touch it.
///
/// ### Concurrency Design:
/// - **Producer (tryWrite)**: the only writer of `write_index`. It reads
///   `read_index` to detect a full ring, fills the slot at `write_index & mask`
///   and then publishes it by storing `write_index + 1` with `Release`.
/// - **Consumer (drainAll)**: the only writer of `read_index`. It snapshots
///   `write_index` with `Acquire`, moves every value in `[read_index, snapshot)`
///   out of the ring, then releases the slots by storing `read_index = snapshot`.
///
/// Both indices are logical and grow monotonically; `write_index - read_index`
/// is always in `[0, capacity]`.
pub struct RingBuffer<T> {
    /// Backing slots. Length is always a power of two.
    pub(crate) slots: Box<[Slot<T>]>,

    /// A bitmask used to wrap logical indices around the slots.
    /// Calculated as `capacity - 1`.
    pub(crate) mask: u64,

    /// Next logical index the producer will write.
    /// Padded so producer and consumer cursors never share a cache line.
    pub(crate) write_index: CachePadded<AtomicU64>,

    /// Next logical index the consumer will read.
    pub(crate) read_index: CachePadded<AtomicU64>,

    /// Number of values rejected because the ring was full.
    pub(crate) overflow: AtomicU64,
}

// Slots are only accessed through the producer/consumer protocol above.
unsafe impl<T: Send> Send for RingBuffer<T> {}
unsafe impl<T: Send> Sync for RingBuffer<T> {}
