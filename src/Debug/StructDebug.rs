use std::fmt;
use crate::Core::{FlushQueue, RoundCounter};
use crate::SPSC::Buffer::RingBuffer;

/// Debug function for RingBuffer
///
/// Shows the cursors and counters without touching slot contents,
/// which may be uninitialised.
pub fn debug_ring_buffer<T>(buffer: &RingBuffer<T>, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("RingBuffer")
        .field("capacity", &buffer.capacity())
        .field("pending", &buffer.pending())
        .field("overflow", &buffer.overflow_count())
        .finish_non_exhaustive()
}

/// Debug function for the Producer / Consumer handles
///
/// Both handles show the same shared ring state under their own name.
pub fn debug_ring_handle<T>(name: &str, buffer: &RingBuffer<T>, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct(name)
        .field("capacity", &buffer.capacity())
        .field("pending", &buffer.pending())
        .field("overflow", &buffer.overflow_count())
        .finish()
}

/// Debug function for FlushQueue
///
/// Items are not required to be `Debug`; only the queued count is shown.
pub fn debug_flush_queue<T>(queue: &FlushQueue<T>, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("FlushQueue")
        .field("len", &queue.len())
        .finish()
}

/// Debug function for RoundCounter
pub fn debug_round_counter(counter: &RoundCounter, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("RoundCounter")
        .field("value", &counter.get())
        .finish()
}
