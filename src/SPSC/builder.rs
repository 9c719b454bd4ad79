use super::{Consumer, Producer};
use crate::SPSC::Buffer::RingBuffer;
use std::sync::Arc;

pub struct ChannelBuilder {
    capacity: usize,
}

impl Default for ChannelBuilder {
    fn default() -> Self {
        Self {
            capacity: 1024, // 1024 slots
        }
    }
}

impl ChannelBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requested capacity; rounded up to the next power of two on build.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn build<T>(self) -> std::io::Result<(Producer<T>, Consumer<T>)> {
        let ring = RingBuffer::with_capacity(self.capacity).ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("Invalid channel capacity {}", self.capacity),
            )
        })?;
        let ring = Arc::new(ring);
        Ok((Producer::new(Arc::clone(&ring)), Consumer::new(ring)))
    }
}
