mod builder;
mod consumer;
mod debug;
mod producer;

pub use builder::ChannelBuilder;
pub use consumer::Consumer;
pub use producer::Producer;

pub mod Buffer {
    pub mod Buffer;
    pub mod Buffer_impl;
    pub use Buffer::RingBuffer; // re-export for stable path
}
