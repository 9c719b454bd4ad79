pub mod counter;
mod debug;
pub mod flush_queue;
pub mod stop;

pub use counter::RoundCounter;
pub use flush_queue::FlushQueue;
pub use stop::StopSignal;
