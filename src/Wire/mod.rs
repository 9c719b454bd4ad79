pub mod codec;
mod sink;

pub use codec::{decode, encode};
pub use sink::MessageSink;

pub mod Structs {
    pub mod Message_Structs;
    pub use Message_Structs::{Command, DigitHistogram, Message, DIGITS}; // re-export for stable path
}
