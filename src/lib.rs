// Module naming follows project convention (SPSC = Single-Producer Single-Consumer)
#[allow(non_snake_case)]
pub mod SPSC;
#[allow(non_snake_case)]
pub mod Core;
#[allow(non_snake_case)]
pub mod Wire;
#[allow(non_snake_case)]
pub mod Process;
#[allow(non_snake_case)]
pub mod Debug {
    pub mod StructDebug;
}

pub mod config;
pub mod error;

pub use config::{Config, ConfigBuilder, WorkerConfig};
pub use error::{ConfigError, DecodeError};
