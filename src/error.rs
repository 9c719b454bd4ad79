//! Error types for the wire protocol and for configuration.
//!
//! Stream and process plumbing reports `std::io::Error`; the two enums here
//! cover the failures that have a meaning of their own:
//!
//! - [`DecodeError`]: a line carried a known message kind with a bad payload.
//! - [`ConfigError`]: the pipeline was configured with values it cannot run with.

use thiserror::Error;

/// A recognised message kind whose payload could not be decoded.
///
/// Unknown kinds are not errors; [`decode`](crate::Wire::codec::decode)
/// returns `Ok(None)` for them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The line had fewer (or more) `|`-separated fields than the kind requires.
    #[error("{kind} line has {found} fields, expected {expected}")]
    FieldCount {
        kind: &'static str,
        expected: usize,
        found: usize,
    },

    /// A numeric field did not parse.
    #[error("{kind} field `{field}` is not a number: {value:?}")]
    InvalidNumber {
        kind: &'static str,
        field: &'static str,
        value: String,
    },

    /// The histogram of a `COUNT` line did not have ten buckets.
    #[error("COUNT histogram has {found} buckets, expected 10")]
    BucketCount { found: usize },

    /// The `<total>` of a `COUNT` line is not the sum of its buckets.
    #[error("COUNT total {declared} does not match bucket sum {actual}")]
    TotalMismatch { declared: u64, actual: u64 },

    /// The buckets of a `COUNT` line add up to more than `u64::MAX`.
    #[error("COUNT buckets overflow a 64-bit total")]
    CountOverflow,

    /// A `COMMAND` line named no known command.
    #[error("unknown command {0:?}")]
    UnknownCommand(String),
}

impl DecodeError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            DecodeError::FieldCount { .. } => "decode_field_count",
            DecodeError::InvalidNumber { .. } => "decode_invalid_number",
            DecodeError::BucketCount { .. } => "decode_bucket_count",
            DecodeError::TotalMismatch { .. } => "decode_total_mismatch",
            DecodeError::CountOverflow => "decode_count_overflow",
            DecodeError::UnknownCommand(_) => "decode_unknown_command",
        }
    }
}

/// Invalid pipeline configuration. Fatal at startup.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("worker count must be at least 1")]
    NoWorkers,

    #[error("generator slots per worker must be at least 1")]
    NoSlots,

    #[error("{0} interval must be greater than zero")]
    ZeroInterval(&'static str),

    #[error("{0} interval must be at least 1 ms")]
    SubMillisecondInterval(&'static str),

    #[error("buffer capacity must be at least 1")]
    ZeroCapacity,

    #[error("invalid value for {name}: {value:?}")]
    InvalidArgument { name: &'static str, value: String },
}

impl From<ConfigError> for std::io::Error {
    fn from(e: ConfigError) -> Self {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e)
    }
}
