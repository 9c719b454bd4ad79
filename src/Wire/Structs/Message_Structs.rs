// Plain data carried over the worker <-> supervisor line protocol

use std::ops::Index;

/// Number of histogram buckets, one per decimal digit.
pub const DIGITS: usize = 10;

/// Commands sent from the supervisor to a worker.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Command {
    Start,
    Count,
    Stop,
}

impl Command {
    pub fn as_str(&self) -> &'static str {
        match self {
            Command::Start => "START",
            Command::Count => "COUNT",
            Command::Stop => "STOP",
        }
    }

    /// Case-insensitive parse; surrounding whitespace is ignored.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("START") {
            Some(Command::Start)
        } else if s.eq_ignore_ascii_case("COUNT") {
            Some(Command::Count)
        } else if s.eq_ignore_ascii_case("STOP") {
            Some(Command::Stop)
        } else {
            None
        }
    }
}

/// Per-digit occurrence tally for the values 0..=9.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct DigitHistogram {
    buckets: [u64; DIGITS],
}

impl DigitHistogram {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_buckets(buckets: [u64; DIGITS]) -> Self {
        Self { buckets }
    }

    /// Tally a sequence of digits. Values above 9 are not digits and are skipped.
    pub fn from_digits(digits: &[u8]) -> Self {
        let mut histogram = Self::new();
        for &digit in digits {
            histogram.record(digit);
        }
        histogram
    }

    /// Count one occurrence of `digit`. Returns `false` if it is not a digit.
    pub fn record(&mut self, digit: u8) -> bool {
        match self.buckets.get_mut(digit as usize) {
            Some(bucket) => {
                *bucket = bucket.saturating_add(1);
                true
            }
            None => false,
        }
    }

    /// Bucket-wise sum of `other` into `self`. Buckets saturate at `u64::MAX`.
    pub fn merge(&mut self, other: &DigitHistogram) {
        for (mine, theirs) in self.buckets.iter_mut().zip(other.buckets.iter()) {
            *mine = mine.saturating_add(*theirs);
        }
    }

    /// Sum of all buckets, saturating at `u64::MAX`.
    pub fn total(&self) -> u64 {
        self.buckets
            .iter()
            .fold(0u64, |sum, &count| sum.saturating_add(count))
    }

    /// Sum of all buckets, or `None` if it does not fit in a `u64`.
    pub fn checked_total(&self) -> Option<u64> {
        self.buckets
            .iter()
            .try_fold(0u64, |sum, &count| sum.checked_add(count))
    }

    pub fn buckets(&self) -> &[u64; DIGITS] {
        &self.buckets
    }
}

impl Index<usize> for DigitHistogram {
    type Output = u64;

    fn index(&self, digit: usize) -> &u64 {
        &self.buckets[digit]
    }
}

/// One line of the protocol.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Message {
    /// Worker finished starting up.
    Ready { process_id: u32 },
    /// Supervisor instruction.
    Command(Command),
    /// One generator slot's histogram for the current round.
    Count {
        process_id: u32,
        histogram: DigitHistogram,
    },
    /// Informational text. `thread_id` is `None` for process-level logs.
    Log {
        process_id: u32,
        thread_id: Option<u32>,
        text: String,
    },
}

impl Message {
    pub fn log(process_id: u32, thread_id: Option<u32>, text: impl Into<String>) -> Self {
        Message::Log {
            process_id,
            thread_id,
            text: text.into(),
        }
    }
}
