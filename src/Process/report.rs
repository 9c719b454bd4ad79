use serde::Serialize;
use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::Wire::Structs::{DigitHistogram, DIGITS};

const DIGIT_KEYS: [&str; DIGITS] = ["0", "1", "2", "3", "4", "5", "6", "7", "8", "9"];

/// Combined histogram of one round, stamped with the round's scheduled time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoundReport {
    unix_seconds: u64,
    counts: DigitHistogram,
    include_total: bool,
}

/// `{"time": "<unixSeconds>", "counts": {"0": n0, ..., "9": n9}, "total": t}`
#[derive(Serialize)]
struct ReportJson {
    time: String,
    counts: BTreeMap<&'static str, u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    total: Option<u64>,
}

impl RoundReport {
    pub fn new(nominal: SystemTime, counts: DigitHistogram, include_total: bool) -> Self {
        let unix_seconds = nominal
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        Self {
            unix_seconds,
            counts,
            include_total,
        }
    }

    pub fn unix_seconds(&self) -> u64 {
        self.unix_seconds
    }

    pub fn counts(&self) -> &DigitHistogram {
        &self.counts
    }

    pub fn total(&self) -> u64 {
        self.counts.total()
    }

    /// One-line JSON rendering of the report.
    pub fn to_json(&self) -> serde_json::Result<String> {
        let counts = DIGIT_KEYS
            .iter()
            .zip(self.counts.buckets().iter())
            .map(|(&key, &count)| (key, count))
            .collect();
        serde_json::to_string(&ReportJson {
            time: self.unix_seconds.to_string(),
            counts,
            total: self.include_total.then(|| self.counts.total()),
        })
    }
}
