//! Pipeline configuration.
//!
//! [`ConfigBuilder`] carries the defaults the command line does not expose
//! (1 s round interval, 1 s generate interval, 1024-slot buffers) and
//! validates everything in [`build`](ConfigBuilder::build), before any
//! process or thread exists.

use std::time::Duration;

use crate::error::ConfigError;

pub const DEFAULT_ROUND_INTERVAL: Duration = Duration::from_millis(1000);
pub const DEFAULT_GENERATE_INTERVAL: Duration = Duration::from_millis(1000);
pub const DEFAULT_BUFFER_CAPACITY: usize = 1024;
/// Smallest generate interval a worker can be started with.
pub const MIN_GENERATE_INTERVAL: Duration = Duration::from_millis(1);

/// Supervisor-wide configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    workers: usize,
    slots_per_worker: usize,
    round_interval: Duration,
    generate_interval: Duration,
    buffer_capacity: usize,
    debug_totals: bool,
}

impl Config {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn slots_per_worker(&self) -> usize {
        self.slots_per_worker
    }

    pub fn round_interval(&self) -> Duration {
        self.round_interval
    }

    pub fn generate_interval(&self) -> Duration {
        self.generate_interval
    }

    pub fn buffer_capacity(&self) -> usize {
        self.buffer_capacity
    }

    /// Whether round reports carry a `"total"` field.
    pub fn debug_totals(&self) -> bool {
        self.debug_totals
    }

    /// Count messages the supervisor waits for each round: one per generator slot.
    pub fn expected_reports(&self) -> usize {
        self.workers * self.slots_per_worker
    }

    /// The configuration handed to worker number `process_id`.
    pub fn worker_config(&self, process_id: u32) -> WorkerConfig {
        WorkerConfig {
            process_id,
            slots: self.slots_per_worker,
            generate_interval: self.generate_interval,
            buffer_capacity: self.buffer_capacity,
        }
    }
}

pub struct ConfigBuilder {
    workers: usize,
    slots_per_worker: usize,
    round_interval: Duration,
    generate_interval: Duration,
    buffer_capacity: usize,
    debug_totals: bool,
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self {
            workers: 1,
            slots_per_worker: 1,
            round_interval: DEFAULT_ROUND_INTERVAL,
            generate_interval: DEFAULT_GENERATE_INTERVAL,
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            debug_totals: false,
        }
    }
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_slots_per_worker(mut self, slots: usize) -> Self {
        self.slots_per_worker = slots;
        self
    }

    pub fn with_round_interval(mut self, interval: Duration) -> Self {
        self.round_interval = interval;
        self
    }

    pub fn with_generate_interval(mut self, interval: Duration) -> Self {
        self.generate_interval = interval;
        self
    }

    pub fn with_buffer_capacity(mut self, capacity: usize) -> Self {
        self.buffer_capacity = capacity;
        self
    }

    pub fn with_debug_totals(mut self, enabled: bool) -> Self {
        self.debug_totals = enabled;
        self
    }

    pub fn build(self) -> Result<Config, ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::NoWorkers);
        }
        if self.slots_per_worker == 0 {
            return Err(ConfigError::NoSlots);
        }
        if self.round_interval.is_zero() {
            return Err(ConfigError::ZeroInterval("round"));
        }
        if self.generate_interval.is_zero() {
            return Err(ConfigError::ZeroInterval("generate"));
        }
        // workers receive it in whole milliseconds
        if self.generate_interval < MIN_GENERATE_INTERVAL {
            return Err(ConfigError::SubMillisecondInterval("generate"));
        }
        if self.buffer_capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        Ok(Config {
            workers: self.workers,
            slots_per_worker: self.slots_per_worker,
            round_interval: self.round_interval,
            generate_interval: self.generate_interval,
            buffer_capacity: self.buffer_capacity,
            debug_totals: self.debug_totals,
        })
    }
}

/// What one worker needs to know about itself.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkerConfig {
    pub process_id: u32,
    pub slots: usize,
    pub generate_interval: Duration,
    pub buffer_capacity: usize,
}

impl WorkerConfig {
    /// Positional arguments for a worker process, in the order
    /// [`from_args`](Self::from_args) reads them.
    pub fn to_args(&self) -> Vec<String> {
        vec![
            self.process_id.to_string(),
            self.slots.to_string(),
            self.generate_interval.as_millis().to_string(),
            self.buffer_capacity.to_string(),
        ]
    }

    /// Parse `<processId> <slots> <generateIntervalMs> <bufferCapacity>`.
    pub fn from_args<S: AsRef<str>>(args: &[S]) -> Result<Self, ConfigError> {
        fn arg<T: std::str::FromStr, S: AsRef<str>>(
            args: &[S],
            index: usize,
            name: &'static str,
        ) -> Result<T, ConfigError> {
            let raw = args.get(index).map(|s| s.as_ref()).unwrap_or("");
            raw.parse().map_err(|_| ConfigError::InvalidArgument {
                name,
                value: raw.to_string(),
            })
        }

        let config = WorkerConfig {
            process_id: arg(args, 0, "processId")?,
            slots: arg(args, 1, "slots")?,
            generate_interval: Duration::from_millis(arg(args, 2, "generateIntervalMs")?),
            buffer_capacity: arg(args, 3, "bufferCapacity")?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.slots == 0 {
            return Err(ConfigError::NoSlots);
        }
        if self.generate_interval.is_zero() {
            return Err(ConfigError::ZeroInterval("generate"));
        }
        if self.generate_interval < MIN_GENERATE_INTERVAL {
            return Err(ConfigError::SubMillisecondInterval("generate"));
        }
        if self.buffer_capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        Ok(())
    }
}
