use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::Core::StopSignal;
use crate::SPSC::{Consumer, Producer};
use crate::Wire::Structs::{DigitHistogram, Message};
use crate::Wire::MessageSink;

/// Periodically writes one random digit into its slot's channel.
///
/// A full channel drops the digit and reports it with a `LOG` line; the
/// generator keeps going. The loop sleeps on the worker's [`StopSignal`], so
/// once a stop is requested no further digit is written.
pub struct GeneratorTask {
    process_id: u32,
    thread_id: u32,
    interval: Duration,
    producer: Producer<u8>,
    sink: MessageSink,
    stop: Arc<StopSignal>,
    rng: fastrand::Rng,
}

impl GeneratorTask {
    pub fn new(
        process_id: u32,
        thread_id: u32,
        interval: Duration,
        producer: Producer<u8>,
        sink: MessageSink,
        stop: Arc<StopSignal>,
    ) -> Self {
        Self {
            process_id,
            thread_id,
            interval,
            producer,
            sink,
            stop,
            rng: fastrand::Rng::new(),
        }
    }

    /// Use a fixed seed instead of a random one.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = fastrand::Rng::with_seed(seed);
        self
    }

    /// Run the generator on its own named thread.
    pub fn spawn(self) -> io::Result<JoinHandle<()>> {
        thread::Builder::new()
            .name(format!("gen-{}-{}", self.process_id, self.thread_id))
            .spawn(move || self.run())
    }

    /// Tick every `interval` until the stop signal fires.
    pub fn run(mut self) {
        self.log("generator started");

        let mut next = Instant::now() + self.interval;
        while !self.stop.wait_until(next) {
            self.tick();
            next = next_deadline(next, self.interval, Instant::now());
        }
        debug!(process = self.process_id, thread = self.thread_id, "generator stopped");
    }

    /// Produce one digit. Returns `false` if it was dropped.
    pub fn tick(&mut self) -> bool {
        let digit = self.rng.u8(0..10);
        if self.producer.try_write(digit) {
            return true;
        }

        warn!(
            process = self.process_id,
            thread = self.thread_id,
            dropped = self.producer.overflow_count(),
            "buffer full, dropped digit {digit}"
        );
        self.log(&format!("buffer full, dropped digit {digit}"));
        false
    }

    fn log(&self, text: &str) {
        let message = Message::log(self.process_id, Some(self.thread_id), text);
        if let Err(e) = self.sink.send(&message) {
            debug!(process = self.process_id, thread = self.thread_id, "log not delivered: {e}");
        }
    }
}

/// The deadline after `scheduled` for a task ticking every `interval`.
///
/// Stays on the original grid while on time. If `now` is already past the
/// following tick, the missed ticks are skipped and the grid restarts from
/// `now` instead of firing them back to back.
pub fn next_deadline(scheduled: Instant, interval: Duration, now: Instant) -> Instant {
    let next = scheduled + interval;
    if next <= now {
        now + interval
    } else {
        next
    }
}

/// Drains one slot's channel and reports its histogram.
///
/// Exactly one `COUNT` line is sent per run, even when nothing was pending,
/// because the supervisor waits for one report per slot every round.
pub struct CounterTask<'a> {
    process_id: u32,
    thread_id: u32,
    consumer: &'a mut Consumer<u8>,
    sink: &'a MessageSink,
}

impl<'a> CounterTask<'a> {
    pub fn new(
        process_id: u32,
        thread_id: u32,
        consumer: &'a mut Consumer<u8>,
        sink: &'a MessageSink,
    ) -> Self {
        Self {
            process_id,
            thread_id,
            consumer,
            sink,
        }
    }

    pub fn run(self) -> io::Result<DigitHistogram> {
        let digits = self.consumer.drain_all();
        let histogram = DigitHistogram::from_digits(&digits);
        debug!(
            process = self.process_id,
            thread = self.thread_id,
            total = histogram.total(),
            "slot counted"
        );
        self.sink.send(&Message::Count {
            process_id: self.process_id,
            histogram,
        })?;
        Ok(histogram)
    }
}
