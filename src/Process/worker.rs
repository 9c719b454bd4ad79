use std::io::{self, BufRead};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::{debug, info, warn};

use super::tasks::{CounterTask, GeneratorTask};
use crate::config::WorkerConfig;
use crate::Core::StopSignal;
use crate::SPSC::{ChannelBuilder, Consumer, Producer};
use crate::Wire::Structs::{Command, DigitHistogram, Message};
use crate::Wire::{decode, MessageSink};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum WorkerState {
    Idle,
    Running,
    /// Terminal.
    Stopped,
}

/// One generator slot: the channel between a generator and its counter.
///
/// The producer half moves to the generator thread on Start; the consumer
/// half stays here and is lent to one counter task per round.
struct Slot {
    producer: Option<Producer<u8>>,
    consumer: Consumer<u8>,
}

/// A worker process: N generator slots driven by commands on its inbound stream.
///
/// The worker announces itself with one `READY` line, then handles
/// `START`, `COUNT` and `STOP` until told to stop or until the inbound stream
/// closes. Each `COUNT` produces one `COUNT` line per slot; the worker does not
/// aggregate its own slots.
pub struct Worker {
    config: WorkerConfig,
    state: WorkerState,
    slots: Vec<Slot>,
    sink: MessageSink,
    stop: Arc<StopSignal>,
    generators: Vec<JoinHandle<()>>,
}

impl Worker {
    pub fn new(config: WorkerConfig, sink: MessageSink) -> io::Result<Self> {
        config.validate()?;

        let mut slots = Vec::with_capacity(config.slots);
        for _ in 0..config.slots {
            let (producer, consumer) = ChannelBuilder::new()
                .with_capacity(config.buffer_capacity)
                .build()?;
            slots.push(Slot {
                producer: Some(producer),
                consumer,
            });
        }

        Ok(Self {
            config,
            state: WorkerState::Idle,
            slots,
            sink,
            stop: Arc::new(StopSignal::new()),
            generators: Vec::new(),
        })
    }

    pub fn process_id(&self) -> u32 {
        self.config.process_id
    }

    pub fn state(&self) -> WorkerState {
        self.state
    }

    /// Write `digits` straight into `slot`'s channel, as its generator would.
    ///
    /// Only possible before Start, while the worker still holds the producer.
    /// Returns how many digits were stored; the rest were dropped as overflow.
    pub fn seed(&mut self, slot: usize, digits: &[u8]) -> usize {
        let Some(producer) = self.slots.get_mut(slot).and_then(|s| s.producer.as_mut()) else {
            return 0;
        };
        digits
            .iter()
            .filter(|&&digit| producer.try_write(digit))
            .count()
    }

    /// Announce readiness, then serve commands from `inbound` until Stop or EOF.
    pub fn run<R: BufRead>(mut self, inbound: R) -> io::Result<()> {
        self.sink.send(&Message::Ready {
            process_id: self.process_id(),
        })?;
        info!(process = self.process_id(), slots = self.slots.len(), "worker ready");

        for line in inbound.lines() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    warn!(process = self.process_id(), "inbound stream failed: {e}");
                    break;
                }
            };

            match decode(&line) {
                Ok(Some(Message::Command(cmd))) => match self.handle(cmd) {
                    Ok(WorkerState::Stopped) => break,
                    Ok(_) => {}
                    Err(e) => {
                        // The supervisor is gone if it cannot hear us.
                        warn!(process = self.process_id(), "outbound stream failed: {e}");
                        break;
                    }
                },
                Ok(Some(other)) => debug!(process = self.process_id(), "ignoring {other:?}"),
                Ok(None) => {}
                Err(e) => {
                    warn!(process = self.process_id(), label = e.as_label(), "malformed command {line:?}: {e}");
                    self.log(&format!("malformed command skipped: {e}"));
                }
            }
        }

        if self.state != WorkerState::Stopped {
            info!(process = self.process_id(), "inbound stream closed");
        }
        self.shutdown();
        Ok(())
    }

    /// Apply one command and return the resulting state.
    pub fn handle(&mut self, cmd: Command) -> io::Result<WorkerState> {
        match (cmd, self.state) {
            (_, WorkerState::Stopped) => {}
            (Command::Start, WorkerState::Idle) => self.start()?,
            (Command::Start, WorkerState::Running) => {
                debug!(process = self.process_id(), "already running");
            }
            (Command::Count, WorkerState::Running) => {
                self.count()?;
            }
            (Command::Count, WorkerState::Idle) => {
                self.log("COUNT ignored before START");
            }
            (Command::Stop, _) => {
                info!(process = self.process_id(), "received STOP");
                self.shutdown();
            }
        }
        Ok(self.state)
    }

    fn start(&mut self) -> io::Result<()> {
        let process_id = self.process_id();
        for (thread_id, slot) in self.slots.iter_mut().enumerate() {
            let Some(producer) = slot.producer.take() else {
                continue;
            };
            let task = GeneratorTask::new(
                process_id,
                thread_id as u32,
                self.config.generate_interval,
                producer,
                self.sink.clone(),
                Arc::clone(&self.stop),
            );
            self.generators.push(task.spawn()?);
        }
        self.state = WorkerState::Running;
        info!(process = process_id, generators = self.generators.len(), "worker started");
        Ok(())
    }

    /// One counter task per slot, all running at once.
    fn count(&mut self) -> io::Result<Vec<DigitHistogram>> {
        let process_id = self.process_id();
        let sink = &self.sink;

        let results: Vec<io::Result<DigitHistogram>> = thread::scope(|s| {
            let handles: Vec<_> = self
                .slots
                .iter_mut()
                .enumerate()
                .map(|(thread_id, slot)| {
                    let consumer = &mut slot.consumer;
                    s.spawn(move || {
                        CounterTask::new(process_id, thread_id as u32, consumer, sink).run()
                    })
                })
                .collect();

            handles
                .into_iter()
                .map(|handle| {
                    handle.join().unwrap_or_else(|_| {
                        Err(io::Error::new(io::ErrorKind::Other, "counter task panicked"))
                    })
                })
                .collect()
        });

        results.into_iter().collect()
    }

    /// Stop generators and wait for them. Idempotent.
    fn shutdown(&mut self) {
        self.stop.trigger();
        for generator in self.generators.drain(..) {
            if generator.join().is_err() {
                warn!(process = self.config.process_id, "generator thread panicked");
            }
        }
        self.state = WorkerState::Stopped;
    }

    fn log(&self, text: &str) {
        if let Err(e) = self.sink.send(&Message::log(self.process_id(), None, text)) {
            debug!(process = self.process_id(), "log not delivered: {e}");
        }
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        self.shutdown();
    }
}
