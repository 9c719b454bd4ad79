use std::io::{self, BufRead, BufReader};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant, SystemTime};

use tracing::{debug, info, trace, warn};

use super::launcher::{WorkerExit, WorkerLauncher, WorkerLink};
use super::report::RoundReport;
use crate::config::Config;
use crate::Core::{FlushQueue, RoundCounter, StopSignal};
use crate::Wire::Structs::{Command, DigitHistogram, Message};
use crate::Wire::{decode, MessageSink};

// How often the readiness wait looks at the stop signal.
const READY_POLL: Duration = Duration::from_millis(50);

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SupervisorState {
    Spawning,
    AwaitingReady,
    Running,
    Stopped,
}

/// Supervisor-side view of one worker.
struct WorkerHandle {
    process_id: u32,
    commands: Option<MessageSink>,
    exit: Option<Box<dyn WorkerExit>>,
    reader: Option<JoinHandle<()>>,
}

/// Spawns the workers, runs the periodic count rounds and combines the results.
///
/// The queue of raw `COUNT` lines and both barriers are owned here and lent
/// to the per-worker [`ReportReader`] threads that feed them.
///
/// A round waits until one `COUNT` has arrived for every generator slot of
/// every worker. There is no round timeout: a worker that dies mid-round
/// stalls that round.
pub struct Supervisor {
    config: Config,
    state: SupervisorState,
    workers: Vec<WorkerHandle>,
    queue: Arc<FlushQueue<String>>,
    ready: Arc<RoundCounter>,
    round: Arc<RoundCounter>,
    stop: Arc<StopSignal>,
    shutting_down: Arc<AtomicBool>,
}

impl Supervisor {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            state: SupervisorState::Spawning,
            workers: Vec::new(),
            queue: Arc::new(FlushQueue::new()),
            ready: Arc::new(RoundCounter::new()),
            round: Arc::new(RoundCounter::new()),
            stop: Arc::new(StopSignal::new()),
            shutting_down: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn state(&self) -> SupervisorState {
        self.state
    }

    /// The signal that ends [`run`](Self::run). Triggering it is how signal
    /// handlers and worker EOFs request termination.
    pub fn stop_signal(&self) -> Arc<StopSignal> {
        Arc::clone(&self.stop)
    }

    /// Launch every worker and start a reader thread on each one's reports.
    pub fn spawn_workers<L: WorkerLauncher + ?Sized>(&mut self, launcher: &mut L) -> io::Result<()> {
        for process_id in 0..self.config.workers() as u32 {
            let link = launcher.launch(&self.config.worker_config(process_id))?;
            self.attach(link)?;
        }
        self.state = SupervisorState::AwaitingReady;
        info!(workers = self.workers.len(), "workers spawned");
        Ok(())
    }

    fn attach(&mut self, link: WorkerLink) -> io::Result<()> {
        let reader = ReportReader {
            process_id: link.process_id,
            queue: Arc::clone(&self.queue),
            ready: Arc::clone(&self.ready),
            round: Arc::clone(&self.round),
            stop: Arc::clone(&self.stop),
            shutting_down: Arc::clone(&self.shutting_down),
        };
        let reports = link.reports;
        let handle = thread::Builder::new()
            .name(format!("reader-{}", link.process_id))
            .spawn(move || reader.run(BufReader::new(reports)))?;

        self.workers.push(WorkerHandle {
            process_id: link.process_id,
            commands: Some(MessageSink::new(link.commands)),
            exit: Some(link.exit),
            reader: Some(handle),
        });
        Ok(())
    }

    /// Block until every worker has sent `READY` or a stop is requested.
    ///
    /// Returns `true` once every worker is ready.
    pub fn await_ready(&mut self) -> bool {
        let workers = self.config.workers();
        while !self.ready.await_at_least_for(workers, READY_POLL) {
            if self.stop.is_triggered() {
                warn!(ready = self.ready.get(), workers, "stop requested before every worker was ready");
                return false;
            }
        }
        info!(workers, "all workers ready");
        true
    }

    /// Wait for readiness if needed, then broadcast `START`.
    ///
    /// Returns `false`, without broadcasting, if a stop was requested first.
    pub fn start(&mut self) -> bool {
        if self.state == SupervisorState::AwaitingReady && !self.await_ready() {
            return false;
        }
        self.broadcast(Command::Start);
        self.state = SupervisorState::Running;
        true
    }

    /// Run one counting round and return the combined report.
    ///
    /// `nominal` is the tick the round was scheduled for; it becomes the
    /// report's timestamp.
    pub fn run_round(&self, nominal: SystemTime) -> RoundReport {
        self.round.reset();
        self.broadcast(Command::Count);

        let expected = self.config.expected_reports();
        self.round.await_at_least(expected);

        let mut counts = DigitHistogram::new();
        let mut combined = 0usize;
        for line in self.queue.drain_all() {
            match decode(&line) {
                Ok(Some(Message::Count { histogram, .. })) => {
                    counts.merge(&histogram);
                    combined += 1;
                }
                Ok(_) => warn!("non-COUNT line in the aggregation queue: {line:?}"),
                Err(e) => warn!(label = e.as_label(), "queued COUNT line skipped: {e}"),
            }
        }
        debug!(expected, combined, total = counts.total(), "round complete");

        RoundReport::new(nominal, counts, self.config.debug_totals())
    }

    /// Start the workers and run rounds until the stop signal fires, then shut down.
    ///
    /// Rounds run on a dedicated scheduler thread at the configured interval.
    /// The stop signal is only observed between rounds, so a round that has
    /// started always completes. A stop that arrives while waiting for `READY`
    /// goes straight to shutdown.
    pub fn run<F>(&mut self, on_report: F) -> io::Result<()>
    where
        F: FnMut(&RoundReport) + Send,
    {
        if !self.start() {
            return self.shutdown();
        }

        let this = &*self;
        let scheduled = thread::scope(|s| -> io::Result<()> {
            let scheduler = thread::Builder::new()
                .name("round-scheduler".into())
                .spawn_scoped(s, move || this.schedule_rounds(on_report))?;
            this.stop.wait();
            info!("stop requested");
            scheduler
                .join()
                .map_err(|_| io::Error::new(io::ErrorKind::Other, "round scheduler panicked"))
        });

        let stopped = self.shutdown();
        scheduled.and(stopped)
    }

    fn schedule_rounds<F: FnMut(&RoundReport)>(&self, mut on_report: F) {
        let interval = self.config.round_interval();
        let started = Instant::now();
        let started_wall = SystemTime::now();

        for tick in 1u32.. {
            let offset = interval * tick;
            if self.stop.wait_until(started + offset) {
                break;
            }
            let report = self.run_round(started_wall + offset);
            on_report(&report);
        }
    }

    /// Send `cmd` to every worker still connected. Failures are logged and skipped.
    pub fn broadcast(&self, cmd: Command) {
        let message = Message::Command(cmd);
        for worker in &self.workers {
            if let Some(commands) = &worker.commands {
                if let Err(e) = commands.send(&message) {
                    warn!(process = worker.process_id, "could not send {}: {e}", cmd.as_str());
                }
            }
        }
    }

    /// Broadcast `STOP`, wait for every worker to exit, then join the readers.
    ///
    /// Idempotent. Returns the first error met while waiting for a worker.
    pub fn shutdown(&mut self) -> io::Result<()> {
        if self.state == SupervisorState::Stopped {
            return Ok(());
        }
        self.shutting_down.store(true, Ordering::Release);
        self.stop.trigger();

        self.broadcast(Command::Stop);
        for worker in &mut self.workers {
            // closing stdin is the second way a worker learns to stop
            worker.commands.take();
        }

        let mut first_error = None;
        for worker in &mut self.workers {
            if let Some(exit) = worker.exit.take() {
                if let Err(e) = exit.wait() {
                    warn!(process = worker.process_id, "waiting for worker failed: {e}");
                    first_error.get_or_insert(e);
                }
            }
        }
        for worker in &mut self.workers {
            if let Some(reader) = worker.reader.take() {
                if reader.join().is_err() {
                    warn!(process = worker.process_id, "reader thread panicked");
                }
            }
        }

        self.state = SupervisorState::Stopped;
        info!("all workers stopped");
        first_error.map_or(Ok(()), Err)
    }
}

impl Drop for Supervisor {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            warn!("shutdown on drop: {e}");
        }
    }
}

/// Reads one worker's outbound stream and feeds the supervisor's shared state.
///
/// `READY` bumps the readiness barrier; `COUNT` lines are queued raw and then
/// bump the round barrier; `LOG` is re-emitted through `tracing`. Unknown lines
/// are ignored and malformed ones logged and skipped. End of stream outside of
/// shutdown requests a stop.
pub struct ReportReader {
    pub process_id: u32,
    pub queue: Arc<FlushQueue<String>>,
    pub ready: Arc<RoundCounter>,
    pub round: Arc<RoundCounter>,
    pub stop: Arc<StopSignal>,
    pub shutting_down: Arc<AtomicBool>,
}

impl ReportReader {
    pub fn run<R: BufRead>(self, reports: R) {
        for line in reports.lines() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    warn!(process = self.process_id, "report stream failed: {e}");
                    break;
                }
            };

            match decode(&line) {
                Ok(Some(Message::Ready { process_id })) => {
                    debug!(process = process_id, "worker ready");
                    self.ready.increment();
                }
                Ok(Some(Message::Count { .. })) => {
                    // queued before counted, so the round sees it once the barrier opens
                    self.queue.append(line);
                    self.round.increment();
                }
                Ok(Some(Message::Log {
                    process_id,
                    thread_id,
                    text,
                })) => debug!(process = process_id, thread = ?thread_id, "{text}"),
                Ok(Some(Message::Command(cmd))) => {
                    debug!(process = self.process_id, "ignoring {} from a worker", cmd.as_str())
                }
                Ok(None) => trace!(process = self.process_id, "ignoring {line:?}"),
                Err(e) => warn!(
                    process = self.process_id,
                    label = e.as_label(),
                    "malformed line {line:?} skipped: {e}"
                ),
            }
        }

        if self.shutting_down.load(Ordering::Acquire) {
            debug!(process = self.process_id, "report stream closed");
        } else {
            info!(process = self.process_id, "worker closed its stream; requesting shutdown");
            self.stop.trigger();
        }
    }
}

impl std::fmt::Debug for Supervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Supervisor")
            .field("state", &self.state)
            .field("workers", &self.workers.len())
            .field("queue", &self.queue)
            .field("ready", &self.ready)
            .field("round", &self.round)
            .finish()
    }
}
