use std::io::{self, BufReader, Read, Write};
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::thread::{self, JoinHandle};

use tracing::{debug, warn};

use super::pipe::pipe;
use super::worker::Worker;
use crate::config::WorkerConfig;
use crate::Wire::MessageSink;

/// First argument that switches the binary into worker mode.
pub const WORKER_SUBCOMMAND: &str = "worker";

/// A freshly started worker, seen from the supervisor.
pub struct WorkerLink {
    pub process_id: u32,
    /// Supervisor -> worker commands (the worker's stdin).
    pub commands: Box<dyn Write + Send>,
    /// Worker -> supervisor messages (the worker's stdout).
    pub reports: Box<dyn Read + Send>,
    pub exit: Box<dyn WorkerExit>,
}

/// Waits for a worker to terminate.
pub trait WorkerExit: Send + Sync {
    fn wait(self: Box<Self>) -> io::Result<()>;
}

/// Starts workers and hands back their streams.
pub trait WorkerLauncher {
    fn launch(&mut self, config: &WorkerConfig) -> io::Result<WorkerLink>;
}

/// Runs every worker as a child process of `program` (normally this binary).
pub struct ProcessLauncher {
    program: PathBuf,
}

impl ProcessLauncher {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Re-execute the running binary in worker mode.
    pub fn current_exe() -> io::Result<Self> {
        Ok(Self::new(std::env::current_exe()?))
    }
}

impl WorkerLauncher for ProcessLauncher {
    fn launch(&mut self, config: &WorkerConfig) -> io::Result<WorkerLink> {
        let mut child = Command::new(&self.program)
            .arg(WORKER_SUBCOMMAND)
            .args(config.to_args())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| {
                io::Error::new(
                    e.kind(),
                    format!(
                        "Failed to spawn worker {}:\n\
                    ├─ Program: {}\n\
                    ╰─ Error: {e}",
                        config.process_id,
                        self.program.display()
                    ),
                )
            })?;

        let missing = |what: &str| io::Error::new(io::ErrorKind::BrokenPipe, format!("worker {what} not piped"));
        let stdin = child.stdin.take().ok_or_else(|| missing("stdin"))?;
        let stdout = child.stdout.take().ok_or_else(|| missing("stdout"))?;
        debug!(process = config.process_id, pid = child.id(), "worker process spawned");

        Ok(WorkerLink {
            process_id: config.process_id,
            commands: Box::new(stdin),
            reports: Box::new(stdout),
            exit: Box::new(ChildExit(child)),
        })
    }
}

struct ChildExit(Child);

impl WorkerExit for ChildExit {
    fn wait(mut self: Box<Self>) -> io::Result<()> {
        let status = self.0.wait()?;
        if !status.success() {
            warn!(pid = self.0.id(), %status, "worker exited abnormally");
        }
        Ok(())
    }
}

type WorkerSetup = Box<dyn FnMut(&mut Worker) + Send>;

/// Runs every worker on a thread of the current process, over in-memory pipes.
///
/// The protocol is exactly the one spoken over a child's stdin/stdout.
#[derive(Default)]
pub struct InProcessLauncher {
    setup: Option<WorkerSetup>,
}

impl InProcessLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `setup` on every worker before it starts serving commands.
    pub fn with_setup(mut self, setup: impl FnMut(&mut Worker) + Send + 'static) -> Self {
        self.setup = Some(Box::new(setup));
        self
    }
}

impl WorkerLauncher for InProcessLauncher {
    fn launch(&mut self, config: &WorkerConfig) -> io::Result<WorkerLink> {
        let (commands, inbound) = pipe();
        let (outbound, reports) = pipe();

        let mut worker = Worker::new(config.clone(), MessageSink::new(outbound))?;
        if let Some(setup) = self.setup.as_mut() {
            setup(&mut worker);
        }

        let handle = thread::Builder::new()
            .name(format!("worker-{}", config.process_id))
            .spawn(move || worker.run(BufReader::new(inbound)))?;

        Ok(WorkerLink {
            process_id: config.process_id,
            commands: Box::new(commands),
            reports: Box::new(reports),
            exit: Box::new(ThreadExit(handle)),
        })
    }
}

struct ThreadExit(JoinHandle<io::Result<()>>);

impl WorkerExit for ThreadExit {
    fn wait(self: Box<Self>) -> io::Result<()> {
        self.0
            .join()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "worker thread panicked"))?
    }
}
