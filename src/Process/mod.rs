mod launcher;
mod pipe;
mod report;
mod supervisor;
mod tasks;
mod worker;

pub use launcher::{
    InProcessLauncher, ProcessLauncher, WorkerExit, WorkerLauncher, WorkerLink, WORKER_SUBCOMMAND,
};
pub use pipe::{pipe, PipeReader, PipeWriter};
pub use report::RoundReport;
pub use supervisor::{ReportReader, Supervisor, SupervisorState};
pub use tasks::{next_deadline, CounterTask, GeneratorTask};
pub use worker::{Worker, WorkerState};
