use dmxp_tally::Process::{ProcessLauncher, Supervisor, Worker, WORKER_SUBCOMMAND};
use dmxp_tally::Wire::MessageSink;
use dmxp_tally::{Config, ConfigError, WorkerConfig};
use std::env;
use std::io::{self, Write};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

fn main() {
    // stdout carries the protocol (worker) or the reports (supervisor)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .with_thread_names(true)
        .init();

    let args: Vec<String> = env::args().collect();
    let result = match args.get(1).map(String::as_str) {
        Some(WORKER_SUBCOMMAND) => run_worker(&args[2..]),
        _ => run_supervisor(&args),
    };

    if let Err(e) = result {
        error!("{e}");
        std::process::exit(1);
    }
}

fn run_supervisor(args: &[String]) -> io::Result<()> {
    if args.len() < 3 {
        eprintln!(
            "Usage: {} <child_process_count> <threads_per_child> [--debug]",
            args.first().map(String::as_str).unwrap_or("dmxp-tally")
        );
        std::process::exit(1);
    }

    let workers = parse_count(&args[1], "child_process_count")?;
    let slots = parse_count(&args[2], "threads_per_child")?;
    let debug_totals = args[3..].iter().any(|arg| arg == "--debug");

    let config = Config::builder()
        .with_workers(workers)
        .with_slots_per_worker(slots)
        .with_debug_totals(debug_totals)
        .build()?;

    let mut supervisor = Supervisor::new(config);
    let stop = supervisor.stop_signal();

    // Handle Ctrl+C / SIGTERM: finish the current round, then stop the workers
    ctrlc::set_handler(move || stop.trigger())
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;

    info!(workers, slots, "starting supervisor");
    let mut launcher = ProcessLauncher::current_exe()?;
    supervisor.spawn_workers(&mut launcher)?;

    let stdout = io::stdout();
    supervisor.run(move |report| match report.to_json() {
        Ok(json) => {
            let mut out = stdout.lock();
            if let Err(e) = writeln!(out, "{json}").and_then(|_| out.flush()) {
                error!("could not write report: {e}");
            }
        }
        Err(e) => error!("could not encode report: {e}"),
    })
}

fn run_worker(args: &[String]) -> io::Result<()> {
    let config = WorkerConfig::from_args(args)?;

    // A terminal Ctrl+C reaches the whole process group; the supervisor decides when we stop.
    ctrlc::set_handler(|| debug!("interrupt ignored, waiting for STOP"))
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;

    let worker = Worker::new(config, MessageSink::new(io::stdout()))?;
    worker.run(io::stdin().lock())
}

fn parse_count(raw: &str, name: &'static str) -> Result<usize, ConfigError> {
    raw.parse().map_err(|_| ConfigError::InvalidArgument {
        name,
        value: raw.to_string(),
    })
}
