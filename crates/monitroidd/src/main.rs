//! monitroidd - background system metrics gatherer daemon.
//!
//! Samples CPU, memory and disk usage on independent intervals and serves the
//! latest results as a JSON document to every client connecting to its Unix
//! socket.

mod pidfile;
mod server;

use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tracing::{Level, debug, error, info, trace, warn};
use tracing_subscriber::EnvFilter;

use monitroid_core::gatherer::{AnyGatherer, Cpu, Disk, Ram};
use monitroid_core::supervisor::{GatherResult, Outcome, Supervisor};
use monitroid_core::util::parse_interval;
use monitroid_core::{DEFAULT_PID_FILE, DEFAULT_SOCKET_PATH};

use pidfile::PidFile;

/// Background system metrics gatherer daemon.
#[derive(Parser, Debug)]
#[command(
    name = "monitroidd",
    about = "Background system metrics gatherer daemon",
    version = monitroid_core::VERSION
)]
struct Args {
    /// Unix socket serving JSON snapshots.
    #[arg(long, default_value = DEFAULT_SOCKET_PATH, env = "MONITROID_SOCKET")]
    socket: PathBuf,

    /// PID file guarding against a second instance.
    #[arg(long, default_value = DEFAULT_PID_FILE, env = "MONITROID_PID_FILE")]
    pid_file: PathBuf,

    /// Path to /proc filesystem.
    #[arg(long, default_value = "/proc")]
    proc_path: PathBuf,

    /// Mount point whose usage the disk gatherer reports.
    #[arg(long, default_value = "/")]
    disk_path: PathBuf,

    /// CPU sampling interval (e.g. "500ms", "1s", "1m").
    #[arg(long, default_value = "1s", value_parser = parse_interval)]
    cpu_interval: Duration,

    /// Memory sampling interval.
    #[arg(long, default_value = "2s", value_parser = parse_interval)]
    ram_interval: Duration,

    /// Disk sampling interval.
    #[arg(long, default_value = "10s", value_parser = parse_interval)]
    disk_interval: Duration,

    /// Increase logging verbosity (-v for debug, -vv for trace). Default is info level.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode - only show errors.
    #[arg(short, long)]
    quiet: bool,
}

/// Initializes the tracing subscriber with the appropriate log level.
fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let mut filter = EnvFilter::from_default_env();
    for target in ["monitroidd", "monitroid_core"] {
        match format!("{}={}", target, level).parse() {
            Ok(directive) => filter = filter.add_directive(directive),
            Err(e) => eprintln!("invalid log directive for {}: {}", target, e),
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Logs every committed result.
fn log_result(name: &str, gatherer: &dyn AnyGatherer, result: &GatherResult) {
    match result.outcome() {
        Outcome::Success(value) => {
            debug!(gatherer = name, generation = result.generation(), "sample collected");
            trace!(gatherer = name, payload = %value, "sample payload");
        }
        Outcome::Failure(err) => warn!(
            gatherer = name,
            kind = gatherer.type_name(),
            generation = result.generation(),
            error = %err,
            "sample failed"
        ),
        Outcome::NotReady => {}
    }
}

fn main() {
    let args = Args::parse();

    init_logging(args.verbose, args.quiet);

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("failed to build tokio runtime: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = runtime.block_on(run(args)) {
        error!("monitroidd finished with error: {}", e);
        process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    info!("monitroidd {} starting", monitroid_core::VERSION);
    info!(
        "Config: socket={}, pid_file={}, proc={}, disk={}",
        args.socket.display(),
        args.pid_file.display(),
        args.proc_path.display(),
        args.disk_path.display()
    );

    // Held for the whole run: a dropped sender would read as a shutdown.
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let shutdown_tx = Arc::new(shutdown_tx);
    let handler_tx = shutdown_tx.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        handler_tx.send_replace(true);
    }) {
        warn!("Failed to set signal handler: {}", e);
    }

    let pid_file = PidFile::acquire(&args.pid_file)?;

    let result = supervise(&args, shutdown_rx).await;
    drop(shutdown_tx);

    if let Err(e) = pid_file.release() {
        // Report the first error; a failed run matters more than cleanup.
        if result.is_ok() {
            return Err(e.into());
        }
        warn!("{}", e);
    }

    result
}

async fn supervise(
    args: &Args,
    mut shutdown: watch::Receiver<bool>,
) -> Result<(), Box<dyn std::error::Error>> {
    let supervisor = Arc::new(Supervisor::new(Handle::current()));
    supervisor.observe(log_result);

    supervisor.register("cpu", args.cpu_interval, Cpu::new(&args.proc_path))?;
    supervisor.register("ram", args.ram_interval, Ram::new(&args.proc_path))?;
    supervisor.register("disk", args.disk_interval, Disk::new(&args.disk_path))?;

    let listener = match server::bind(&args.socket) {
        Ok(listener) => listener,
        Err(e) => {
            supervisor.stop();
            return Err(e.into());
        }
    };
    info!("Listening on {}", args.socket.display());

    let server = tokio::spawn(server::serve(
        listener,
        supervisor.clone(),
        shutdown.clone(),
    ));

    let _ = shutdown.wait_for(|stop| *stop).await;

    info!("Shutting down...");
    supervisor.stop();
    if let Err(e) = server.await {
        warn!("listener task ended abnormally: {}", e);
    }
    supervisor.join().await;

    server::remove_socket(&args.socket)?;
    info!("Shutdown complete");
    Ok(())
}
