use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, info, warn};

use cdr_amqp::broker::amqp::AmqpConnections;
use cdr_amqp::source::RecordStream;
use cdr_amqp::telemetry::{init_tracing, TracingConfig};
use cdr_amqp::{Activation, BackendFile, CdrBackend, PipelineError};

/// How long to wait for blocking tasks, such as a pending stdin read, on exit.
const RUNTIME_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Parser, Debug)]
#[command(name = "cdr-amqp")]
#[command(about = "Publish call detail records to an AMQP broker")]
struct Args {
    /// Path to the backend configuration file (TOML, YAML or JSON)
    #[arg(short, long, default_value = "cdr_amqp.toml")]
    config: PathBuf,

    /// Newline-delimited JSON records to publish, or "-" for stdin
    #[arg(short, long, default_value = "-")]
    input: String,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    /// Load the configuration, connect to the broker, and exit
    #[arg(long)]
    check: bool,
}

type Backend = CdrBackend<Arc<AmqpConnections>>;

fn main() -> Result<()> {
    let args = Args::parse();

    init_tracing(&TracingConfig {
        log_level: args.log_level.clone(),
        json_logs: args.json_logs,
        ..TracingConfig::default()
    })?;

    let rt = tokio::runtime::Runtime::new()?;
    run_to_completion(rt, run(args))
}

/// Drive `task` to completion, then stop the runtime without waiting on
/// blocking threads. A stdin read blocks its thread until input arrives.
fn run_to_completion<F>(rt: tokio::runtime::Runtime, task: F) -> Result<()>
where
    F: Future<Output = Result<()>>,
{
    let result = rt.block_on(task);
    rt.shutdown_timeout(RUNTIME_SHUTDOWN_TIMEOUT);
    result
}

async fn run(args: Args) -> Result<()> {
    let file = BackendFile::load(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;

    let connections = Arc::new(AmqpConnections::new(file.connections.clone()));
    let backend = Arc::new(CdrBackend::new(connections.clone()));

    if backend.initialize(&file.global).await == Activation::Declined {
        connections.close_all().await;
        bail!("configuration in {} could not be activated", args.config.display());
    }

    if args.check {
        info!(config = %args.config.display(), "configuration OK");
        backend.shutdown();
        connections.close_all().await;
        return Ok(());
    }

    let mut records = open_input(&args.input).await?;
    let mut reloads = ReloadSignal::new()?;
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut in_flight = JoinSet::new();
    let mut stats = Stats::default();

    loop {
        tokio::select! {
            record = records.next() => match record {
                Some(record) => {
                    let backend = backend.clone();
                    in_flight.spawn(async move { backend.log_record(&record).await });
                }
                None => break,
            },
            Some(result) = in_flight.join_next(), if !in_flight.is_empty() => {
                stats.record(result);
            }
            _ = reloads.recv() => {
                reload(&args.config, &connections, &backend).await;
            }
            _ = &mut ctrl_c => {
                info!("interrupted");
                break;
            }
        }
    }

    while let Some(result) = in_flight.join_next().await {
        stats.record(result);
    }

    backend.shutdown();
    connections.close_all().await;

    info!(
        published = stats.published,
        failed = stats.failed,
        malformed = records.malformed(),
        "finished"
    );
    Ok(())
}

async fn open_input(input: &str) -> Result<RecordStream> {
    if input == "-" {
        return Ok(RecordStream::spawn(tokio::io::stdin(), "stdin"));
    }
    let file = tokio::fs::File::open(input)
        .await
        .with_context(|| format!("opening {}", input))?;
    Ok(RecordStream::spawn(file, input))
}

async fn reload(path: &Path, connections: &AmqpConnections, backend: &Backend) {
    info!(config = %path.display(), "reloading configuration");
    // Failures are logged where they happen; the previous snapshot stays active.
    let _ = backend
        .reload_file(path, |defs| connections.configure(defs))
        .await;
}

#[derive(Debug, Default)]
struct Stats {
    published: u64,
    failed: u64,
}

impl Stats {
    fn record(&mut self, result: Result<Result<(), PipelineError>, JoinError>) {
        match result {
            Ok(Ok(())) => self.published += 1,
            Ok(Err(e)) if e.is_per_call() => {
                self.failed += 1;
                debug!(error = %e, "record not published");
            }
            Ok(Err(e)) => {
                self.failed += 1;
                warn!(error = %e, "record not published");
            }
            Err(e) => {
                self.failed += 1;
                warn!(error = %e, "publish task failed");
            }
        }
    }
}

#[cfg(unix)]
struct ReloadSignal(tokio::signal::unix::Signal);

#[cfg(unix)]
impl ReloadSignal {
    fn new() -> std::io::Result<Self> {
        use tokio::signal::unix::{signal, SignalKind};
        Ok(Self(signal(SignalKind::hangup())?))
    }

    async fn recv(&mut self) {
        if self.0.recv().await.is_none() {
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
struct ReloadSignal;

#[cfg(not(unix))]
impl ReloadSignal {
    fn new() -> std::io::Result<Self> {
        Ok(Self)
    }

    async fn recv(&mut self) {
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_exit_does_not_wait_for_blocked_reader() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let started = Instant::now();

        let result = run_to_completion(rt, async {
            tokio::task::spawn_blocking(|| std::thread::sleep(Duration::from_secs(30)));
            Ok(())
        });

        assert!(result.is_ok());
        assert!(started.elapsed() < Duration::from_secs(10));
    }
}
