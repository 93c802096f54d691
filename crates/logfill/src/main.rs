//! logfill - synthetic log traffic for search front-end demos
//!
//! Usage:
//!   logfill                                   # live fill into http://es:9200/test/_doc/
//!   logfill --backfill --horizon 48h          # also replay two days of history
//!   logfill --sink stdout --backfill-only --horizon 10m
//!
//! Every flag also reads an environment variable, so the generator can be
//! configured from a container definition (`ES_URL`, `BACKFILL=1`, ...).

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{ArgAction, Parser, ValueEnum};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use logfill_core::config::{DEFAULT_BASE_URL, DEFAULT_INDEX};
use logfill_core::pool::{DEFAULT_QUEUE_CAPACITY, DEFAULT_WORKERS};
use logfill_core::{
    BackfillCoordinator, DeliverySink, GeneratorConfig, HttpSink, LiveEmitter, StdoutSink,
    parse_duration, wait_for_ready,
};

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum SinkKind {
    /// POST each event to the index document endpoint
    Http,
    /// Print each event as a JSON line
    Stdout,
}

#[derive(Parser, Debug)]
#[command(name = "logfill")]
#[command(about = "Generate randomized log events at a varying rate")]
struct Cli {
    /// Base URL of the search cluster
    #[arg(long, env = "ES_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Index receiving the documents
    #[arg(long, env = "ES_INDEX", default_value = DEFAULT_INDEX)]
    index: String,

    /// Replay history alongside live fill (BACKFILL=1 or true)
    #[arg(long, env = "BACKFILL", action = ArgAction::Set, value_parser = parse_flag,
          default_value = "false", num_args = 0..=1, default_missing_value = "true")]
    backfill: bool,

    /// How far back to replay (e.g. 30m, 48h, 2d)
    #[arg(long, env = "BACKFILL_HORIZON", default_value = "48h", value_parser = parse_duration)]
    horizon: Duration,

    /// Back-fill delivery workers
    #[arg(long, env = "BACKFILL_WORKERS", default_value_t = DEFAULT_WORKERS)]
    workers: usize,

    /// Pending back-fill payloads before the producer waits
    #[arg(long, env = "BACKFILL_QUEUE", default_value_t = DEFAULT_QUEUE_CAPACITY)]
    queue_capacity: usize,

    /// How long to wait for the cluster at startup
    #[arg(long, env = "READY_TIMEOUT", default_value = "60s", value_parser = parse_duration)]
    ready_timeout: Duration,

    /// Per-request timeout for deliveries
    #[arg(long, env = "REQUEST_TIMEOUT", default_value = "10s", value_parser = parse_duration)]
    request_timeout: Duration,

    /// Where events go
    #[arg(long, value_enum, default_value = "http")]
    sink: SinkKind,

    /// Run back-fill only and exit when it completes
    #[arg(long)]
    backfill_only: bool,
}

impl Cli {
    fn generator_config(&self) -> GeneratorConfig {
        GeneratorConfig {
            base_url: self.base_url.clone(),
            index: self.index.clone(),
            backfill: self.backfill || self.backfill_only,
            horizon: self.horizon,
            workers: self.workers,
            queue_capacity: self.queue_capacity,
            ready_timeout: self.ready_timeout,
            request_timeout: self.request_timeout,
        }
    }
}

fn parse_flag(s: &str) -> Result<bool, String> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(format!("expected 1/0 or true/false, got {other:?}")),
    }
}

async fn build_sink(kind: SinkKind, config: &GeneratorConfig) -> Result<Arc<dyn DeliverySink>> {
    match kind {
        SinkKind::Stdout => Ok(Arc::new(StdoutSink::new())),
        SinkKind::Http => {
            let client = reqwest::Client::builder()
                .timeout(config.request_timeout)
                .tcp_nodelay(true)
                .build()
                .context("building HTTP client")?;

            wait_for_ready(&client, &config.base_url, config.ready_timeout)
                .await
                .context("destination never became ready")?;

            Ok(Arc::new(HttpSink::with_client(client, config.doc_url())))
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.generator_config();
    config.validate().context("invalid configuration")?;

    info!(
        base_url = %config.base_url,
        index = %config.index,
        backfill = config.backfill,
        horizon = ?config.horizon,
        sink = ?cli.sink,
        "logfill starting"
    );

    let sink = build_sink(cli.sink, &config).await?;
    let cancel = CancellationToken::new();

    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "Could not listen for Ctrl-C");
                return;
            }
            info!("Shutdown requested");
            cancel.cancel();
        });
    }

    let backfill = config.backfill.then(|| {
        let coordinator = BackfillCoordinator::new(Arc::clone(&sink), config.backfill_config());
        let cancel = cancel.clone();
        tokio::spawn(async move { coordinator.run(Utc::now(), cancel).await })
    });

    let live = (!cli.backfill_only).then(|| {
        let emitter = LiveEmitter::new(Arc::clone(&sink));
        let cancel = cancel.clone();
        tokio::spawn(async move { emitter.run(cancel).await })
    });

    if let Some(handle) = backfill {
        let report = handle.await.context("back-fill task panicked")?;
        info!(
            generated = report.events.generated,
            delivered = report.events.delivered,
            failed = report.events.failed,
            "Back-fill joined"
        );
    }

    if let Some(handle) = live {
        let snapshot = handle.await.context("live fill task panicked")?;
        info!(
            generated = snapshot.generated,
            delivered = snapshot.delivered,
            failed = snapshot.failed,
            "Live fill joined"
        );
    }

    info!("logfill stopped");
    Ok(())
}
