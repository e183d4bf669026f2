//! CLI for driving workloads and running the reference service

use anyhow::Result;
use clap::{Parser, Subcommand};
use kvload::common::{format_bytes, Config};
use kvload::{server, WorkloadDriver};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "kvload")]
#[command(about = "Synthetic CRUD workload generator for gRPC key-value services")]
#[command(version)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Drive randomized CRUD traffic against a target service
    Run {
        /// Target service URI
        #[arg(long)]
        target: Option<String>,

        /// How long to drive load (e.g. "30s", "5m")
        #[arg(long)]
        duration: Option<String>,

        /// Mean generated key size in bytes
        #[arg(long)]
        mean_key_size: Option<usize>,

        /// Mean generated value size in bytes
        #[arg(long)]
        mean_value_size: Option<usize>,

        /// Maximum concurrently outstanding RPCs
        #[arg(long)]
        max_in_flight: Option<usize>,

        /// TOML config file (flags override file values)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Run the in-memory reference service
    Serve {
        /// gRPC address to listen on
        #[arg(long, default_value = "127.0.0.1:50051")]
        bind: SocketAddr,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command {
        Commands::Run {
            target,
            duration,
            mean_key_size,
            mean_value_size,
            max_in_flight,
            config,
        } => {
            let mut cfg = match config {
                Some(path) => Config::load(path)?,
                None => Config::default(),
            };
            if let Some(target) = target {
                cfg.target = target;
            }
            if let Some(duration) = duration {
                cfg.duration = duration;
            }
            if let Some(n) = mean_key_size {
                cfg.mean_key_size = n;
            }
            if let Some(n) = mean_value_size {
                cfg.mean_value_size = n;
            }
            if let Some(n) = max_in_flight {
                cfg.max_in_flight = n;
            }
            cfg.validate()?;

            run_workload(cfg).await?;
        }

        Commands::Serve { bind } => {
            server::serve(bind).await?;
        }
    }

    Ok(())
}

async fn run_workload(cfg: Config) -> Result<()> {
    let duration = cfg.run_duration()?;

    tracing::info!("Starting workload");
    tracing::info!("  Target: {}", cfg.target);
    tracing::info!("  Duration: {:?}", duration);
    tracing::info!("  Mean key size: {}", cfg.mean_key_size);
    tracing::info!("  Mean value size: {}", cfg.mean_value_size);
    tracing::info!("  Max in-flight: {}", cfg.max_in_flight);

    let driver = WorkloadDriver::connect(cfg).await?;

    // Stop on the timer or on Ctrl-C, whichever comes first.
    let stop = Arc::new(AtomicBool::new(false));
    let stopper = Arc::clone(&stop);
    tokio::spawn(async move {
        tokio::select! {
            _ = tokio::time::sleep(duration) => {}
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("interrupted, stopping workload");
            }
        }
        stopper.store(true, Ordering::Relaxed);
    });

    let start = Instant::now();
    driver.run(stop).await?;
    let elapsed = start.elapsed();

    let rpcs = driver.rpc_count();
    tracing::info!("✓ Workload complete");
    tracing::info!(
        "  RPCs: {} ({:.0} rpc/s)",
        rpcs,
        rpcs as f64 / elapsed.as_secs_f64()
    );
    tracing::info!("  Sent: {}", format_bytes(driver.bytes_sent()));
    tracing::info!("  Tracked keys at stop: {}", driver.tracked_keys());

    Ok(())
}
