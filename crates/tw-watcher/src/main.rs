//! tailwatch: watch rotating daily log files and alert on severe entries.
//!
//! Wires configuration, the Telegram channel, the duplicate throttle and
//! the rotation-aware tailer into a single long-running binary.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use tw_watcher::clock::SystemClock;
use tw_watcher::config::WatcherConfig;
use tw_watcher::shutdown;
use tw_watcher::tailer::Tailer;

/// Monitor log files and send alerts for configured severities.
#[derive(Debug, Parser)]
#[command(name = "tailwatch", version, about)]
struct Cli {
    /// Path to the TOML configuration file (defaults + environment if omitted).
    #[arg(short, long, env = "TAILWATCH_CONFIG")]
    config: Option<PathBuf>,

    /// Run a single pass and exit.
    #[arg(long)]
    once: bool,

    /// Process entries already in the log file before watching.
    #[arg(long)]
    process_existing: bool,

    /// Exit with failure on the first watcher error instead of retrying.
    #[arg(long)]
    stop_on_error: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    let cli = Cli::parse();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "tailwatch starting");

    // ── Load config ─────────────────────────────────────────────
    let config = WatcherConfig::load(cli.config.as_deref())?;
    for warning in config.validate() {
        tracing::warn!(%warning, "configuration incomplete");
    }
    tracing::info!(
        log_path = %config.log_path.display(),
        file_prefix = %config.file_prefix,
        throttle_enabled = config.throttle.enabled,
        throttle_minutes = config.throttle.minutes,
        "config loaded"
    );

    // ── Build tailer ────────────────────────────────────────────
    let mut tailer = Tailer::from_config(&config, Arc::new(SystemClock))?;
    let active = tailer.dispatcher().routes().active_levels();
    if active.is_empty() {
        tracing::warn!("no log levels are configured to send notifications");
    } else {
        tracing::info!(levels = %active.join(", "), "monitoring levels");
    }

    // ── Single pass ─────────────────────────────────────────────
    if cli.once {
        tracing::info!("running a single pass");
        return match tailer.run_once(cli.process_existing).await {
            Ok(report) => {
                tracing::info!(?report, "single pass complete");
                Ok(ExitCode::SUCCESS)
            }
            Err(e) => {
                tracing::error!(error = %e, "single pass failed");
                Ok(exit_for_error(cli.stop_on_error))
            }
        };
    }

    // ── Continuous watch ────────────────────────────────────────
    if cli.process_existing {
        if let Err(e) = tailer.replay_backlog().await {
            tracing::error!(error = %e, "failed to process existing entries");
            if cli.stop_on_error {
                return Ok(ExitCode::FAILURE);
            }
        }
    } else {
        tracing::info!("monitoring new log entries only (use --process-existing to replay)");
    }

    let signals = shutdown::stop_on_signal(tailer.stop_handle());
    let result = tailer.watch(cli.stop_on_error).await;
    signals.abort();

    match result {
        Ok(()) => {
            tracing::info!("tailwatch stopped");
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            tracing::error!(error = %e, "watcher failed");
            Ok(exit_for_error(cli.stop_on_error))
        }
    }
}

fn exit_for_error(stop_on_error: bool) -> ExitCode {
    if stop_on_error {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
