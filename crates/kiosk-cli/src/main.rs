//! Kiosk binary: loads the configuration, starts the workers and serves the
//! HTTP surface until Ctrl-C (or the first reset with `exit_on_reset`).

mod config;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Parser;
use kiosk_controller::{Kiosk, KioskDevices};
use kiosk_network::{AnyRecordUpdater, HttpRecordUpdater};
use kiosk_server::AppState;
use tokio::net::TcpListener;
use tokio::sync::{oneshot, watch};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::Config;

/// Grace period for open streams and push clients at shutdown.
const SERVER_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Parser)]
#[command(name = "kiosk", version, about = "Biometric laptop checkout kiosk")]
struct Cli {
    /// Path to the TOML config file (defaults apply when omitted)
    #[arg(short, long, env = "KIOSK_CONFIG")]
    config: Option<PathBuf>,

    /// Override `server.bind`
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(bind) = cli.bind {
        config.server.bind = bind;
        config.validate()?;
    }

    run(config).await
}

async fn run(config: Config) -> Result<()> {
    // Only mock drivers exist so far; the handles stay alive with the process.
    let (mut devices, _handles) = KioskDevices::mock();
    warn!("No hardware drivers available, running with mock devices");

    devices.updater = match config.record_updater() {
        Some(updater) => {
            info!(endpoint = %updater.endpoint, "Record updates enabled");
            AnyRecordUpdater::Http(
                HttpRecordUpdater::new(updater).context("Failed to create record updater")?,
            )
        }
        None => {
            warn!("No record_update.endpoint configured, updates are only logged");
            AnyRecordUpdater::Disabled
        }
    };

    let kiosk = Kiosk::start(config.controller(), devices)
        .await
        .context("Kiosk failed to start")?;
    let orchestrator = kiosk.orchestrator();

    let addr = config.bind_addr()?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let state = AppState::new(orchestrator.clone(), config.stream_interval());
    let mut server = tokio::spawn(kiosk_server::serve(listener, state, async move {
        let _ = stop_rx.await;
    }));

    let resets = orchestrator.reset_signal();
    let server_result = tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal.context("Failed to listen for Ctrl-C")?;
            info!("Ctrl-C received, shutting down");
            None
        }
        () = wait_for_reset(resets, config.runtime.exit_on_reset) => {
            info!("Kiosk reset, exiting for restart");
            None
        }
        result = &mut server => Some(result),
    };

    let server_result = match server_result {
        Some(result) => result,
        None => {
            let _ = stop_tx.send(());
            match tokio::time::timeout(SERVER_DRAIN_TIMEOUT, &mut server).await {
                Ok(result) => result,
                Err(_) => {
                    warn!("HTTP clients still connected, closing them");
                    server.abort();
                    Ok(Ok(()))
                }
            }
        }
    };

    kiosk.shutdown().await;

    match server_result {
        Ok(result) => result.context("HTTP server failed"),
        Err(e) => bail!("HTTP server task failed: {e}"),
    }
}

/// Completes on the first reset, or never when `enabled` is false.
async fn wait_for_reset(mut resets: watch::Receiver<u64>, enabled: bool) {
    if enabled && resets.changed().await.is_ok() {
        return;
    }
    std::future::pending::<()>().await;
}
