use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tokio::signal::unix::{self, SignalKind};
use tokio_util::{sync::CancellationToken, task::TaskTracker};

use coinswitch::config::Config;
use coinswitch::http::ReqwestFetcher;
use coinswitch::switcher::Switcher;
use coinswitch::tracing::{self, prelude::*};

#[tokio::main]
async fn main() -> Result<()> {
    tracing::init_journald_or_stdout();

    let config = match env::args_os().nth(1) {
        Some(path) => Config::load_from(&PathBuf::from(path))?,
        None => Config::load()?,
    };

    let fetcher = match config.request_timeout() {
        Some(timeout) => ReqwestFetcher::with_timeout(timeout)
            .context("failed to build HTTP client")?,
        None => ReqwestFetcher::new(),
    };

    let coins = config.build_coins()?;
    info!(coins = coins.len(), "Loaded configuration.");

    let mut switcher = Switcher::new(coins, config.algo_switch_multiplier, fetcher);
    if let Some(active) = &config.active_coin {
        switcher = switcher.with_active(active);
    }

    let running = CancellationToken::new();
    let tracker = TaskTracker::new();
    tracker.spawn(switcher.run(config.refresh_interval(), running.clone()));
    tracker.close();
    info!("Started.");

    let mut sigint = unix::signal(SignalKind::interrupt())?;
    let mut sigterm = unix::signal(SignalKind::terminate())?;
    tokio::select! {
        _ = sigint.recv() => {},
        _ = sigterm.recv() => {},
    }

    trace!("Shutting down.");
    running.cancel();

    tracker.wait().await;
    info!("Exiting.");
    Ok(())
}
