//! # somahubd, the somahub daemon
//!
//! Composition root that wires the bridge to a shade coordinator and keeps
//! it polling until interrupted.
//!
//! ## Responsibilities
//! - Load configuration (config file, env vars)
//! - Initialize logging
//! - Construct the bridge adapter and the [`ShadeCoordinator`]
//! - Run a first refresh, then start the poll loop
//! - Report every cycle outcome in the logs
//! - Shut the poll loop down on Ctrl-C
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer; no domain logic belongs here.

mod config;

use std::sync::Arc;

use anyhow::Context;
use tokio::sync::broadcast;
use tracing_subscriber::EnvFilter;

use somahub_adapter_virtual::VirtualBridge;
use somahub_app::coordinator::ShadeCoordinator;
use somahub_app::ports::BridgeClient;
use somahub_domain::status::UpdateStatus;

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("failed to load configuration")?;

    let filter = EnvFilter::try_new(&config.logging.filter)
        .with_context(|| format!("invalid log filter {:?}", config.logging.filter))?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    tracing::info!(
        bridge = %config.bridge.address(),
        shades = config.virtual_bridge.shades.len(),
        "starting somahubd with a virtual bridge"
    );

    let bridge = VirtualBridge::from_config(&config.virtual_bridge);
    let coordinator = Arc::new(ShadeCoordinator::new(bridge, config.coordinator));
    let updates = coordinator.subscribe();

    if let Err(err) = coordinator.refresh().await {
        tracing::warn!(%err, "first refresh failed, retrying on the next interval");
    }
    log_shades(&coordinator);

    let poller = coordinator.start()?;
    let reporter = tokio::spawn(report_updates(updates));

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;

    tracing::info!("shutting down");
    poller.shutdown();
    reporter.abort();
    Ok(())
}

fn log_shades<B: BridgeClient>(coordinator: &ShadeCoordinator<B>) {
    for shade in coordinator.shades() {
        let Some(snapshot) = coordinator.snapshot(&shade.mac) else {
            continue;
        };
        tracing::info!(
            name = %shade.name,
            mac = %shade.mac,
            model = %shade.model(),
            manufacturer = shade.manufacturer(),
            firmware = %snapshot.bridge_version,
            available = snapshot.available,
            position = ?snapshot.position.map(|p| p.value()),
            battery = ?snapshot.battery,
            "shade discovered"
        );
    }
}

async fn report_updates(mut updates: broadcast::Receiver<UpdateStatus>) {
    loop {
        match updates.recv().await {
            Ok(status) if status.success => {
                tracing::info!(at = %status.at, "shades updated");
            }
            Ok(status) => {
                let unavailable: Vec<String> =
                    status.unavailable.iter().map(ToString::to_string).collect();
                tracing::warn!(at = %status.at, ?unavailable, "shade update failed");
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "update reporter lagging behind");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
