// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::{Context, Result};
use kube::Client;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use tenant_sync::config::Config;
use tenant_sync::error::SyncError;
use tenant_sync::feed::{await_startup, ChangeFeed, Startup};
use tenant_sync::kubernetes::resolver_for;
use tenant_sync::sync::SyncHandler;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting tenant-sync operator");

    let config = Config::from_env().context("Failed to load configuration")?;
    info!(
        bootstrap_secret = %format!(
            "{}/{}",
            config.bootstrap_secret_name, config.bootstrap_secret_key
        ),
        cache_tenant_clients = config.cache_tenant_clients,
        write_max_attempts = config.write_max_attempts,
        "Configuration loaded"
    );

    let client = Client::try_default().await.map_err(|e| {
        SyncError::ConfigError(format!("Failed to create management cluster client: {}", e))
    })?;
    info!("Connected to management cluster");

    let handler = Arc::new(SyncHandler::new(
        client.clone(),
        resolver_for(&config),
        &config,
    ));
    let (feed, synced) = ChangeFeed::new(client, &config);
    let mut feed_task = tokio::spawn(feed.run(handler, shutdown_signal()));

    info!("Waiting for initial secret listing...");
    match await_startup(synced, &mut feed_task, config.initial_sync_timeout).await? {
        Startup::Synced => info!("Change feed synced, propagating new secrets"),
        Startup::Stopped => {
            info!("Shutdown requested before the initial listing completed");
            return Ok(());
        }
    }

    feed_task.await.context("Change feed task panicked")??;

    info!("tenant-sync stopped");
    Ok(())
}

/// Resolves on SIGINT or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for SIGINT: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }
}
