// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Startup side effects, kept out of constructors.
//!
//! The proxy only forwards the remap path to this service once the route
//! exists, so a failed registration is fatal: the process exits instead of
//! listening on an address nobody can reach.

use std::future::Future;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::clients::ProxyClient;
use crate::config::HubAuthConfig;
use crate::error::StartupError;

/// Register `{remap path} -> {this service}` with the proxy.
pub async fn initialize(config: &HubAuthConfig, proxy: &ProxyClient) -> Result<(), StartupError> {
    let target = config.proxy_target();
    info!(remap = %config.remap_url, %target, "Proxying {} --> {}", config.remap_url, target);

    proxy.register_route(&config.remap_url, &target).await?;

    info!(base_url = %config.base_url(), "proxy route registered");
    Ok(())
}

/// Resolve when `signal` fires. A handler that could not be installed
/// never resolves, so it cannot trigger a shutdown by itself.
async fn signal_or_pending<F>(name: &str, signal: F)
where
    F: Future<Output = std::io::Result<()>>,
{
    if let Err(e) = signal.await {
        warn!(signal = name, error = %e, "failed to install signal handler");
        std::future::pending::<()>().await;
    }
}

/// Cancel `shutdown` on Ctrl-C or SIGTERM.
pub async fn watch_signals(shutdown: CancellationToken) {
    let ctrl_c = signal_or_pending("ctrl-c", tokio::signal::ctrl_c());

    #[cfg(unix)]
    let terminate = signal_or_pending("sigterm", async {
        let mut sigterm =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;
        sigterm.recv().await;
        Ok(())
    });

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
        _ = shutdown.cancelled() => return,
    }

    info!("shutdown signal received");
    shutdown.cancel();
}
