// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::process::ExitCode;

use hub_grader_auth::{
    api::router,
    clients::{build_http_client, ProxyClient},
    config::HubAuthConfig,
    error::StartupError,
    startup::{initialize, watch_signals},
    state::AppState,
    telemetry::init_tracing,
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "hub grader auth stopped");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), StartupError> {
    let config = HubAuthConfig::from_env()?;
    info!(
        graders = %config.graders,
        hub = %config.hub_base_url,
        hubapi = %config.hubapi_base_url,
        proxy = %config.proxy_base_url,
        "configuration loaded"
    );

    let http = build_http_client(config.http_timeout).map_err(StartupError::HttpClient)?;

    // Listen before registering so the proxy never routes to a closed port.
    let addr = config.bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|source| StartupError::Bind {
            addr: addr.clone(),
            source,
        })?;

    let proxy = ProxyClient::from_config(&config, http.clone());
    initialize(&config, &proxy).await?;

    let base_url = config.base_url();
    let app = router(AppState::new(config, http));

    let shutdown = CancellationToken::new();
    tokio::spawn(watch_signals(shutdown.clone()));

    info!(%addr, %base_url, "hub grader auth listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(StartupError::Serve)?;

    info!("hub grader auth shut down");
    Ok(())
}
