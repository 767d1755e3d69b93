// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::auth::Authenticator;
use crate::clients::HubApiClient;
use crate::config::HubAuthConfig;
use crate::notebook::NotebookServerController;

/// Shared, read-only application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<HubAuthConfig>,
    pub hub: HubApiClient,
    pub authenticator: Authenticator,
    pub notebooks: NotebookServerController,
}

impl AppState {
    /// Wire the components together. Performs no I/O.
    pub fn new(config: HubAuthConfig, http: reqwest::Client) -> Self {
        let config = Arc::new(config);
        let hub = HubApiClient::from_config(&config, http);
        Self {
            authenticator: Authenticator::new(config.clone(), hub.clone()),
            notebooks: NotebookServerController::new(config.clone(), hub.clone()),
            hub,
            config,
        }
    }
}
