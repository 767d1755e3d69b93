// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Configurable HTTP proxy API client.

use reqwest::{Method, StatusCode};
use serde::Serialize;
use tracing::debug;

use super::ServiceClient;
use crate::config::HubAuthConfig;

#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("proxy request for {path} failed: {source}")]
    Transport {
        path: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("proxy refused route {path}: {status}: {body}")]
    Rejected {
        path: String,
        status: StatusCode,
        body: String,
    },
}

#[derive(Serialize)]
struct RouteTarget<'a> {
    target: &'a str,
}

/// Client for the proxy's `/api/routes` table.
#[derive(Debug, Clone)]
pub struct ProxyClient {
    service: ServiceClient,
}

impl ProxyClient {
    pub fn new(service: ServiceClient) -> Self {
        Self { service }
    }

    pub fn from_config(config: &HubAuthConfig, http: reqwest::Client) -> Self {
        Self::new(ServiceClient::new(
            config.proxy_base_url.clone(),
            config.proxy_token.clone(),
            http,
        ))
    }

    /// Route everything under `path_prefix` to `target`.
    ///
    /// The proxy answers `201 Created` on success; any other status usually
    /// means the proxy token is wrong.
    pub async fn register_route(&self, path_prefix: &str, target: &str) -> Result<(), ProxyError> {
        let path = format!("/api/routes{path_prefix}");
        debug!(%path, %target, "registering proxy route");

        let response = self
            .service
            .request(Method::POST, &path)
            .json(&RouteTarget { target })
            .send()
            .await
            .map_err(|source| ProxyError::Transport {
                path: path.clone(),
                source,
            })?;

        let status = response.status();
        if status != StatusCode::CREATED {
            let body = response.text().await.unwrap_or_default();
            return Err(ProxyError::Rejected { path, status, body });
        }
        Ok(())
    }
}
