// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Typed clients for the services this one talks to.
//!
//! Both the hub API and the configurable HTTP proxy authenticate callers
//! with `Authorization: token <secret>`. [`ServiceClient`] owns one base URL
//! and one token; [`HubApiClient`] and [`ProxyClient`] wrap it with the
//! endpoints each service exposes.

use std::time::Duration;

use reqwest::{header::AUTHORIZATION, Client, Method, RequestBuilder, StatusCode};

pub mod hub;
pub mod proxy;

pub use hub::{
    AdminAccess, CookieIdentity, CookieLookup, HubApiClient, HubApiError, ServerState,
    UserLookup, UserRecord,
};
pub use proxy::{ProxyClient, ProxyError};

/// Build the shared outbound HTTP client.
pub fn build_http_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder().timeout(timeout).build()
}

/// Base URL plus token for one upstream service.
#[derive(Clone)]
pub struct ServiceClient {
    base_url: String,
    token: String,
    http: Client,
}

impl ServiceClient {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>, http: Client) -> Self {
        Self {
            base_url: base_url.into(),
            token: token.into(),
            http,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Start a request to `path` (relative to the base URL) with the token
    /// header already attached.
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}{}", self.base_url, path))
            .header(AUTHORIZATION, format!("token {}", self.token))
    }
}

impl std::fmt::Debug for ServiceClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

/// Reason phrase for log lines.
pub(crate) fn reason(status: StatusCode) -> &'static str {
    status.canonical_reason().unwrap_or("Unknown")
}
