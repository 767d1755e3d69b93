// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JupyterHub REST API client.
//!
//! Status codes are returned to the caller rather than mapped to errors:
//! the authenticator and the notebook controller each give them their own
//! meaning. Only transport failures and unreadable 200 bodies are errors.

use reqwest::{header::SET_COOKIE, Method, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize};
use tracing::debug;

use super::ServiceClient;
use crate::config::HubAuthConfig;
use crate::cookies::set_cookie_value;

#[derive(Debug, thiserror::Error)]
pub enum HubApiError {
    #[error("hub API request {path} failed: {source}")]
    Transport {
        path: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("hub API returned an invalid body for {path}: {reason}")]
    InvalidResponse { path: String, reason: String },
}

/// Body of a successful cookie authorization.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CookieIdentity {
    /// Hub user name; absent only if the hub API contract changes
    #[serde(default)]
    pub name: Option<String>,
}

/// Outcome of a cookie authorization lookup.
#[derive(Debug)]
pub enum CookieLookup {
    /// 200 with a readable body
    Identity(CookieIdentity),
    /// Any other status
    Status(StatusCode),
}

/// Subset of the hub's user model this service reads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct UserRecord {
    #[serde(default)]
    pub name: Option<String>,
    /// URL path of the running server, `null` when stopped
    #[serde(default)]
    pub server: Option<String>,
    /// Pending transition (`"spawn"`, `"stop"`) or `null`
    #[serde(default)]
    pub pending: Option<String>,
}

/// Notebook server lifecycle as observed through the hub.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    Stopped,
    Pending,
    Running,
}

impl UserRecord {
    pub fn server_state(&self) -> ServerState {
        if self.server.is_some() {
            ServerState::Running
        } else if self.pending.as_deref() == Some("spawn") {
            ServerState::Pending
        } else {
            ServerState::Stopped
        }
    }
}

/// Outcome of a user lookup.
#[derive(Debug)]
pub enum UserLookup {
    Found(UserRecord),
    Status(StatusCode),
}

/// Response to an admin-access request.
#[derive(Debug, Clone)]
pub struct AdminAccess {
    pub status: StatusCode,
    /// Raw `Set-Cookie` header values
    pub set_cookies: Vec<String>,
}

impl AdminAccess {
    /// Raw value of the named cookie, as sent by the hub.
    pub fn cookie(&self, name: &str) -> Option<String> {
        self.set_cookies
            .iter()
            .find_map(|header| set_cookie_value(header, name))
    }
}

/// Client for `/hub/api`.
#[derive(Debug, Clone)]
pub struct HubApiClient {
    service: ServiceClient,
}

impl HubApiClient {
    pub fn new(service: ServiceClient) -> Self {
        Self { service }
    }

    pub fn from_config(config: &HubAuthConfig, http: reqwest::Client) -> Self {
        Self::new(ServiceClient::new(
            config.hubapi_base_url.clone(),
            config.hubapi_token.clone(),
            http,
        ))
    }

    /// Ask the hub which user owns session cookie `cookie_value`.
    pub async fn authorize_cookie(
        &self,
        cookie_name: &str,
        cookie_value: &str,
    ) -> Result<CookieLookup, HubApiError> {
        let path = format!(
            "/hub/api/authorizations/cookie/{}/{}",
            urlencoding::encode(cookie_name),
            urlencoding::encode(cookie_value)
        );
        // The cookie value is a credential; log the route without it.
        let log_path = format!("/hub/api/authorizations/cookie/{cookie_name}/<redacted>");
        let response = self.send(Method::GET, &path, &log_path).await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Ok(CookieLookup::Status(status));
        }
        Ok(CookieLookup::Identity(read_json(response, &log_path).await?))
    }

    /// Fetch the hub's record for `user`.
    pub async fn get_user(&self, user: &str) -> Result<UserLookup, HubApiError> {
        let path = format!("/hub/api/users/{}", urlencoding::encode(user));
        let response = self.send(Method::GET, &path, &path).await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Ok(UserLookup::Status(status));
        }
        Ok(UserLookup::Found(read_json(response, &path).await?))
    }

    /// Ask the hub to spawn `user`'s notebook server. Returns the hub's status.
    pub async fn start_server(&self, user: &str) -> Result<StatusCode, HubApiError> {
        let path = format!("/hub/api/users/{}/server", urlencoding::encode(user));
        let response = self.send(Method::POST, &path, &path).await?;
        Ok(response.status())
    }

    /// Request an admin cookie for `user`'s notebook server.
    pub async fn admin_access(&self, user: &str) -> Result<AdminAccess, HubApiError> {
        let path = format!("/hub/api/users/{}/admin-access", urlencoding::encode(user));
        let response = self.send(Method::POST, &path, &path).await?;

        let set_cookies = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .map(str::to_string)
            .collect();
        Ok(AdminAccess {
            status: response.status(),
            set_cookies,
        })
    }

    /// Reachability probe against the API root.
    pub async fn ping(&self) -> Result<StatusCode, HubApiError> {
        let response = self.send(Method::GET, "/hub/api", "/hub/api").await?;
        Ok(response.status())
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        log_path: &str,
    ) -> Result<Response, HubApiError> {
        debug!(%method, path = log_path, "hub API request");
        self.service
            .request(method, path)
            .send()
            .await
            .map_err(|source| HubApiError::Transport {
                path: log_path.to_string(),
                source,
            })
    }
}

async fn read_json<T: DeserializeOwned>(response: Response, path: &str) -> Result<T, HubApiError> {
    response
        .json::<T>()
        .await
        .map_err(|e| HubApiError::InvalidResponse {
            path: path.to_string(),
            reason: e.to_string(),
        })
}
