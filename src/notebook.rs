// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Notebook Server Controller
//!
//! Makes sure the notebook server holding the autograded notebooks is up
//! and builds links into it.
//!
//! ## Server readiness
//!
//! ```text
//! unknown --(GET user)--> stopped | pending | running
//! stopped --(POST server)--> pending | error
//! ```
//!
//! `pending` and `running` both count as success: the hub finishes the
//! spawn on its own and the notebook URL works once it does.
//!
//! When a delegated notebook server user is configured, graders open that
//! user's notebooks through an admin-access cookie instead of their own
//! server.

use std::sync::Arc;

use reqwest::StatusCode;
use tracing::{debug, info, warn};

use crate::clients::{reason, HubApiClient, ServerState, UserLookup};
use crate::config::HubAuthConfig;
use crate::cookies::{unquote_cookie_value, NotebookCookie};

#[derive(Debug, Clone)]
pub struct NotebookServerController {
    config: Arc<HubAuthConfig>,
    hub: HubApiClient,
}

impl NotebookServerController {
    pub fn new(config: Arc<HubAuthConfig>, hub: HubApiClient) -> Self {
        Self { config, hub }
    }

    /// User whose server hosts the notebooks for `grader`.
    pub fn notebook_user<'a>(&'a self, grader: &'a str) -> &'a str {
        self.config.notebook_server_user.as_deref().unwrap_or(grader)
    }

    /// Start `user`'s server unless it is already running or spawning.
    ///
    /// Returns `false` when the hub could not be asked or refused; the
    /// failure is logged. Safe to call repeatedly.
    pub async fn ensure_server_running(&self, user: &str) -> bool {
        let record = match self.hub.get_user(user).await {
            Ok(UserLookup::Found(record)) => record,
            Ok(UserLookup::Status(status)) => {
                warn!(
                    %user,
                    status = status.as_u16(),
                    reason = reason(status),
                    "Could not access information about user"
                );
                return false;
            }
            Err(e) => {
                warn!(%user, error = %e, "Could not access information about user");
                return false;
            }
        };

        match record.server_state() {
            ServerState::Running => {
                debug!(%user, "notebook server already running");
                true
            }
            ServerState::Pending => {
                debug!(%user, "notebook server is spawning");
                true
            }
            ServerState::Stopped => self.start_server(user).await,
        }
    }

    async fn start_server(&self, user: &str) -> bool {
        match self.hub.start_server(user).await {
            Ok(StatusCode::CREATED) | Ok(StatusCode::ACCEPTED) => {
                info!(%user, "requested notebook server start");
                true
            }
            Ok(status) => {
                warn!(
                    %user,
                    status = status.as_u16(),
                    reason = reason(status),
                    "Could not start server for user"
                );
                false
            }
            Err(e) => {
                warn!(%user, error = %e, "Could not start server for user");
                false
            }
        }
    }

    /// Cookie for the delegated notebook server, if one is configured.
    ///
    /// `None` when graders use their own servers (their session cookie
    /// already grants access) or when admin access is refused.
    pub async fn notebook_server_cookie(&self) -> Option<NotebookCookie> {
        let user = self.config.notebook_server_user.as_deref()?;
        self.request_admin_cookie(user).await
    }

    /// Obtain a cookie scoped to `/user/{other_user}` via admin access.
    pub async fn request_admin_cookie(&self, other_user: &str) -> Option<NotebookCookie> {
        let access = match self.hub.admin_access(other_user).await {
            Ok(access) => access,
            Err(e) => {
                warn!(user = %other_user, error = %e, "Failed to gain admin access to user's server");
                return None;
            }
        };

        if access.status != StatusCode::OK {
            warn!(
                user = %other_user,
                status = access.status.as_u16(),
                reason = reason(access.status),
                "Failed to gain admin access to user's server"
            );
            return None;
        }

        let name = format!("{}-{}", self.config.hubapi_cookie, other_user);
        let Some(raw) = access.cookie(&name) else {
            warn!(user = %other_user, cookie = %name, "Admin access granted without a server cookie");
            return None;
        };

        Some(NotebookCookie {
            name,
            value: unquote_cookie_value(&raw),
            path: format!("/user/{other_user}"),
        })
    }

    /// Public URL of `relative_path` on `user`'s notebook server.
    ///
    /// `relative_path` is the decoded path; each segment is percent-encoded
    /// again so `#`, `?` and spaces stay part of the path.
    pub fn build_notebook_url(&self, relative_path: &str, user: &str) -> String {
        let relative_path = match &self.config.notebook_url_prefix {
            Some(prefix) => format!("{prefix}/{relative_path}"),
            None => relative_path.to_string(),
        };
        let encoded = relative_path
            .split('/')
            .map(urlencoding::encode)
            .collect::<Vec<_>>()
            .join("/");
        format!(
            "{}/user/{}/notebooks/{}",
            self.config.hub_base_url,
            urlencoding::encode(user),
            encoded
        )
    }
}
