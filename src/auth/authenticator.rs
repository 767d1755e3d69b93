// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Hub cookie authentication.
//!
//! The browser's hub session cookie is checked against
//! `/hub/api/authorizations/cookie/{name}/{value}` and the returned user
//! name is matched against the grader allow-list.

use std::sync::Arc;

use axum::{
    http::{header::LOCATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};
use utoipa::ToSchema;

use super::AuthError;
use crate::clients::{reason, CookieLookup, HubApiClient, HubApiError};
use crate::config::HubAuthConfig;
use crate::cookies::request_cookie;

/// A hub user admitted as a grader for the current request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AuthenticatedGrader {
    /// Hub user name
    pub name: String,
}

/// Result of checking one request.
#[derive(Debug)]
pub enum AuthDecision {
    Allowed(AuthenticatedGrader),
    /// Send the browser to this URL (hub login)
    Redirect(String),
    Rejected(AuthError),
}

impl AuthDecision {
    /// Split into the grader or the response to send instead.
    pub fn into_result(self) -> Result<AuthenticatedGrader, Response> {
        match self {
            AuthDecision::Allowed(grader) => Ok(grader),
            AuthDecision::Redirect(url) => Err(found_redirect(&url)),
            AuthDecision::Rejected(err) => Err(err.into_response()),
        }
    }
}

/// `302 Found` to `url`.
pub fn found_redirect(url: &str) -> Response {
    (StatusCode::FOUND, [(LOCATION, url.to_string())]).into_response()
}

/// Gatekeeper for grader-only routes.
///
/// Holds no per-request state; the admitted grader travels with the request
/// instead, so one instance serves concurrent requests.
#[derive(Debug, Clone)]
pub struct Authenticator {
    config: Arc<HubAuthConfig>,
    hub: HubApiClient,
}

impl Authenticator {
    pub fn new(config: Arc<HubAuthConfig>, hub: HubApiClient) -> Self {
        Self { config, hub }
    }

    /// Decide whether the request carrying `headers` may proceed.
    pub async fn authenticate(&self, headers: &HeaderMap) -> AuthDecision {
        let cookie_name = &self.config.hubapi_cookie;
        let Some(cookie) = request_cookie(headers, cookie_name) else {
            debug!(cookie = %cookie_name, "no hub session cookie, redirecting to login");
            return self.redirect_to_login();
        };

        let lookup = match self.hub.authorize_cookie(cookie_name, &cookie).await {
            Ok(lookup) => lookup,
            Err(HubApiError::Transport { source, .. }) => {
                error!(error = %source, "Could not reach the hub to verify auth cookie");
                return AuthDecision::Rejected(AuthError::UpstreamUnavailable(source.to_string()));
            }
            Err(HubApiError::InvalidResponse { reason, .. }) => {
                warn!(%reason, "Malformed response from the hub auth API");
                return AuthDecision::Rejected(AuthError::MalformedUpstreamResponse);
            }
        };

        match lookup {
            CookieLookup::Identity(identity) => match identity.name {
                Some(user) if self.config.graders.contains(&user) => {
                    debug!(%user, "grader authenticated");
                    AuthDecision::Allowed(AuthenticatedGrader { name: user })
                }
                Some(user) => {
                    warn!(%user, "Unauthorized user attempted to access the formgrader");
                    AuthDecision::Rejected(AuthError::AuthorizationDenied { user })
                }
                None => {
                    warn!("Malformed response from the hub auth API: no user name");
                    AuthDecision::Rejected(AuthError::MalformedUpstreamResponse)
                }
            },
            CookieLookup::Status(status) => self.decide_on_status(status),
        }
    }

    fn decide_on_status(&self, status: StatusCode) -> AuthDecision {
        let code = status.as_u16();
        let reason = reason(status);

        if status == StatusCode::FORBIDDEN {
            error!(
                status = code,
                reason,
                "No permission to verify cookies, the hub API token may have expired"
            );
            AuthDecision::Rejected(AuthError::CredentialInvalid)
        } else if status == StatusCode::NOT_FOUND {
            warn!(
                status = code,
                reason,
                "Failed to check authorization, the user's cookie is probably invalid or expired"
            );
            self.redirect_to_login()
        } else if status.is_server_error() {
            error!(status = code, reason, "Upstream failure verifying auth cookie");
            AuthDecision::Rejected(AuthError::UpstreamUnavailable(format!("{code} {reason}")))
        } else if status.is_client_error() {
            warn!(status = code, reason, "Failed to check authorization");
            AuthDecision::Rejected(AuthError::UpstreamFailure(status))
        } else {
            warn!(
                status = code,
                reason,
                "Unexpected status from the hub auth API, redirecting to login"
            );
            self.redirect_to_login()
        }
    }

    fn redirect_to_login(&self) -> AuthDecision {
        AuthDecision::Redirect(self.config.login_url())
    }
}
