// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Reasons a request with a hub session cookie is turned away.
///
/// A missing or stale session is not an error: it becomes a login redirect
/// (see [`super::AuthDecision::Redirect`]).
#[derive(Debug)]
pub enum AuthError {
    /// The hub refused our own API token (expired or misconfigured)
    CredentialInvalid,
    /// Valid session, but the user is not a grader
    AuthorizationDenied { user: String },
    /// Cookie check returned 200 without a usable body
    MalformedUpstreamResponse,
    /// Hub unreachable or answering with 5xx
    UpstreamUnavailable(String),
    /// Any other 4xx from the cookie check
    UpstreamFailure(StatusCode),
}

#[derive(Serialize)]
struct AuthErrorBody {
    error: String,
    error_code: String,
}

impl AuthError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::CredentialInvalid => "credential_invalid",
            AuthError::AuthorizationDenied { .. } => "authorization_denied",
            AuthError::MalformedUpstreamResponse => "malformed_upstream_response",
            AuthError::UpstreamUnavailable(_) => "upstream_unavailable",
            AuthError::UpstreamFailure(_) => "upstream_failure",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::AuthorizationDenied { .. } => StatusCode::FORBIDDEN,
            AuthError::UpstreamUnavailable(_) => StatusCode::BAD_GATEWAY,
            AuthError::CredentialInvalid
            | AuthError::MalformedUpstreamResponse
            | AuthError::UpstreamFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::CredentialInvalid => write!(
                f,
                "Permission failure checking authorization, I may need to be restarted"
            ),
            AuthError::AuthorizationDenied { user } => {
                write!(f, "User \"{user}\" is not allowed to access the formgrader")
            }
            AuthError::MalformedUpstreamResponse => write!(
                f,
                "Failed to check authorization, malformed response from Hub auth"
            ),
            AuthError::UpstreamUnavailable(_) => {
                write!(f, "Failed to check authorization (upstream problem)")
            }
            AuthError::UpstreamFailure(_) => write!(f, "Failed to check authorization"),
        }
    }
}

impl std::error::Error for AuthError {}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(AuthErrorBody {
            error: self.to_string(),
            error_code: self.error_code().to_string(),
        });
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn credential_invalid_returns_500_with_restart_hint() {
        let response = AuthError::CredentialInvalid.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();
        assert_eq!(body["error_code"], "credential_invalid");
        assert!(body["error"].as_str().unwrap().contains("restarted"));
    }

    #[tokio::test]
    async fn denied_grader_returns_403() {
        let response = AuthError::AuthorizationDenied {
            user: "carol".to_string(),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn upstream_errors_map_to_gateway_and_internal() {
        assert_eq!(
            AuthError::UpstreamUnavailable("503".to_string()).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            AuthError::UpstreamFailure(StatusCode::BAD_REQUEST).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AuthError::MalformedUpstreamResponse.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
