// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Notebook redirect endpoint.

use axum::{
    extract::{Path, State},
    http::{header::SET_COOKIE, HeaderValue},
    response::Response,
};
use tracing::{info, warn};

use crate::auth::{found_redirect, Grader};
use crate::error::ApiError;
use crate::state::AppState;

/// Open a notebook on the notebook server.
///
/// Starts the server if needed, attaches an admin-access cookie when the
/// notebooks live on a delegated user's server, then redirects there.
#[utoipa::path(
    get,
    path = "/notebook/{path}",
    tag = "Notebooks",
    params(
        ("path" = String, Path, description = "Notebook path relative to the notebook directory")
    ),
    responses(
        (status = 302, description = "Redirect to the notebook on the hub"),
        (status = 403, description = "Hub user is not a grader"),
        (status = 502, description = "Notebook server could not be started"),
    )
)]
pub async fn open_notebook(
    State(state): State<AppState>,
    Grader(grader): Grader,
    Path(path): Path<String>,
) -> Result<Response, ApiError> {
    let user = state.notebooks.notebook_user(&grader.name);

    if !state.notebooks.ensure_server_running(user).await {
        return Err(ApiError::bad_gateway(format!(
            "Notebook server for {user} is not available"
        )));
    }

    let url = state.notebooks.build_notebook_url(&path, user);
    let mut response = found_redirect(&url);

    if let Some(cookie) = state.notebooks.notebook_server_cookie().await {
        let value = HeaderValue::from_str(&cookie.to_set_cookie()).map_err(|e| {
            warn!(user = %user, error = %e, "hub cookie is not a valid header value");
            ApiError::internal("Failed to relay notebook server cookie")
        })?;
        response.headers_mut().append(SET_COOKIE, value);
    }

    info!(grader = %grader.name, %user, %path, "redirecting to notebook");
    Ok(response)
}

#[cfg(test)]
mod tests {
    use crate::api::router;
    use crate::state::AppState;
    use crate::test_support::{config_for, FakeHub};
    use axum::{
        body::Body,
        http::{
            header::{COOKIE, LOCATION, SET_COOKIE},
            Request, StatusCode,
        },
    };
    use serde_json::json;
    use tower::ServiceExt;

    fn notebook_request(path: &str) -> Request<Body> {
        Request::builder()
            .uri(path)
            .header(COOKIE, "jupyter-hub-token=abc123")
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn redirects_grader_to_own_notebook() {
        let hub = FakeHub::new();
        hub.set_cookie_response(StatusCode::OK, json!({"name": "alice"}));
        let base = hub.spawn().await;
        let app = router(AppState::new(config_for(&base, &[]), reqwest::Client::new()));

        let response = app
            .oneshot(notebook_request(
                "/hub/nbgrader/course101/notebook/autograded/ps1/p1.ipynb",
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            response.headers().get(LOCATION).unwrap(),
            "http://hub.example/user/alice/notebooks/autograded/ps1/p1.ipynb"
        );
        assert!(response.headers().get(SET_COOKIE).is_none());
    }

    #[tokio::test]
    async fn delegated_server_gets_admin_cookie() {
        let hub = FakeHub::new();
        hub.set_cookie_response(StatusCode::OK, json!({"name": "bob"}));
        hub.set_user_response(
            StatusCode::OK,
            json!({"name": "instructor", "server": null, "pending": null}),
        );
        hub.set_admin_response(
            StatusCode::OK,
            Some(r#"jupyter-hub-token-instructor="tok%3D""#),
        );
        let base = hub.spawn().await;
        let config = config_for(&base, &[("HUBAUTH_NOTEBOOK_SERVER_USER", "instructor")]);
        let app = router(AppState::new(config, reqwest::Client::new()));

        let response = app
            .oneshot(notebook_request("/hub/nbgrader/course101/notebook/p1.ipynb"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            response.headers().get(LOCATION).unwrap(),
            "http://hub.example/user/instructor/notebooks/p1.ipynb"
        );
        assert_eq!(
            response.headers().get(SET_COOKIE).unwrap(),
            "jupyter-hub-token-instructor=tok=; Path=/user/instructor"
        );
        assert_eq!(hub.count("POST", "/hub/api/users/instructor/server"), 1);
    }

    #[tokio::test]
    async fn special_characters_survive_the_redirect() {
        let hub = FakeHub::new();
        hub.set_cookie_response(StatusCode::OK, json!({"name": "alice"}));
        let base = hub.spawn().await;
        let app = router(AppState::new(config_for(&base, &[]), reqwest::Client::new()));

        let response = app
            .oneshot(notebook_request(
                "/hub/nbgrader/course101/notebook/ps%231/Problem%20Set%3F.ipynb",
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            response.headers().get(LOCATION).unwrap(),
            "http://hub.example/user/alice/notebooks/ps%231/Problem%20Set%3F.ipynb"
        );
    }

    #[tokio::test]
    async fn unavailable_server_is_bad_gateway() {
        let hub = FakeHub::new();
        hub.set_cookie_response(StatusCode::OK, json!({"name": "alice"}));
        hub.set_user_response(StatusCode::OK, json!({"server": null, "pending": null}));
        hub.set_start_status(StatusCode::INTERNAL_SERVER_ERROR);
        let base = hub.spawn().await;
        let app = router(AppState::new(config_for(&base, &[]), reqwest::Client::new()));

        let response = app
            .oneshot(notebook_request("/hub/nbgrader/course101/notebook/p1.ipynb"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
