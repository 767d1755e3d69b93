// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{middleware, routing::get, Router};
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::{require_grader, AuthenticatedGrader},
    state::AppState,
};

pub mod grader;
pub mod health;
pub mod notebook;

/// Build the service router.
///
/// The proxy forwards requests without stripping the remap path, so every
/// route is nested under it.
pub fn router(state: AppState) -> Router {
    let remap = state.config.remap_url.clone();

    let protected = Router::new()
        .route("/", get(grader::index))
        .route("/api/grader", get(grader::current_grader))
        .route("/notebook/{*path}", get(notebook::open_notebook))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_grader));

    let routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .merge(protected)
        .with_state(state);

    Router::new()
        .nest(&remap, routes)
        .merge(
            SwaggerUi::new(format!("{remap}/docs"))
                .url(format!("{remap}/api-doc/openapi.json"), ApiDoc::openapi()),
        )
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        health::liveness,
        health::readiness,
        grader::index,
        grader::current_grader,
        notebook::open_notebook
    ),
    components(
        schemas(
            AuthenticatedGrader,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse
        )
    ),
    tags(
        (name = "Health", description = "Liveness and readiness probes"),
        (name = "Graders", description = "Grader identity"),
        (name = "Notebooks", description = "Notebook server access")
    )
)]
struct ApiDoc;
