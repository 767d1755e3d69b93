// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Grader landing and identity endpoints.

use axum::{extract::State, response::Response, Json};
use tracing::debug;

use crate::auth::{found_redirect, AuthenticatedGrader, Grader};
use crate::state::AppState;

/// Landing page at the remap root, where the hub login sends graders back.
#[utoipa::path(
    get,
    path = "/",
    tag = "Graders",
    responses(
        (status = 302, description = "Grader: redirect to the API docs; anonymous: redirect to hub login"),
        (status = 403, description = "Hub user is not a grader"),
    )
)]
pub async fn index(State(state): State<AppState>, Grader(grader): Grader) -> Response {
    debug!(grader = %grader.name, "grader landed on index");
    found_redirect(&format!("{}/docs/", state.config.remap_url))
}

/// The grader making this request.
#[utoipa::path(
    get,
    path = "/api/grader",
    tag = "Graders",
    responses(
        (status = 200, description = "Authenticated grader", body = AuthenticatedGrader),
        (status = 302, description = "No hub session, redirect to hub login"),
        (status = 403, description = "Hub user is not a grader"),
        (status = 500, description = "Hub rejected this service's token"),
        (status = 502, description = "Hub unavailable"),
    )
)]
pub async fn current_grader(Grader(grader): Grader) -> Json<AuthenticatedGrader> {
    Json(grader)
}
