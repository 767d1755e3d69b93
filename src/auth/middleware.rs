// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication middleware for Axum.
//!
//! Applied with `route_layer` to the grader-only routes:
//!
//! ```rust,ignore
//! let protected = Router::new()
//!     .route("/api/grader", get(current_grader))
//!     .route_layer(axum::middleware::from_fn_with_state(
//!         state.clone(),
//!         require_grader,
//!     ));
//! ```
//!
//! On success the [`AuthenticatedGrader`](super::AuthenticatedGrader) is
//! stored in the request extensions, where the `Grader` extractor picks it
//! up without a second hub round-trip.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::state::AppState;

/// Admit graders, redirect anonymous users to the hub login, reject the rest.
pub async fn require_grader(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let decision = state.authenticator.authenticate(request.headers()).await;
    match decision.into_result() {
        Ok(grader) => {
            request.extensions_mut().insert(grader);
            next.run(request).await
        }
        Err(response) => response,
    }
}
