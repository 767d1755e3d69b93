// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractor for authenticated graders.
//!
//! ```rust,ignore
//! async fn my_handler(Grader(grader): Grader) -> impl IntoResponse {
//!     // grader.name is the hub user name
//! }
//! ```

use axum::{extract::FromRequestParts, http::request::Parts, response::Response};

use super::AuthenticatedGrader;
use crate::state::AppState;

/// Extractor for the grader making the request.
///
/// Uses the grader stored by the `require_grader` middleware when present,
/// otherwise authenticates the request itself.
pub struct Grader(pub AuthenticatedGrader);

impl FromRequestParts<AppState> for Grader {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        if let Some(grader) = parts.extensions.get::<AuthenticatedGrader>().cloned() {
            return Ok(Grader(grader));
        }

        let grader = state
            .authenticator
            .authenticate(&parts.headers)
            .await
            .into_result()?;
        parts.extensions.insert(grader.clone());
        Ok(Grader(grader))
    }
}
